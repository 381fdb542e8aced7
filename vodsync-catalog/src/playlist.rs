//! Parser for extended M3U playlists.
//!
//! Playlists pair a metadata line with the stream URL on the following line:
//! ```text
//! #EXTM3U
//! #EXTINF:-1 tvg-logo="http://img/heat.jpg" group-title="Action",Heat (1995)
//! http://host/movie/user/pass/1234.mkv
//! ```
//!
//! Only movie and series entries are emitted. Live channels and malformed
//! pairs are dropped.

use std::collections::BTreeMap;

use crate::name_parser::{
    parse_episode_marker, series_slug, series_title, split_extension, url_final_segment,
    url_path_segments,
};
use crate::types::EntityKind;

const METADATA_PREFIX: &str = "#EXTINF:";

/// One classified playlist entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub kind: EntityKind,
    /// Display name: the text after the final comma of the metadata line.
    pub name: String,
    pub url: String,
    /// Free-form `key="value"` attributes from the metadata line.
    pub attributes: BTreeMap<String, String>,
}

impl PlaylistEntry {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn group_title(&self) -> Option<&str> {
        self.attribute("group-title")
    }

    pub fn logo(&self) -> Option<&str> {
        self.attribute("tvg-logo")
    }

    /// URL stem and extension of the final path segment.
    fn url_stem(&self) -> Option<(&str, Option<&str>)> {
        url_final_segment(&self.url).map(split_extension)
    }

    /// Container extension advertised by the URL, if any.
    pub fn container(&self) -> Option<&str> {
        self.url_stem().and_then(|(_, ext)| ext)
    }

    /// Native id of the entity this entry describes.
    ///
    /// Movies use the URL's final path segment without extension; series use
    /// the slug of the display name, so every episode of a show lands on the
    /// same series entity.
    pub fn native_id(&self) -> Option<String> {
        match self.kind {
            EntityKind::Movie => self
                .url_stem()
                .map(|(stem, _)| stem.to_string())
                .filter(|s| !s.is_empty()),
            EntityKind::Series => Some(series_slug(&self.name)).filter(|s| !s.is_empty()),
        }
    }

    /// Native id of the episode a series entry streams.
    pub fn episode_native_id(&self) -> Option<&str> {
        match self.kind {
            EntityKind::Series => self.url_stem().map(|(stem, _)| stem),
            EntityKind::Movie => None,
        }
    }

    /// Series title with any episode marker removed.
    pub fn series_title(&self) -> &str {
        series_title(&self.name)
    }

    /// Season and episode numbers parsed from the display name.
    pub fn season_episode(&self) -> (Option<i32>, Option<i32>) {
        match parse_episode_marker(&self.name) {
            Some(m) => (Some(m.season), Some(m.episode)),
            None => (None, None),
        }
    }
}

/// Parse playlist text into classified movie and series entries.
///
/// # Examples
///
/// ```
/// use vodsync_catalog::EntityKind;
/// use vodsync_catalog::playlist::parse_playlist;
///
/// let text = "#EXTM3U\n\
///     #EXTINF:-1 group-title=\"Action\",Heat (1995)\n\
///     http://host/movie/u/p/1234.mkv\n";
/// let entries = parse_playlist(text);
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].kind, EntityKind::Movie);
/// assert_eq!(entries[0].name, "Heat (1995)");
/// assert_eq!(entries[0].native_id().as_deref(), Some("1234"));
/// ```
pub fn parse_playlist(text: &str) -> Vec<PlaylistEntry> {
    let mut entries = Vec::new();
    let mut pending: Option<PendingEntry> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("#EXTM3U") {
            continue;
        }

        if let Some(meta) = line.strip_prefix(METADATA_PREFIX) {
            // An unterminated previous entry is discarded
            pending = Some(parse_metadata_line(meta));
            continue;
        }

        let Some(entry) = pending.take() else {
            continue;
        };

        if !has_url_scheme(line) {
            // Any other line between metadata and URL drops the entry
            continue;
        }

        if let Some(kind) = classify(&entry.attributes, line) {
            entries.push(PlaylistEntry {
                kind,
                name: entry.name,
                url: line.to_string(),
                attributes: entry.attributes,
            });
        }
    }

    entries
}

// ── Internal parsing ────────────────────────────────────────────────────────

struct PendingEntry {
    name: String,
    attributes: BTreeMap<String, String>,
}

fn parse_metadata_line(meta: &str) -> PendingEntry {
    let (head, name) = match meta.rfind(',') {
        Some(pos) => (&meta[..pos], meta[pos + 1..].trim()),
        None => (meta, ""),
    };
    let attributes = parse_attributes(head);

    let name = if name.is_empty() {
        attributes
            .get("tvg-name")
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    } else {
        name.to_string()
    };

    PendingEntry { name, attributes }
}

/// Collect `key="value"` pairs. Keys are lowercased; unquoted junk is skipped.
fn parse_attributes(head: &str) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    let mut rest = head;

    while let Some(eq) = rest.find("=\"") {
        let key_start = rest[..eq]
            .rfind(|c: char| c.is_whitespace())
            .map(|p| p + 1)
            .unwrap_or(0);
        let key = rest[key_start..eq].trim();

        let value_start = eq + 2;
        let Some(len) = rest[value_start..].find('"') else {
            break;
        };
        let value = &rest[value_start..value_start + len];

        if !key.is_empty() {
            attributes.insert(key.to_lowercase(), value.to_string());
        }
        rest = &rest[value_start + len + 1..];
    }

    attributes
}

/// True for lines that start with `scheme://`.
fn has_url_scheme(line: &str) -> bool {
    let Some(pos) = line.find("://") else {
        return false;
    };
    let scheme = &line[..pos];
    scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Explicit type attribute first, then the URL path heuristic.
fn classify(attributes: &BTreeMap<String, String>, url: &str) -> Option<EntityKind> {
    for key in ["type", "tvg-type"] {
        if let Some(value) = attributes.get(key) {
            match value.trim().to_lowercase().as_str() {
                "movie" | "movies" | "vod" => return Some(EntityKind::Movie),
                "series" | "serie" | "tv" | "show" => return Some(EntityKind::Series),
                _ => {}
            }
        }
    }

    let segments = url_path_segments(url);
    if segments.iter().any(|s| s == "movie" || s == "movies") {
        Some(EntityKind::Movie)
    } else if segments.iter().any(|s| s == "series") {
        Some(EntityKind::Series)
    } else {
        None
    }
}
