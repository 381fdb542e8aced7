//! Identity and name parsing for provider feed rows.
//!
//! Provider feeds encode useful metadata in free-form strings:
//! ```text
//! Heat (1995)
//! The Expanse S02E05
//! http://host/movie/user/pass/1234.mkv
//! ```
//!
//! This module derives the stable provider-unique id, release years, series
//! slugs, episode markers, and native ids from stream URLs.

use chrono::{DateTime, Datelike, NaiveDate};

use crate::types::EntityKind;

/// Build the deterministic key binding one provider's native entry to one entity.
///
/// The kind is part of the key, so a movie and a series that share a native
/// id on the same provider never collide.
///
/// # Examples
///
/// ```
/// use vodsync_catalog::EntityKind;
/// use vodsync_catalog::name_parser::provider_unique_id;
///
/// assert_eq!(provider_unique_id(EntityKind::Movie, "acme", "10"), "movie:acme:10");
/// assert_eq!(provider_unique_id(EntityKind::Series, "acme", "10"), "series:acme:10");
/// ```
pub fn provider_unique_id(kind: EntityKind, provider_id: &str, native_id: &str) -> String {
    format!("{}:{provider_id}:{native_id}", kind.as_str())
}

/// Return the trimmed native id, or `None` if the row has no usable id.
pub fn usable_native_id(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

// ── Years ───────────────────────────────────────────────────────────────────

/// Derive a release year, preferring an explicit release date over the name.
///
/// # Examples
///
/// ```
/// use vodsync_catalog::name_parser::derive_year;
///
/// assert_eq!(derive_year(None, "Heat (1995)"), Some(1995));
/// assert_eq!(derive_year(Some("1996-01-01"), "Heat"), Some(1996));
/// assert_eq!(derive_year(None, "Heat"), None);
/// ```
pub fn derive_year(release_date: Option<&str>, name: &str) -> Option<i32> {
    release_date
        .and_then(year_from_release_date)
        .or_else(|| year_from_name(name))
}

/// Extract the calendar year from a release-date field.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps, and bare `YYYY` / `YYYY-MM`
/// prefixes. Blank or unparseable values yield `None`.
pub fn year_from_release_date(date: &str) -> Option<i32> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(d.year());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.year());
    }

    // "1996" or "1996-03"
    let head = date.get(..4)?;
    let rest = &date[4..];
    if rest.is_empty() || rest.starts_with('-') {
        return parse_four_digit_year(head);
    }
    None
}

/// Extract a year from a `(YYYY)` token in a title. The last such token wins.
pub fn year_from_name(name: &str) -> Option<i32> {
    let bytes = name.as_bytes();
    let mut found = None;
    let mut i = 0;
    while i + 6 <= bytes.len() {
        if bytes[i] == b'(' && bytes[i + 5] == b')' {
            if let Some(year) = name.get(i + 1..i + 5).and_then(parse_four_digit_year) {
                found = Some(year);
                i += 6;
                continue;
            }
        }
        i += 1;
    }
    found
}

fn parse_four_digit_year(s: &str) -> Option<i32> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) || s.starts_with('0') {
        return None;
    }
    s.parse().ok()
}

// ── Series names ────────────────────────────────────────────────────────────

/// A `SxxEyy` episode marker found in a display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeMarker {
    /// Byte offset where the marker starts.
    pub start: usize,
    pub season: i32,
    pub episode: i32,
}

/// Find the first `SxxEyy` marker (case-insensitive, optional space before `E`).
pub fn parse_episode_marker(name: &str) -> Option<EpisodeMarker> {
    let bytes = name.as_bytes();
    for start in 0..bytes.len() {
        if !bytes[start].eq_ignore_ascii_case(&b's') {
            continue;
        }
        // Must begin a word
        if start > 0 && bytes[start - 1].is_ascii_alphanumeric() {
            continue;
        }
        let (season, mut pos) = match read_digits(bytes, start + 1) {
            Some(v) => v,
            None => continue,
        };
        while pos < bytes.len() && bytes[pos] == b' ' {
            pos += 1;
        }
        if pos >= bytes.len() || !bytes[pos].eq_ignore_ascii_case(&b'e') {
            continue;
        }
        let Some((episode, end)) = read_digits(bytes, pos + 1) else {
            continue;
        };
        if end < bytes.len() && bytes[end].is_ascii_alphanumeric() {
            continue;
        }
        return Some(EpisodeMarker {
            start,
            season,
            episode,
        });
    }
    None
}

fn read_digits(bytes: &[u8], from: usize) -> Option<(i32, usize)> {
    let mut end = from;
    while end < bytes.len() && bytes[end].is_ascii_digit() && end - from < 4 {
        end += 1;
    }
    if end == from {
        return None;
    }
    let value = std::str::from_utf8(&bytes[from..end]).ok()?.parse().ok()?;
    Some((value, end))
}

/// Strip a trailing episode marker (and separators before it) from a display name.
///
/// `"The Expanse S02E05"` and `"The Expanse - S02 E05 - Doors"` both become
/// `"The Expanse"`.
pub fn series_title(name: &str) -> &str {
    let cut = match parse_episode_marker(name) {
        Some(marker) if marker.start > 0 => &name[..marker.start],
        _ => name,
    };
    cut.trim_end_matches(|c: char| c.is_whitespace() || c == '-' || c == '|' || c == ':')
        .trim()
}

/// Lowercase, whitespace-normalized slug identifying a series by name.
///
/// Two series whose names differ only in case or spacing map to the same slug.
///
/// # Examples
///
/// ```
/// use vodsync_catalog::name_parser::series_slug;
///
/// assert_eq!(series_slug("The  Expanse S01E02"), "the-expanse");
/// assert_eq!(series_slug("the expanse"), "the-expanse");
/// ```
pub fn series_slug(name: &str) -> String {
    series_title(name)
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

// ── URLs ────────────────────────────────────────────────────────────────────

/// Final path segment of a URL, ignoring any query string or fragment.
pub fn url_final_segment(url: &str) -> Option<&str> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let path = match without_query.find("://") {
        Some(pos) => &without_query[pos + 3..],
        None => without_query,
    };
    // Skip the authority component
    let path = path.split_once('/').map(|(_, p)| p)?;
    path.rsplit('/').find(|s| !s.is_empty())
}

/// Split `"1234.mkv"` into `("1234", Some("mkv"))`.
pub fn split_extension(segment: &str) -> (&str, Option<&str>) {
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (segment, None),
    }
}

/// Path segments of a URL (authority excluded), lowercased for classification.
pub fn url_path_segments(url: &str) -> Vec<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let path = match without_query.find("://") {
        Some(pos) => &without_query[pos + 3..],
        None => without_query,
    };
    match path.split_once('/') {
        Some((_, p)) => p
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase())
            .collect(),
        None => Vec::new(),
    }
}
