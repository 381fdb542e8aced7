//! Data model types for the VOD catalog.
//!
//! These types represent the persistent catalog schema: providers, categories,
//! movie and series entities, the provider relations that keep them alive,
//! and sync tracking.

use serde::{Deserialize, Serialize};

/// Category label used for movies whose category id cannot be resolved.
pub const UNCATEGORIZED_MOVIES: &str = "Uncategorized Movies";

/// Category label used for series whose category id cannot be resolved.
pub const UNCATEGORIZED_SERIES: &str = "Uncategorized Series";

/// Container extension recorded when a feed row does not advertise one.
pub const DEFAULT_CONTAINER: &str = "mp4";

// ── Entity kinds ────────────────────────────────────────────────────────────

/// The two kinds of catalog entity a provider can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Movie,
    Series,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }

    /// Fallback category name for rows whose category id is unknown.
    pub fn fallback_category(&self) -> &'static str {
        match self {
            Self::Movie => UNCATEGORIZED_MOVIES,
            Self::Series => UNCATEGORIZED_SERIES,
        }
    }

    /// Plural label for status messages ("movies", "series").
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Movie => "movies",
            Self::Series => "series",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The relation tables linking providers to entities.
///
/// Episode relations point at a series entity, so a series stays referenced
/// as long as either a series relation or an episode relation survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    Movie,
    Series,
    Episode,
}

impl RelationKind {
    pub const ALL: [RelationKind; 3] = [Self::Movie, Self::Series, Self::Episode];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
            Self::Episode => "episode",
        }
    }

    /// The entity kind this relation references.
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            Self::Movie => EntityKind::Movie,
            Self::Series | Self::Episode => EntityKind::Series,
        }
    }
}

impl From<EntityKind> for RelationKind {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Movie => Self::Movie,
            EntityKind::Series => Self::Series,
        }
    }
}

// ── Provider ────────────────────────────────────────────────────────────────

/// How a provider publishes its catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Structured listing API (`player_api.php`).
    Xtream,
    /// A single M3U playlist document.
    M3u,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xtream => "xtream",
            Self::M3u => "m3u",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "xtream" | "xtream-codes" | "api" => Some(Self::Xtream),
            "m3u" | "m3u8" | "playlist" => Some(Self::M3u),
            _ => None,
        }
    }
}

/// A registered content provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub name: String,
    pub kind: ProviderKind,
    pub base_url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

// ── Categories ──────────────────────────────────────────────────────────────

/// A provider category, keyed by the provider-native category id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// ── Entities ────────────────────────────────────────────────────────────────

/// The mutable fields of a movie or series, refreshed on every sync.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityFields {
    pub name: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub category_name: String,
    pub rating: Option<f64>,
}

/// A persisted movie or series row.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: i64,
    pub kind: EntityKind,
    pub provider_unique_id: String,
    pub name: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub category_name: String,
    pub rating: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

// ── Relations ───────────────────────────────────────────────────────────────

/// A provider → movie or provider → series link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub provider_id: String,
    pub entity_id: i64,
    pub native_id: String,
    pub container: String,
    /// Scan start (epoch millis) of the last run that observed this row.
    pub last_seen: i64,
}

/// A provider → series link for a single episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRelation {
    pub provider_id: String,
    pub series_id: i64,
    pub native_id: String,
    pub season: Option<i32>,
    pub episode_num: Option<i32>,
    pub title: String,
    pub container: String,
    pub last_seen: i64,
}

// ── Sync tracking ───────────────────────────────────────────────────────────

/// The staleness watermark for one reconciliation run.
///
/// Captured once before any phase runs and reused unchanged by every phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScanStart(i64);

impl ScanStart {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }
}

/// Log entry for one sync run of one provider.
#[derive(Debug, Clone, Default)]
pub struct SyncLog {
    pub id: i64,
    pub provider_id: String,
    pub source: String,
    pub started_at: i64,
    pub finished_at: i64,
    pub outcome: String,
    pub movies_created: i64,
    pub movies_updated: i64,
    pub series_created: i64,
    pub series_updated: i64,
    pub rows_skipped: i64,
    pub relations_reaped: i64,
    pub entities_reaped: i64,
}
