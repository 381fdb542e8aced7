//! Feed rows as returned by the `player_api.php` listing API.
//!
//! Providers are inconsistent about JSON types: ids and ratings show up as
//! strings on one server and numbers on another, and empty collections are
//! sometimes `[]` where an object is expected. Every field here is lenient.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use vodsync_catalog::types::Category;

/// One entry of `get_vod_categories` / `get_series_categories`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRow {
    #[serde(default, deserialize_with = "string_or_number")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
}

impl CategoryRow {
    /// Convert to a catalog category, dropping rows without an id or name.
    pub fn into_category(self) -> Option<Category> {
        let id = self.category_id?.trim().to_string();
        let name = self.category_name?.trim().to_string();
        if id.is_empty() || name.is_empty() {
            return None;
        }
        Some(Category { id, name })
    }
}

/// One entry of `get_vod_streams`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieFeedRow {
    #[serde(rename = "stream_id", default, deserialize_with = "string_or_number")]
    pub native_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub category_id: Option<String>,
    #[serde(rename = "stream_icon", default)]
    pub logo: Option<String>,
    #[serde(rename = "container_extension", default)]
    pub container: Option<String>,
    #[serde(
        default,
        alias = "releasedate",
        alias = "releaseDate",
        deserialize_with = "string_or_number"
    )]
    pub release_date: Option<String>,
    #[serde(rename = "plot", default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating: Option<f64>,
}

/// One entry of `get_series`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesFeedRow {
    #[serde(rename = "series_id", default, deserialize_with = "string_or_number")]
    pub native_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub category_id: Option<String>,
    #[serde(rename = "cover", default)]
    pub logo: Option<String>,
    #[serde(
        default,
        alias = "releaseDate",
        alias = "releasedate",
        deserialize_with = "string_or_number"
    )]
    pub release_date: Option<String>,
    #[serde(rename = "plot", default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating: Option<f64>,
}

/// Response of `get_series_info`. Only the episode listing is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesInfoResponse {
    #[serde(default, deserialize_with = "episodes_by_season")]
    pub episodes: BTreeMap<String, Vec<EpisodeFeedRow>>,
}

impl SeriesInfoResponse {
    /// Flatten the per-season map into one list.
    pub fn into_episodes(self) -> Vec<EpisodeFeedRow> {
        self.episodes.into_values().flatten().collect()
    }
}

/// One episode from `get_series_info`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpisodeFeedRow {
    #[serde(rename = "id", default, deserialize_with = "string_or_number")]
    pub native_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub season: Option<i32>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub episode_num: Option<i32>,
    #[serde(rename = "container_extension", default)]
    pub container: Option<String>,
}

// ── Lenient deserializers ───────────────────────────────────────────────────

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accept `{"1": [..], "2": [..]}` or a bare list of episodes.
fn episodes_by_season<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, Vec<EpisodeFeedRow>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Episodes {
        BySeason(BTreeMap<String, Vec<EpisodeFeedRow>>),
        Flat(Vec<EpisodeFeedRow>),
        Other(serde_json::Value),
    }

    Ok(match Option::<Episodes>::deserialize(deserializer)? {
        Some(Episodes::BySeason(map)) => map,
        Some(Episodes::Flat(list)) if !list.is_empty() => {
            BTreeMap::from([(String::new(), list)])
        }
        _ => BTreeMap::new(),
    })
}
