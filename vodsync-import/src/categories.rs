//! Category merging.
//!
//! VOD and series categories come from two separate listings that share one
//! id space. They are merged into a single id → name map, and on a collision
//! the series name wins. The merged map names entities for the current run;
//! the store only ever gains names it has not seen before.

use std::collections::BTreeMap;

use rusqlite::Connection;
use vodsync_catalog::types::{Category, EntityKind};
use vodsync_db::operations;
use vodsync_provider::ProviderClient;

use crate::error::{PhaseError, StoreError};

/// Merged category id → display name for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMap(BTreeMap<String, String>);

impl CategoryMap {
    /// Merge VOD categories, then series categories over them.
    pub fn merge(vod: Vec<Category>, series: Vec<Category>) -> Self {
        let mut map = BTreeMap::new();
        for category in vod.into_iter().chain(series) {
            let id = category.id.trim();
            let name = category.name.trim();
            if id.is_empty() || name.is_empty() {
                continue;
            }
            map.insert(id.to_string(), name.to_string());
        }
        Self(map)
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.0.get(id.trim()).map(String::as_str)
    }

    /// Category name for an entity, falling back to the kind's generic label.
    pub fn resolve(&self, id: Option<&str>, kind: EntityKind) -> String {
        id.and_then(|id| self.get(id))
            .unwrap_or(kind.fallback_category())
            .to_string()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Store every merged category this provider does not already have.
///
/// Returns the number of newly stored names.
pub fn persist_categories(
    conn: &Connection,
    provider_id: &str,
    categories: &CategoryMap,
) -> Result<usize, StoreError> {
    let tx = crate::begin_write(conn)?;
    let mut inserted = 0;
    for (id, name) in categories.iter() {
        if operations::upsert_category_if_absent(&tx, provider_id, &Category::new(id, name))? {
            inserted += 1;
        }
    }
    tx.commit()?;
    Ok(inserted)
}

/// Fetch both category listings, merge them, and persist new names.
pub fn sync_categories(
    conn: &Connection,
    provider_id: &str,
    client: &dyn ProviderClient,
) -> Result<CategoryMap, PhaseError> {
    let vod = client.fetch_vod_categories()?;
    let series = client.fetch_series_categories()?;
    log::debug!(
        "Fetched {} VOD and {} series categories for '{}'",
        vod.len(),
        series.len(),
        provider_id
    );

    let merged = CategoryMap::merge(vod, series);
    let inserted = persist_categories(conn, provider_id, &merged)?;
    log::debug!("Stored {} new category names", inserted);
    Ok(merged)
}
