//! Entity upserts and relation tracking.
//!
//! An [`EntityUpserter`] preloads the provider-unique id map for one provider
//! and kind, then inserts or refreshes entities row by row. A
//! [`RelationTracker`] stamps the matching relation rows with the run's
//! watermark. Both borrow the phase transaction's connection.

use std::collections::HashMap;

use rusqlite::Connection;
use vodsync_catalog::name_parser::{derive_year, provider_unique_id, usable_native_id};
use vodsync_catalog::types::*;
use vodsync_db::operations;
use vodsync_provider::{MovieFeedRow, SeriesFeedRow};

use crate::categories::CategoryMap;
use crate::error::StoreError;

/// Per-phase counts from an upsert pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertStats {
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub skipped: u64,
}

/// Inserts new entities and refreshes known ones for one provider and kind.
pub struct EntityUpserter<'c> {
    conn: &'c Connection,
    kind: EntityKind,
    provider_id: &'c str,
    ids: HashMap<String, i64>,
    stats: UpsertStats,
}

impl<'c> EntityUpserter<'c> {
    /// Preload the complete provider-unique id map in one read.
    pub fn load(
        conn: &'c Connection,
        kind: EntityKind,
        provider_id: &'c str,
    ) -> Result<Self, StoreError> {
        let ids = operations::load_entity_id_map(conn, kind, provider_id)?;
        log::debug!(
            "Preloaded {} {} ids for '{}'",
            ids.len(),
            kind.as_str(),
            provider_id
        );
        Ok(Self {
            conn,
            kind,
            provider_id,
            ids,
            stats: UpsertStats::default(),
        })
    }

    /// Insert or refresh the entity for `native_id`. Returns its internal id.
    ///
    /// New ids join the in-memory map immediately, so a duplicate row later
    /// in the same feed resolves to the same entity.
    pub fn upsert(&mut self, native_id: &str, fields: &EntityFields) -> Result<i64, StoreError> {
        let unique_id = provider_unique_id(self.kind, self.provider_id, native_id);
        if let Some(&id) = self.ids.get(&unique_id) {
            if operations::update_entity(self.conn, self.kind, id, fields)? {
                self.stats.updated += 1;
            } else {
                self.stats.unchanged += 1;
            }
            return Ok(id);
        }

        let id = operations::insert_entity(self.conn, self.kind, &unique_id, fields)?;
        self.ids.insert(unique_id, id);
        self.stats.created += 1;
        Ok(id)
    }

    /// Count a row dropped for lack of a usable native id.
    pub fn skip(&mut self) {
        self.stats.skipped += 1;
    }

    pub fn stats(&self) -> UpsertStats {
        self.stats
    }
}

/// Writes relation rows stamped with the run's watermark.
pub struct RelationTracker<'c> {
    conn: &'c Connection,
    provider_id: &'c str,
    scan_start: ScanStart,
    touched: u64,
}

impl<'c> RelationTracker<'c> {
    pub fn new(conn: &'c Connection, provider_id: &'c str, scan_start: ScanStart) -> Self {
        Self {
            conn,
            provider_id,
            scan_start,
            touched: 0,
        }
    }

    /// Record that this provider advertises `native_id` for an entity.
    pub fn touch(
        &mut self,
        kind: EntityKind,
        entity_id: i64,
        native_id: &str,
        container: Option<&str>,
    ) -> Result<(), StoreError> {
        let relation = Relation {
            provider_id: self.provider_id.to_string(),
            entity_id,
            native_id: native_id.to_string(),
            container: container_or_default(container),
            last_seen: self.scan_start.as_millis(),
        };
        operations::upsert_relation(self.conn, kind, &relation)?;
        self.touched += 1;
        Ok(())
    }

    /// Record one episode of a series.
    pub fn touch_episode(
        &mut self,
        series_id: i64,
        native_id: &str,
        season: Option<i32>,
        episode_num: Option<i32>,
        title: &str,
        container: Option<&str>,
    ) -> Result<(), StoreError> {
        let episode = EpisodeRelation {
            provider_id: self.provider_id.to_string(),
            series_id,
            native_id: native_id.to_string(),
            season,
            episode_num,
            title: title.to_string(),
            container: container_or_default(container),
            last_seen: self.scan_start.as_millis(),
        };
        operations::upsert_episode_relation(self.conn, &episode)?;
        self.touched += 1;
        Ok(())
    }

    pub fn touched(&self) -> u64 {
        self.touched
    }
}

pub(crate) fn container_or_default(container: Option<&str>) -> String {
    container
        .map(str::trim)
        .map(|c| c.trim_start_matches('.'))
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CONTAINER)
        .to_string()
}

/// A row of a structured movie or series listing.
pub trait FeedRow {
    const KIND: EntityKind;

    fn raw_native_id(&self) -> Option<&str>;

    fn container(&self) -> Option<&str> {
        None
    }

    /// Entity fields for this row. `native_id` stands in for a missing name.
    fn fields(&self, native_id: &str, categories: &CategoryMap) -> EntityFields;
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[allow(clippy::too_many_arguments)]
fn build_fields(
    kind: EntityKind,
    native_id: &str,
    name: Option<&String>,
    release_date: Option<&String>,
    description: Option<&String>,
    logo: Option<&String>,
    category_id: Option<&String>,
    rating: Option<f64>,
    categories: &CategoryMap,
) -> EntityFields {
    let name = non_blank(name).unwrap_or_else(|| native_id.to_string());
    EntityFields {
        year: derive_year(release_date.map(String::as_str), &name),
        name,
        description: non_blank(description),
        logo: non_blank(logo),
        category_name: categories.resolve(category_id.map(String::as_str), kind),
        rating,
    }
}

impl FeedRow for MovieFeedRow {
    const KIND: EntityKind = EntityKind::Movie;

    fn raw_native_id(&self) -> Option<&str> {
        self.native_id.as_deref()
    }

    fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    fn fields(&self, native_id: &str, categories: &CategoryMap) -> EntityFields {
        build_fields(
            Self::KIND,
            native_id,
            self.name.as_ref(),
            self.release_date.as_ref(),
            self.description.as_ref(),
            self.logo.as_ref(),
            self.category_id.as_ref(),
            self.rating,
            categories,
        )
    }
}

impl FeedRow for SeriesFeedRow {
    const KIND: EntityKind = EntityKind::Series;

    fn raw_native_id(&self) -> Option<&str> {
        self.native_id.as_deref()
    }

    fn fields(&self, native_id: &str, categories: &CategoryMap) -> EntityFields {
        build_fields(
            Self::KIND,
            native_id,
            self.name.as_ref(),
            self.release_date.as_ref(),
            self.description.as_ref(),
            self.logo.as_ref(),
            self.category_id.as_ref(),
            self.rating,
            categories,
        )
    }
}

/// Upsert a whole feed listing inside one transaction.
///
/// Rows without a usable native id produce neither an entity nor a relation.
/// Any store error rolls back every write of this call.
pub fn upsert_feed<R: FeedRow>(
    conn: &Connection,
    provider_id: &str,
    rows: &[R],
    categories: &CategoryMap,
    scan_start: ScanStart,
) -> Result<UpsertStats, StoreError> {
    let tx = crate::begin_write(conn)?;
    let mut upserter = EntityUpserter::load(&tx, R::KIND, provider_id)?;
    let mut relations = RelationTracker::new(&tx, provider_id, scan_start);

    for row in rows {
        let Some(native_id) = usable_native_id(row.raw_native_id()) else {
            upserter.skip();
            continue;
        };
        let fields = row.fields(native_id, categories);
        let entity_id = upserter.upsert(native_id, &fields)?;
        relations.touch(R::KIND, entity_id, native_id, row.container())?;
    }

    let stats = upserter.stats();
    log::debug!("Touched {} {} relations", relations.touched(), R::KIND.as_str());
    drop(upserter);
    drop(relations);
    tx.commit()?;

    if stats.skipped > 0 {
        log::warn!(
            "Skipped {} {} rows without a native id",
            stats.skipped,
            R::KIND.as_str()
        );
    }
    Ok(stats)
}
