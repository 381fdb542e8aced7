//! Stale relation and orphan entity cleanup.
//!
//! Cleanup runs in two strictly ordered steps inside one transaction: first
//! this provider's stale relations are removed from every reaped relation
//! table, then entities left without any relation (from any provider) are
//! deleted.

use rusqlite::Connection;
use vodsync_catalog::types::{EntityKind, RelationKind, ScanStart};
use vodsync_db::operations;

use crate::error::StoreError;

/// How episode relations are cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeReap {
    /// Leave episode relations alone.
    Skip,
    /// Delete episodes last seen before the watermark.
    Watermark,
    /// Delete episodes whose series this provider no longer lists.
    Detached,
}

/// Which relation kinds one cleanup pass may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReapScope {
    pub movies: bool,
    pub series: bool,
    pub episodes: EpisodeReap,
}

/// Counts from one cleanup pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReapStats {
    pub movie_relations: usize,
    pub series_relations: usize,
    pub episode_relations: usize,
    pub movies: usize,
    pub series: usize,
}

impl ReapStats {
    pub fn relations(&self) -> usize {
        self.movie_relations + self.series_relations + self.episode_relations
    }

    pub fn entities(&self) -> usize {
        self.movies + self.series
    }
}

/// Remove this provider's stale relations, then every orphaned entity.
pub fn reap(
    conn: &Connection,
    provider_id: &str,
    scope: ReapScope,
    scan_start: ScanStart,
) -> Result<ReapStats, StoreError> {
    let before = scan_start.as_millis();
    let mut stats = ReapStats::default();

    let tx = crate::begin_write(conn)?;

    if scope.movies {
        stats.movie_relations =
            operations::delete_stale_relations(&tx, RelationKind::Movie, provider_id, before)?;
    }
    if scope.series {
        stats.series_relations =
            operations::delete_stale_relations(&tx, RelationKind::Series, provider_id, before)?;
    }
    // Detached episodes are found through series relations, so this runs
    // after the series relations above are gone.
    stats.episode_relations = match scope.episodes {
        EpisodeReap::Skip => 0,
        EpisodeReap::Watermark => {
            operations::delete_stale_relations(&tx, RelationKind::Episode, provider_id, before)?
        }
        EpisodeReap::Detached => operations::delete_detached_episode_relations(&tx, provider_id)?,
    };

    stats.movies = operations::delete_orphan_entities(&tx, EntityKind::Movie)?;
    stats.series = operations::delete_orphan_entities(&tx, EntityKind::Series)?;

    tx.commit()?;

    log::debug!(
        "Reaped {} relations and {} entities for '{}'",
        stats.relations(),
        stats.entities(),
        provider_id
    );
    Ok(stats)
}

/// Delete a provider and everything only it referenced.
///
/// Categories and relations cascade with the provider row; orphaned entities
/// are collected in the same transaction.
pub fn purge_provider(conn: &Connection, provider_id: &str) -> Result<ReapStats, StoreError> {
    let tx = crate::begin_write(conn)?;
    operations::delete_provider(&tx, provider_id)?;
    let stats = ReapStats {
        movies: operations::delete_orphan_entities(&tx, EntityKind::Movie)?,
        series: operations::delete_orphan_entities(&tx, EntityKind::Series)?,
        ..Default::default()
    };
    tx.commit()?;
    Ok(stats)
}
