//! On-demand episode refresh for one series.

use rusqlite::Connection;
use vodsync_catalog::name_parser::usable_native_id;
use vodsync_catalog::types::{EntityKind, ScanStart};
use vodsync_db::{operations, queries};
use vodsync_provider::ProviderClient;

use crate::error::SyncError;
use crate::status::StatusSink;
use crate::upsert::RelationTracker;

/// Counts from one episode refresh.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeRefreshStats {
    pub seen: u64,
    pub skipped: u64,
    pub reaped: usize,
}

/// Fetch a series' episodes and replace this provider's episode relations
/// for it.
///
/// The fetch completes before the transaction opens. Episodes the provider
/// no longer lists for this series are deleted in the same transaction.
pub fn refresh_series_episodes(
    conn: &Connection,
    provider_id: &str,
    series_native_id: &str,
    client: &dyn ProviderClient,
    sink: &dyn StatusSink,
) -> Result<EpisodeRefreshStats, SyncError> {
    refresh_series_episodes_at(
        conn,
        provider_id,
        series_native_id,
        client,
        sink,
        ScanStart::now(),
    )
}

/// Like [`refresh_series_episodes`] with an explicit watermark.
pub fn refresh_series_episodes_at(
    conn: &Connection,
    provider_id: &str,
    series_native_id: &str,
    client: &dyn ProviderClient,
    sink: &dyn StatusSink,
    scan_start: ScanStart,
) -> Result<EpisodeRefreshStats, SyncError> {
    let series = queries::find_relation(conn, EntityKind::Series, provider_id, series_native_id)?
        .ok_or_else(|| SyncError::UnknownSeries {
            provider: provider_id.to_string(),
            series: series_native_id.to_string(),
        })?;

    let rows = client.fetch_series_episodes(series_native_id).inspect_err(|e| {
        sink.error(&format!(
            "Episode fetch failed for series '{}': {}",
            series_native_id, e
        ));
    })?;

    let mut stats = EpisodeRefreshStats::default();

    let tx = crate::begin_write(conn)?;
    let mut relations = RelationTracker::new(&tx, provider_id, scan_start);
    for row in &rows {
        let Some(native_id) = usable_native_id(row.native_id.as_deref()) else {
            stats.skipped += 1;
            continue;
        };
        let title = row
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(native_id);
        relations.touch_episode(
            series.entity_id,
            native_id,
            row.season,
            row.episode_num,
            title,
            row.container.as_deref(),
        )?;
    }
    stats.seen = relations.touched();
    drop(relations);
    stats.reaped = operations::delete_stale_series_episodes(
        &tx,
        provider_id,
        series.entity_id,
        scan_start.as_millis(),
    )?;
    tx.commit()?;

    sink.info(&format!(
        "Series '{}': {} episodes, {} removed",
        series_native_id, stats.seen, stats.reaped
    ));
    Ok(stats)
}
