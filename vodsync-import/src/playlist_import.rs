//! Playlist ingestion.
//!
//! Classified playlist entries feed the same upsert and relation machinery as
//! a structured sync. Movies and series each commit in their own transaction,
//! then cleanup reaps every relation kind by watermark, since a playlist lists
//! episodes in full.

use rusqlite::Connection;
use vodsync_catalog::name_parser::derive_year;
use vodsync_catalog::playlist::{PlaylistEntry, parse_playlist};
use vodsync_catalog::types::{EntityFields, EntityKind, Provider, ScanStart};
use vodsync_provider::validate_provider_id;

use crate::error::{StoreError, SyncError};
use crate::orchestrator::{
    Phase, SyncReport, ensure_provider, record_sync_log, run_cleanup, run_phase,
};
use crate::reaper::{EpisodeReap, ReapScope};
use crate::status::StatusSink;
use crate::upsert::{EntityUpserter, RelationTracker, UpsertStats};

/// Ingest playlist text for a provider.
pub fn ingest_playlist(
    conn: &Connection,
    provider: &Provider,
    text: &str,
    sink: &dyn StatusSink,
) -> Result<SyncReport, SyncError> {
    ingest_playlist_at(conn, provider, text, sink, ScanStart::now())
}

/// Like [`ingest_playlist`] with an explicit watermark.
pub fn ingest_playlist_at(
    conn: &Connection,
    provider: &Provider,
    text: &str,
    sink: &dyn StatusSink,
    scan_start: ScanStart,
) -> Result<SyncReport, SyncError> {
    validate_provider_id(&provider.id)?;
    ensure_provider(conn, provider)?;

    let entries = parse_playlist(text);
    let (movies, series): (Vec<_>, Vec<_>) = entries
        .iter()
        .partition(|e| e.kind == EntityKind::Movie);
    sink.info(&format!(
        "Playlist for '{}': {} movie and {} series entries",
        provider.id,
        movies.len(),
        series.len()
    ));

    let provider_id = provider.id.as_str();
    let mut report = SyncReport {
        provider_id: provider_id.to_string(),
        scan_start: scan_start.as_millis(),
        ..Default::default()
    };

    (report.movies_outcome, report.movies) = run_phase(sink, Phase::Movies, || {
        Ok(ingest_movies(conn, provider_id, &movies, scan_start)?)
    });
    (report.series_outcome, report.series) = run_phase(sink, Phase::Series, || {
        Ok(ingest_series(conn, provider_id, &series, scan_start)?)
    });

    let scope = ReapScope {
        movies: report.movies_outcome.succeeded(),
        series: report.series_outcome.succeeded(),
        episodes: if report.series_outcome.succeeded() {
            EpisodeReap::Watermark
        } else {
            EpisodeReap::Skip
        },
    };
    run_cleanup(conn, provider_id, scope, scan_start, sink, &mut report);

    record_sync_log(conn, &report, "playlist");
    Ok(report)
}

fn entry_fields(entry: &PlaylistEntry, name: &str) -> EntityFields {
    EntityFields {
        name: name.to_string(),
        year: derive_year(None, name),
        description: None,
        logo: entry.logo().map(str::to_string),
        category_name: entry
            .group_title()
            .unwrap_or(entry.kind.fallback_category())
            .to_string(),
        rating: None,
    }
}

fn ingest_movies(
    conn: &Connection,
    provider_id: &str,
    entries: &[&PlaylistEntry],
    scan_start: ScanStart,
) -> Result<UpsertStats, StoreError> {
    let tx = crate::begin_write(conn)?;
    let mut upserter = EntityUpserter::load(&tx, EntityKind::Movie, provider_id)?;
    let mut relations = RelationTracker::new(&tx, provider_id, scan_start);

    for entry in entries {
        let Some(native_id) = entry.native_id() else {
            upserter.skip();
            continue;
        };
        let id = upserter.upsert(&native_id, &entry_fields(entry, &entry.name))?;
        relations.touch(EntityKind::Movie, id, &native_id, entry.container())?;
    }

    let stats = upserter.stats();
    drop(upserter);
    drop(relations);
    tx.commit()?;
    Ok(stats)
}

/// Each series line names one episode. Entries sharing a series slug land on
/// one series entity with one series relation.
fn ingest_series(
    conn: &Connection,
    provider_id: &str,
    entries: &[&PlaylistEntry],
    scan_start: ScanStart,
) -> Result<UpsertStats, StoreError> {
    let tx = crate::begin_write(conn)?;
    let mut upserter = EntityUpserter::load(&tx, EntityKind::Series, provider_id)?;
    let mut relations = RelationTracker::new(&tx, provider_id, scan_start);

    for entry in entries {
        let Some(native_id) = entry.native_id() else {
            upserter.skip();
            continue;
        };
        let title = entry.series_title();
        let series_id = upserter.upsert(&native_id, &entry_fields(entry, title))?;
        relations.touch(EntityKind::Series, series_id, &native_id, None)?;

        match entry.episode_native_id().filter(|id| !id.is_empty()) {
            Some(episode_id) => {
                let (season, episode_num) = entry.season_episode();
                relations.touch_episode(
                    series_id,
                    episode_id,
                    season,
                    episode_num,
                    &entry.name,
                    entry.container(),
                )?;
            }
            None => log::debug!("Series entry '{}' has no episode id", entry.name),
        }
    }

    let stats = upserter.stats();
    drop(upserter);
    drop(relations);
    tx.commit()?;
    Ok(stats)
}
