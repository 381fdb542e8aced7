//! Provider reconciliation runs.
//!
//! A run executes four phases in order: Categories, Movies, Series, Cleanup.
//! Each phase writes inside its own transaction. A category failure aborts
//! the run; a movie or series failure only rolls back that phase, and its
//! relations are left out of cleanup so a transient feed error cannot wipe
//! the provider's catalog.

use rusqlite::Connection;
use vodsync_catalog::types::{Provider, ProviderKind, ScanStart, SyncLog};
use vodsync_db::operations;
use vodsync_provider::{Credentials, ProviderClient};

use crate::categories;
use crate::error::{PhaseError, SyncError};
use crate::reaper::{self, EpisodeReap, ReapScope, ReapStats};
use crate::status::StatusSink;
use crate::upsert::{UpsertStats, upsert_feed};

/// The phases of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Categories,
    Movies,
    Series,
    Cleanup,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Categories => "categories",
            Self::Movies => "movies",
            Self::Series => "series",
            Self::Cleanup => "cleanup",
        })
    }
}

/// How one phase ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PhaseOutcome {
    #[default]
    NotRun,
    Succeeded,
    Failed(String),
}

impl PhaseOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Result of one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub provider_id: String,
    pub scan_start: i64,
    pub categories: usize,
    pub categories_outcome: PhaseOutcome,
    pub movies_outcome: PhaseOutcome,
    pub series_outcome: PhaseOutcome,
    pub cleanup_outcome: PhaseOutcome,
    pub movies: UpsertStats,
    pub series: UpsertStats,
    pub reaped: ReapStats,
}

impl SyncReport {
    fn new(provider_id: &str, scan_start: ScanStart) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            scan_start: scan_start.as_millis(),
            ..Default::default()
        }
    }

    /// True when every phase that ran succeeded.
    pub fn is_complete(&self) -> bool {
        [
            &self.movies_outcome,
            &self.series_outcome,
            &self.cleanup_outcome,
        ]
        .iter()
        .all(|o| o.succeeded())
    }

    /// Short outcome label stored in the sync log.
    pub fn outcome_label(&self) -> &'static str {
        if matches!(self.categories_outcome, PhaseOutcome::Failed(_)) {
            "aborted"
        } else if self.is_complete() {
            "ok"
        } else {
            "partial"
        }
    }

    pub(crate) fn to_sync_log(&self, source: &str, finished_at: i64) -> SyncLog {
        SyncLog {
            provider_id: self.provider_id.clone(),
            source: source.to_string(),
            started_at: self.scan_start,
            finished_at,
            outcome: self.outcome_label().to_string(),
            movies_created: self.movies.created as i64,
            movies_updated: self.movies.updated as i64,
            series_created: self.series.created as i64,
            series_updated: self.series.updated as i64,
            rows_skipped: (self.movies.skipped + self.series.skipped) as i64,
            relations_reaped: self.reaped.relations() as i64,
            entities_reaped: self.reaped.entities() as i64,
            ..Default::default()
        }
    }
}

/// Synchronize one structured-API provider into the catalog.
pub fn sync_provider(
    conn: &Connection,
    provider: &Provider,
    client: &dyn ProviderClient,
    sink: &dyn StatusSink,
) -> Result<SyncReport, SyncError> {
    sync_provider_at(conn, provider, client, sink, ScanStart::now())
}

/// Like [`sync_provider`] with an explicit watermark.
pub fn sync_provider_at(
    conn: &Connection,
    provider: &Provider,
    client: &dyn ProviderClient,
    sink: &dyn StatusSink,
    scan_start: ScanStart,
) -> Result<SyncReport, SyncError> {
    if provider.kind != ProviderKind::Xtream {
        return Err(SyncError::WrongKind {
            provider: provider.id.clone(),
            actual: provider.kind.as_str(),
            expected: ProviderKind::Xtream.as_str(),
        });
    }
    Credentials::from_provider(provider)?;
    ensure_provider(conn, provider)?;

    let provider_id = provider.id.as_str();
    let mut report = SyncReport::new(provider_id, scan_start);
    sink.info(&format!("Syncing provider '{}'", provider.name));

    // Phase 1: categories. Failure aborts the run.
    let categories = match categories::sync_categories(conn, provider_id, client) {
        Ok(map) => {
            report.categories = map.len();
            report.categories_outcome = PhaseOutcome::Succeeded;
            sink.info(&format!("Merged {} categories", map.len()));
            map
        }
        Err(e) => {
            sink.error(&format!("Category sync failed for '{}': {}", provider_id, e));
            report.categories_outcome = PhaseOutcome::Failed(e.to_string());
            record_sync_log(conn, &report, "api");
            return Err(SyncError::Categories(e));
        }
    };

    // Phase 2: movies.
    let movies = run_phase(sink, Phase::Movies, || {
        let rows = client.fetch_movies()?;
        Ok(upsert_feed(conn, provider_id, &rows, &categories, scan_start)?)
    });
    (report.movies_outcome, report.movies) = movies;

    // Phase 3: series.
    let series = run_phase(sink, Phase::Series, || {
        let rows = client.fetch_series()?;
        Ok(upsert_feed(conn, provider_id, &rows, &categories, scan_start)?)
    });
    (report.series_outcome, report.series) = series;

    // Phase 4: cleanup, limited to kinds whose feed phase succeeded.
    let scope = ReapScope {
        movies: report.movies_outcome.succeeded(),
        series: report.series_outcome.succeeded(),
        episodes: if report.series_outcome.succeeded() {
            EpisodeReap::Detached
        } else {
            EpisodeReap::Skip
        },
    };
    run_cleanup(conn, provider_id, scope, scan_start, sink, &mut report);

    record_sync_log(conn, &report, "api");
    Ok(report)
}

/// Run one feed phase, converting a failure into a reported outcome.
pub(crate) fn run_phase(
    sink: &dyn StatusSink,
    phase: Phase,
    body: impl FnOnce() -> Result<UpsertStats, PhaseError>,
) -> (PhaseOutcome, UpsertStats) {
    match body() {
        Ok(stats) => {
            sink.info(&format!(
                "{}: {} created, {} updated, {} unchanged, {} skipped",
                phase, stats.created, stats.updated, stats.unchanged, stats.skipped
            ));
            (PhaseOutcome::Succeeded, stats)
        }
        Err(e) => {
            sink.error(&format!("{} phase failed, changes rolled back: {}", phase, e));
            (PhaseOutcome::Failed(e.to_string()), UpsertStats::default())
        }
    }
}

pub(crate) fn run_cleanup(
    conn: &Connection,
    provider_id: &str,
    scope: ReapScope,
    scan_start: ScanStart,
    sink: &dyn StatusSink,
    report: &mut SyncReport,
) {
    if !scope.movies {
        sink.warn("Skipping movie cleanup: movie phase did not succeed");
    }
    if !scope.series {
        sink.warn("Skipping series cleanup: series phase did not succeed");
    }

    match reaper::reap(conn, provider_id, scope, scan_start) {
        Ok(stats) => {
            sink.info(&format!(
                "{}: removed {} stale relations and {} orphaned entities",
                Phase::Cleanup,
                stats.relations(),
                stats.entities()
            ));
            report.reaped = stats;
            report.cleanup_outcome = PhaseOutcome::Succeeded;
        }
        Err(e) => {
            sink.error(&format!("{} phase failed, changes rolled back: {}", Phase::Cleanup, e));
            report.cleanup_outcome = PhaseOutcome::Failed(e.to_string());
        }
    }
}

/// Store the provider descriptor so relations can reference it.
pub(crate) fn ensure_provider(conn: &Connection, provider: &Provider) -> Result<(), SyncError> {
    operations::upsert_provider(conn, provider)?;
    Ok(())
}

/// Append the run to the sync log. A failure here does not fail the run.
pub(crate) fn record_sync_log(conn: &Connection, report: &SyncReport, source: &str) {
    let finished_at = chrono::Utc::now().timestamp_millis();
    if let Err(e) = operations::insert_sync_log(conn, &report.to_sync_log(source, finished_at)) {
        log::warn!(
            "Failed to record sync log for '{}': {}",
            report.provider_id,
            e
        );
    }
}

/// Delete a provider, its relations, and any entities left unreferenced.
pub fn remove_provider(conn: &Connection, provider_id: &str) -> Result<ReapStats, SyncError> {
    if operations::get_provider(conn, provider_id)?.is_none() {
        return Err(SyncError::UnknownProvider(provider_id.to_string()));
    }
    Ok(reaper::purge_provider(conn, provider_id)?)
}
