//! `vodsync sync`: run reconciliation for one or all providers.
//!
//! Every provider syncs on its own blocking task with its own database
//! connection. Status events flow back over channels to the spinner pool.

use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use tokio::sync::mpsc;
use vodsync_catalog::types::{Provider, ProviderKind};
use vodsync_import::{PhaseOutcome, Severity, StatusEvent, StatusSink, SyncReport};
use vodsync_provider::{HttpSettings, Settings, XtreamClient, fetch_playlist};

use crate::CliError;
use crate::spinner::SpinnerPool;

use super::{load_provider, open_catalog, open_catalog_at};

const MAX_SPINNERS: usize = 8;

pub(crate) fn run_sync(
    settings: &Settings,
    provider: Option<String>,
    all: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let providers = {
        let conn = open_catalog(settings)?;
        match provider {
            Some(id) if !all => vec![load_provider(&conn, &id)?],
            _ => vodsync_db::list_providers(&conn)
                .map_err(|e| CliError::database(format!("Failed to list providers: {}", e)))?,
        }
    };

    if providers.is_empty() {
        log::info!("No providers registered.");
        return Ok(());
    }

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::runtime(format!("Failed to create async runtime: {}", e)))?;
    let total = providers.len();
    let results = rt.block_on(sync_concurrently(
        &settings.db_path,
        &settings.http,
        providers,
        quiet,
    ));

    crate::log_blank();
    let mut failed = 0;
    for (provider, result) in &results {
        match result {
            Ok(report) => print_report(report),
            Err(e) => {
                failed += 1;
                log::error!(
                    "{} {}: {}",
                    "\u{2717}".if_supports_color(Stdout, |t| t.red()),
                    provider.id,
                    e
                );
            }
        }
    }

    if failed > 0 {
        return Err(CliError::other(format!(
            "{} of {} providers failed to sync",
            failed, total
        )));
    }
    Ok(())
}

async fn sync_concurrently(
    db_path: &Path,
    http: &HttpSettings,
    providers: Vec<Provider>,
    quiet: bool,
) -> Vec<(Provider, Result<SyncReport, CliError>)> {
    let (merged_tx, mut merged_rx) = mpsc::unbounded_channel::<(usize, Option<StatusEvent>)>();
    let mut pool = SpinnerPool::new(providers.len().min(MAX_SPINNERS), quiet);
    let mut handles = Vec::with_capacity(providers.len());

    for (key, provider) in providers.iter().enumerate() {
        pool.claim(key, &provider.id, "starting".to_string());

        let (tx, mut rx) = mpsc::unbounded_channel::<StatusEvent>();
        let forward = merged_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let _ = forward.send((key, Some(event)));
            }
            let _ = forward.send((key, None));
        });

        let db_path: PathBuf = db_path.to_path_buf();
        let http = http.clone();
        let provider = provider.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            sync_one(&db_path, &provider, &http, &tx)
        }));
    }
    drop(merged_tx);

    while let Some((key, event)) = merged_rx.recv().await {
        let id = &providers[key].id;
        match event {
            Some(StatusEvent { message, severity }) => match severity {
                Severity::Info => pool.update(key, message),
                Severity::Warning => pool.suspend(|| log::warn!("[{}] {}", id, message)),
                Severity::Error => pool.suspend(|| log::error!("[{}] {}", id, message)),
            },
            None => pool.release(key),
        }
    }
    pool.clear_all();

    let joined = futures::future::join_all(handles).await;
    providers
        .into_iter()
        .zip(joined)
        .map(|(provider, joined)| {
            let result = joined
                .map_err(|e| CliError::runtime(format!("Sync task failed: {}", e)))
                .and_then(|r| r);
            (provider, result)
        })
        .collect()
}

/// Sync one provider on the current thread.
fn sync_one(
    db_path: &Path,
    provider: &Provider,
    http: &HttpSettings,
    sink: &dyn StatusSink,
) -> Result<SyncReport, CliError> {
    let conn = open_catalog_at(db_path)?;
    match provider.kind {
        ProviderKind::Xtream => {
            let client = XtreamClient::new(provider, http)?;
            Ok(vodsync_import::sync_provider(&conn, provider, &client, sink)?)
        }
        ProviderKind::M3u => {
            sink.info("Downloading playlist");
            let text = fetch_playlist(provider, http)?;
            Ok(vodsync_import::ingest_playlist(&conn, provider, &text, sink)?)
        }
    }
}

fn outcome_str(outcome: &PhaseOutcome) -> String {
    match outcome {
        PhaseOutcome::Succeeded => "ok"
            .if_supports_color(Stdout, |t| t.green())
            .to_string(),
        PhaseOutcome::Failed(_) => "failed"
            .if_supports_color(Stdout, |t| t.red())
            .to_string(),
        PhaseOutcome::NotRun => "-".if_supports_color(Stdout, |t| t.dimmed()).to_string(),
    }
}

/// Print a per-phase summary of one run.
pub(crate) fn print_report(report: &SyncReport) {
    let mark = if report.is_complete() {
        "\u{2713}".if_supports_color(Stdout, |t| t.green()).to_string()
    } else {
        "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()).to_string()
    };
    log::info!(
        "{} {}",
        mark,
        report.provider_id.if_supports_color(Stdout, |t| t.bold()),
    );

    for (label, outcome, stats) in [
        ("Movies", &report.movies_outcome, &report.movies),
        ("Series", &report.series_outcome, &report.series),
    ] {
        log::info!(
            "  {:<8} {:<6} {:>6} new {:>6} updated {:>6} unchanged {:>4} skipped",
            label,
            outcome_str(outcome),
            stats.created,
            stats.updated,
            stats.unchanged,
            stats.skipped,
        );
    }
    log::info!(
        "  {:<8} {:<6} {:>6} relations and {} entities removed",
        "Cleanup",
        outcome_str(&report.cleanup_outcome),
        report.reaped.relations(),
        report.reaped.entities(),
    );

    for (label, outcome) in [
        ("movies", &report.movies_outcome),
        ("series", &report.series_outcome),
        ("cleanup", &report.cleanup_outcome),
    ] {
        if let PhaseOutcome::Failed(reason) = outcome {
            log::warn!("  {} failed: {}", label, reason);
        }
    }
}
