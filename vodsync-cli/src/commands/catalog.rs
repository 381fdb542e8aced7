//! Read-only catalog views: stats, listing, search, sync history.

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use vodsync_catalog::types::{Entity, EntityKind};
use vodsync_provider::Settings;

use crate::CliError;
use crate::cli_types::KindArg;

use super::{format_millis, open_catalog, truncate_str};

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movies => EntityKind::Movie,
            KindArg::Series => EntityKind::Series,
        }
    }
}

pub(crate) fn run_stats(settings: &Settings) -> Result<(), CliError> {
    let db_path = &settings.db_path;
    if !db_path.exists() {
        log::warn!("No catalog database found at {}", db_path.display());
        log::info!("Run 'vodsync sync --all' to create one.");
        return Ok(());
    }

    let conn = open_catalog(settings)?;
    let stats = vodsync_db::catalog_stats(&conn)
        .map_err(|e| CliError::database(format!("Failed to query catalog stats: {}", e)))?;

    log::info!(
        "{}",
        "Catalog Database Statistics".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("  Database: {}", db_path.display());
    crate::log_blank();
    log::info!("  Providers:          {:>8}", stats.providers);
    log::info!("  Categories:         {:>8}", stats.categories);
    log::info!("  Movies:             {:>8}", stats.movies);
    log::info!("  Series:             {:>8}", stats.series);
    log::info!("  Movie relations:    {:>8}", stats.movie_relations);
    log::info!("  Series relations:   {:>8}", stats.series_relations);
    log::info!("  Episode relations:  {:>8}", stats.episode_relations);
    log::info!("  Sync runs:          {:>8}", stats.syncs);

    Ok(())
}

fn print_entity(entity: &Entity) {
    let year = entity
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".to_string());
    log::info!(
        "  {:>6}  {}  {:<48} {}",
        entity.id,
        year.if_supports_color(Stdout, |t| t.dimmed()),
        truncate_str(&entity.name, 48),
        entity.category_name.if_supports_color(Stdout, |t| t.cyan()),
    );
}

pub(crate) fn run_list(
    settings: &Settings,
    kind: KindArg,
    category: Option<&str>,
    limit: u32,
) -> Result<(), CliError> {
    let kind = EntityKind::from(kind);
    let conn = open_catalog(settings)?;
    let entities = vodsync_db::list_entities(&conn, kind, category, limit)
        .map_err(|e| CliError::database(format!("Failed to list {}: {}", kind.plural(), e)))?;

    if entities.is_empty() {
        log::info!("No {} found.", kind.plural());
        return Ok(());
    }
    for entity in &entities {
        print_entity(entity);
    }
    Ok(())
}

pub(crate) fn run_search(
    settings: &Settings,
    query: &str,
    kind: Option<KindArg>,
) -> Result<(), CliError> {
    let conn = open_catalog(settings)?;
    let kinds: Vec<EntityKind> = match kind {
        Some(k) => vec![k.into()],
        None => vec![EntityKind::Movie, EntityKind::Series],
    };

    let mut found = 0;
    for kind in kinds {
        let entities = vodsync_db::search_entities(&conn, kind, query)
            .map_err(|e| CliError::database(format!("Search failed: {}", e)))?;
        if entities.is_empty() {
            continue;
        }
        log::info!(
            "{}",
            kind.plural()
                .to_uppercase()
                .if_supports_color(Stdout, |t| t.bold())
        );
        for entity in &entities {
            print_entity(entity);
        }
        found += entities.len();
    }

    if found == 0 {
        log::info!("Nothing matches '{}'.", query);
    }
    Ok(())
}

pub(crate) fn run_history(
    settings: &Settings,
    provider: Option<&str>,
    limit: u32,
) -> Result<(), CliError> {
    let conn = open_catalog(settings)?;
    let logs = vodsync_db::list_sync_logs(&conn, provider, limit)
        .map_err(|e| CliError::database(format!("Failed to read sync history: {}", e)))?;

    if logs.is_empty() {
        log::info!("No sync runs recorded.");
        return Ok(());
    }

    for entry in &logs {
        let outcome = match entry.outcome.as_str() {
            "ok" => entry
                .outcome
                .if_supports_color(Stdout, |t| t.green())
                .to_string(),
            "partial" => entry
                .outcome
                .if_supports_color(Stdout, |t| t.yellow())
                .to_string(),
            _ => entry
                .outcome
                .if_supports_color(Stdout, |t| t.red())
                .to_string(),
        };
        let secs = (entry.finished_at - entry.started_at) as f64 / 1000.0;
        log::info!(
            "  {}  {:<16} {:<8} {:<8} {:>6.1}s  movies +{}/~{}  series +{}/~{}  reaped {}/{}",
            format_millis(entry.started_at),
            entry.provider_id,
            entry.source,
            outcome,
            secs,
            entry.movies_created,
            entry.movies_updated,
            entry.series_created,
            entry.series_updated,
            entry.relations_reaped,
            entry.entities_reaped,
        );
    }
    Ok(())
}
