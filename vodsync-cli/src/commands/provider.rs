use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use vodsync_catalog::types::{Provider, ProviderKind};
use vodsync_provider::{Credentials, Settings};

use crate::CliError;
use crate::cli_types::ProviderKindArg;

use super::{open_catalog, truncate_str};

/// Register a provider, or update the descriptor of an existing one.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_provider_add(
    settings: &Settings,
    id: String,
    url: String,
    kind: ProviderKindArg,
    name: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> Result<(), CliError> {
    let provider = Provider {
        name: name.unwrap_or_else(|| id.clone()),
        id,
        kind: match kind {
            ProviderKindArg::Xtream => ProviderKind::Xtream,
            ProviderKindArg::M3u => ProviderKind::M3u,
        },
        base_url: url,
        username,
        password,
        created_at: String::new(),
    };
    // Reject incomplete descriptors before saving.
    Credentials::from_provider(&provider).map_err(vodsync_provider::ProviderError::from)?;

    let conn = open_catalog(settings)?;
    vodsync_db::upsert_provider(&conn, &provider)
        .map_err(|e| CliError::database(format!("Failed to save provider: {}", e)))?;

    log::info!(
        "{} provider '{}' ({})",
        "Saved".if_supports_color(Stdout, |t| t.green()),
        provider.id,
        provider.kind.as_str(),
    );
    Ok(())
}

pub(crate) fn run_provider_list(settings: &Settings) -> Result<(), CliError> {
    let conn = open_catalog(settings)?;
    let providers = vodsync_db::list_providers(&conn)
        .map_err(|e| CliError::database(format!("Failed to list providers: {}", e)))?;

    if providers.is_empty() {
        log::info!("No providers registered.");
        log::info!("Run 'vodsync provider add <id> --url <url>' to add one.");
        return Ok(());
    }

    log::info!(
        "{}",
        format!("{:<16} {:<7} {:<24} {}", "ID", "KIND", "NAME", "URL")
            .if_supports_color(Stdout, |t| t.bold()),
    );
    for p in &providers {
        log::info!(
            "{:<16} {:<7} {:<24} {}",
            p.id,
            p.kind.as_str(),
            truncate_str(&p.name, 24),
            p.base_url,
        );
    }
    Ok(())
}

pub(crate) fn run_provider_remove(settings: &Settings, id: &str) -> Result<(), CliError> {
    let conn = open_catalog(settings)?;
    let stats = vodsync_import::remove_provider(&conn, id)?;
    log::info!(
        "{} provider '{}'; {} movies and {} series no longer referenced were deleted",
        "Removed".if_supports_color(Stdout, |t| t.green()),
        id,
        stats.movies,
        stats.series,
    );
    Ok(())
}
