use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use vodsync_catalog::types::EntityKind;
use vodsync_import::LogSink;
use vodsync_provider::{Settings, XtreamClient};

use crate::CliError;

use super::{load_provider, open_catalog, truncate_str};

/// Refresh one series' episodes and print the stored list.
pub(crate) fn run_episodes(
    settings: &Settings,
    provider_id: &str,
    series_native_id: &str,
) -> Result<(), CliError> {
    let conn = open_catalog(settings)?;
    let provider = load_provider(&conn, provider_id)?;
    let client = XtreamClient::new(&provider, &settings.http)?;

    let stats = vodsync_import::refresh_series_episodes(
        &conn,
        provider_id,
        series_native_id,
        &client,
        &LogSink,
    )?;
    if stats.skipped > 0 {
        log::warn!("Skipped {} episodes without an id", stats.skipped);
    }

    let relation = vodsync_db::find_relation(&conn, EntityKind::Series, provider_id, series_native_id)
        .map_err(|e| CliError::database(format!("Failed to look up series: {}", e)))?;
    let Some(relation) = relation else {
        return Ok(());
    };
    let episodes = vodsync_db::episodes_for_series(&conn, relation.entity_id)
        .map_err(|e| CliError::database(format!("Failed to list episodes: {}", e)))?;

    crate::log_blank();
    for ep in episodes.iter().filter(|e| e.provider_id == provider_id) {
        let marker = match (ep.season, ep.episode_num) {
            (Some(s), Some(e)) => format!("S{:02}E{:02}", s, e),
            _ => "      ".to_string(),
        };
        log::info!(
            "  {} {:<50} {} {}",
            marker.if_supports_color(Stdout, |t| t.cyan()),
            truncate_str(&ep.title, 50),
            ep.container.if_supports_color(Stdout, |t| t.dimmed()),
            ep.native_id.if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    Ok(())
}
