use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use vodsync_import::LogSink;
use vodsync_provider::Settings;

use crate::CliError;

use super::{load_provider, open_catalog};

/// Ingest a provider's playlist, from its URL or a local file.
pub(crate) fn run_playlist(
    settings: &Settings,
    provider_id: &str,
    file: Option<PathBuf>,
) -> Result<(), CliError> {
    let conn = open_catalog(settings)?;
    let provider = load_provider(&conn, provider_id)?;

    let text = match file {
        Some(path) => {
            log::info!("Reading playlist from {}", path.display());
            std::fs::read_to_string(&path)?
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("  {spinner:.cyan} {msg}")
                    .expect("static pattern")
                    .tick_chars("/-\\|"),
            );
            pb.set_message(format!("Downloading playlist for '{}'", provider.id));
            pb.enable_steady_tick(std::time::Duration::from_millis(100));
            let text = vodsync_provider::fetch_playlist(&provider, &settings.http);
            pb.finish_and_clear();
            text?
        }
    };

    let report = vodsync_import::ingest_playlist(&conn, &provider, &text, &LogSink)?;
    crate::log_blank();
    super::sync::print_report(&report);
    Ok(())
}
