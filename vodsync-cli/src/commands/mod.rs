pub(crate) mod catalog;
pub(crate) mod config;
pub(crate) mod episodes;
pub(crate) mod playlist;
pub(crate) mod provider;
pub(crate) mod sync;

use std::path::Path;

use vodsync_catalog::types::Provider;
use vodsync_db::Connection;
use vodsync_provider::Settings;

use crate::CliError;

/// Open (creating if needed) the catalog database.
pub(crate) fn open_catalog(settings: &Settings) -> Result<Connection, CliError> {
    open_catalog_at(&settings.db_path)
}

pub(crate) fn open_catalog_at(path: &Path) -> Result<Connection, CliError> {
    vodsync_db::open_database(path).map_err(|e| {
        CliError::database(format!(
            "Failed to open catalog database at {}: {}",
            path.display(),
            e
        ))
    })
}

/// Look up a registered provider or fail with a helpful error.
pub(crate) fn load_provider(conn: &Connection, id: &str) -> Result<Provider, CliError> {
    vodsync_db::get_provider(conn, id)
        .map_err(|e| CliError::database(format!("Failed to look up provider: {}", e)))?
        .ok_or_else(|| CliError::UnknownProvider(id.to_string()))
}

/// Truncate a string to a maximum width, appending "..." if needed.
pub(crate) fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max > 3 {
        let kept: String = s.chars().take(max - 3).collect();
        format!("{}...", kept)
    } else {
        s.chars().take(max).collect()
    }
}

/// Render epoch milliseconds as local time.
pub(crate) fn format_millis(millis: i64) -> String {
    match chrono::DateTime::from_timestamp_millis(millis) {
        Some(utc) => utc
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => millis.to_string(),
    }
}
