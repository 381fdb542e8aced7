//! Shared application settings (catalog path, HTTP behaviour).
//!
//! Settings live in `~/.config/vodsync/settings.toml`. Environment variables
//! override the file, and the file overrides built-in defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_USER_AGENT: &str = concat!("vodsync/", env!("CARGO_PKG_VERSION"));

/// Canonical path to the settings file: `~/.config/vodsync/settings.toml`.
pub fn settings_path() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("vodsync").join("settings.toml")
}

/// Default catalog location: `~/.local/share/vodsync/catalog.db` (platform equivalent).
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("vodsync")
        .join("catalog.db")
}

/// Where a setting's effective value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingSource {
    EnvVar(&'static str),
    ConfigFile,
    Default,
}

impl std::fmt::Display for SettingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvVar(var) => write!(f, "env ${}", var),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// HTTP client behaviour for provider fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Effective settings after merging env, file, and defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    pub db_path_source: SettingSource,
    pub http: HttpSettings,
    pub timeout_source: SettingSource,
}

/// TOML file format.
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    store: Option<StoreSection>,
    #[serde(default)]
    http: Option<HttpSection>,
}

#[derive(Debug, Default, Deserialize)]
struct StoreSection {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct HttpSection {
    timeout_secs: Option<u64>,
    user_agent: Option<String>,
}

impl Settings {
    /// Load settings from the default settings file.
    pub fn load() -> Self {
        Self::load_from(&settings_path())
    }

    /// Load settings from a specific file. A missing or unreadable file
    /// falls back to defaults with a warning.
    pub fn load_from(path: &Path) -> Self {
        let file = read_settings_file(path);
        Self::resolve(file, |var| std::env::var(var).ok())
    }

    fn resolve(file: SettingsFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let file_db = file.store.and_then(|s| s.path);
        let (db_path, db_path_source) = if let Some(p) = env("VODSYNC_DB") {
            (PathBuf::from(p), SettingSource::EnvVar("VODSYNC_DB"))
        } else if let Some(p) = file_db {
            (p, SettingSource::ConfigFile)
        } else {
            (default_db_path(), SettingSource::Default)
        };

        let http_file = file.http.unwrap_or_default();
        let env_timeout = env("VODSYNC_HTTP_TIMEOUT").and_then(|v| match v.trim().parse() {
            Ok(secs) => Some(secs),
            Err(_) => {
                log::warn!("Ignoring invalid VODSYNC_HTTP_TIMEOUT value '{v}'");
                None
            }
        });
        let (timeout_secs, timeout_source) = if let Some(secs) = env_timeout {
            (secs, SettingSource::EnvVar("VODSYNC_HTTP_TIMEOUT"))
        } else if let Some(secs) = http_file.timeout_secs {
            (secs, SettingSource::ConfigFile)
        } else {
            (DEFAULT_TIMEOUT_SECS, SettingSource::Default)
        };

        Self {
            db_path,
            db_path_source,
            http: HttpSettings {
                timeout_secs,
                user_agent: http_file
                    .user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            },
            timeout_source,
        }
    }
}

fn read_settings_file(path: &Path) -> SettingsFile {
    let Ok(contents) = std::fs::read_to_string(path) else {
        return SettingsFile::default();
    };
    match toml::from_str(&contents) {
        Ok(file) => file,
        Err(e) => {
            log::warn!("Ignoring malformed settings file {}: {}", path.display(), e);
            SettingsFile::default()
        }
    }
}
