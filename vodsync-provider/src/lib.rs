//! Provider access: credentials, settings, feed row types, and the HTTP client.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod types;

pub use client::{ProviderClient, XtreamClient, fetch_playlist};
pub use config::{HttpSettings, SettingSource, Settings, default_db_path, settings_path};
pub use credentials::{Credentials, validate_provider_id};
pub use error::{CredentialError, ProviderError};
pub use types::{CategoryRow, EpisodeFeedRow, MovieFeedRow, SeriesFeedRow, SeriesInfoResponse};
