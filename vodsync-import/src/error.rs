//! Error types for the sync phases and the runs that drive them.

use thiserror::Error;
use vodsync_db::OperationError;
use vodsync_provider::{CredentialError, ProviderError};

/// A catalog write failed. The enclosing phase transaction is rolled back.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] OperationError),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Why a single sync phase failed.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("{0}")]
    Provider(#[from] ProviderError),
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl From<OperationError> for PhaseError {
    fn from(e: OperationError) -> Self {
        Self::Store(e.into())
    }
}

impl From<rusqlite::Error> for PhaseError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.into())
    }
}

/// Errors that end a sync run (or a standalone operation) early.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("Category sync failed, run aborted: {0}")]
    Categories(PhaseError),

    #[error("Provider '{provider}' is a {actual} provider, expected {expected}")]
    WrongKind {
        provider: String,
        actual: &'static str,
        expected: &'static str,
    },

    #[error("Provider not found: {0}")]
    UnknownProvider(String),

    #[error("Provider '{provider}' has no series '{series}'")]
    UnknownSeries { provider: String, series: String },

    #[error("Feed error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<OperationError> for SyncError {
    fn from(e: OperationError) -> Self {
        Self::Store(e.into())
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e.into())
    }
}
