//! Reconcile provider feeds and playlists into the VOD catalog database.
//!
//! This crate owns the sync logic: category merging, entity upserts with
//! stable identity, relation watermarks, stale relation reaping, and orphan
//! collection.

pub mod categories;
pub mod episodes;
pub mod error;
pub mod orchestrator;
pub mod playlist_import;
pub mod reaper;
pub mod status;
pub mod upsert;

pub use categories::{CategoryMap, persist_categories, sync_categories};
pub use episodes::{EpisodeRefreshStats, refresh_series_episodes, refresh_series_episodes_at};
pub use error::{PhaseError, StoreError, SyncError};
pub use orchestrator::{
    Phase, PhaseOutcome, SyncReport, remove_provider, sync_provider, sync_provider_at,
};
pub use playlist_import::{ingest_playlist, ingest_playlist_at};
pub use reaper::{EpisodeReap, ReapScope, ReapStats, reap};
pub use status::{LogSink, Severity, SilentSink, StatusEvent, StatusSink};
pub use upsert::{EntityUpserter, FeedRow, RelationTracker, UpsertStats, upsert_feed};

use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Begin a write transaction holding the write lock from the start, so a
/// concurrent writer's commit is waited out on the busy timeout.
pub(crate) fn begin_write(conn: &Connection) -> rusqlite::Result<Transaction<'_>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
}
