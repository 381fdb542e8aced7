//! SQLite schema creation and migration.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Migration error: expected version {expected}, found {found}")]
    VersionMismatch { expected: i32, found: i32 },
}

/// Current schema version. Increment when adding migrations.
pub const CURRENT_VERSION: i32 = 2;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Create all tables and indexes if they don't exist.
///
/// This is idempotent — safe to call on an existing database.
pub fn create_schema(conn: &Connection) -> Result<(), SchemaError> {
    conn.execute_batch(SCHEMA_SQL)?;
    set_schema_version(conn, CURRENT_VERSION)?;
    Ok(())
}

/// Open or create a catalog database at the given path.
///
/// Concurrent syncs for different providers each open their own connection;
/// WAL plus a busy timeout lets their write transactions queue instead of
/// failing immediately.
pub fn open_database(path: &std::path::Path) -> Result<Connection, SchemaError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    conn.execute_batch(&format!(
        "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout={BUSY_TIMEOUT_MS};"
    ))?;

    let version = get_schema_version(&conn)?;
    if version == 0 {
        create_schema(&conn)?;
    } else if version != CURRENT_VERSION {
        migrate(&conn, version)?;
    }

    Ok(conn)
}

/// Open an in-memory database with the full schema. Useful for testing.
pub fn open_memory() -> Result<Connection, SchemaError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Get the current schema version, or 0 if no schema exists.
pub fn get_schema_version(conn: &Connection) -> Result<i32, SchemaError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Record a schema version.
fn set_schema_version(conn: &Connection, version: i32) -> Result<(), SchemaError> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Run migrations from `from_version` up to `CURRENT_VERSION`.
fn migrate(conn: &Connection, from_version: i32) -> Result<(), SchemaError> {
    if from_version > CURRENT_VERSION {
        return Err(SchemaError::VersionMismatch {
            expected: CURRENT_VERSION,
            found: from_version,
        });
    }

    let mut version = from_version;
    while version < CURRENT_VERSION {
        if version == 1 {
            add_column_if_missing(conn, "movies", "rating REAL")?;
            add_column_if_missing(conn, "series", "rating REAL")?;
        }
        version += 1;
        set_schema_version(conn, version)?;
        log::debug!("Catalog schema migrated to version {version}");
    }

    Ok(())
}

/// Add a column, treating "duplicate column name" as already applied.
///
/// Returns `true` if the column was added. A migration interrupted after the
/// `ALTER TABLE` but before the version bump re-runs cleanly through this.
pub fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column_def: &str,
) -> Result<bool, SchemaError> {
    match conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column_def};")) {
        Ok(()) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(_, Some(msg)))
            if msg.contains("duplicate column name") =>
        {
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

const SCHEMA_SQL: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Registered content providers
CREATE TABLE IF NOT EXISTS providers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    kind TEXT NOT NULL,
    base_url TEXT NOT NULL,
    username TEXT,
    password TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Provider category names, keyed by provider-native id
CREATE TABLE IF NOT EXISTS categories (
    provider_id TEXT NOT NULL REFERENCES providers(id) ON DELETE CASCADE,
    id TEXT NOT NULL,
    name TEXT NOT NULL,
    PRIMARY KEY (provider_id, id)
);

-- Catalog entities
CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    provider_unique_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    year INTEGER,
    description TEXT,
    logo TEXT,
    category_name TEXT NOT NULL,
    rating REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_movies_category ON movies(category_name);

CREATE TABLE IF NOT EXISTS series (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    provider_unique_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    year INTEGER,
    description TEXT,
    logo TEXT,
    category_name TEXT NOT NULL,
    rating REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_series_category ON series(category_name);

-- Provider → entity links. No cascade on the entity side: an entity is
-- only deleted once nothing references it.
CREATE TABLE IF NOT EXISTS provider_movie_relations (
    provider_id TEXT NOT NULL REFERENCES providers(id) ON DELETE CASCADE,
    movie_id INTEGER NOT NULL REFERENCES movies(id),
    native_id TEXT NOT NULL,
    container TEXT NOT NULL,
    last_seen INTEGER NOT NULL,
    PRIMARY KEY (provider_id, native_id)
);
CREATE INDEX IF NOT EXISTS idx_movie_rel_entity ON provider_movie_relations(movie_id);
CREATE INDEX IF NOT EXISTS idx_movie_rel_seen ON provider_movie_relations(provider_id, last_seen);

CREATE TABLE IF NOT EXISTS provider_series_relations (
    provider_id TEXT NOT NULL REFERENCES providers(id) ON DELETE CASCADE,
    series_id INTEGER NOT NULL REFERENCES series(id),
    native_id TEXT NOT NULL,
    container TEXT NOT NULL,
    last_seen INTEGER NOT NULL,
    PRIMARY KEY (provider_id, native_id)
);
CREATE INDEX IF NOT EXISTS idx_series_rel_entity ON provider_series_relations(series_id);
CREATE INDEX IF NOT EXISTS idx_series_rel_seen ON provider_series_relations(provider_id, last_seen);

CREATE TABLE IF NOT EXISTS provider_episode_relations (
    provider_id TEXT NOT NULL REFERENCES providers(id) ON DELETE CASCADE,
    series_id INTEGER NOT NULL REFERENCES series(id),
    native_id TEXT NOT NULL,
    season INTEGER,
    episode_num INTEGER,
    title TEXT NOT NULL,
    container TEXT NOT NULL,
    last_seen INTEGER NOT NULL,
    PRIMARY KEY (provider_id, native_id)
);
CREATE INDEX IF NOT EXISTS idx_episode_rel_entity ON provider_episode_relations(series_id);
CREATE INDEX IF NOT EXISTS idx_episode_rel_seen ON provider_episode_relations(provider_id, last_seen);

-- Sync tracking
CREATE TABLE IF NOT EXISTS sync_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    provider_id TEXT NOT NULL,
    source TEXT NOT NULL,
    started_at INTEGER NOT NULL,
    finished_at INTEGER NOT NULL,
    outcome TEXT NOT NULL,
    movies_created INTEGER DEFAULT 0,
    movies_updated INTEGER DEFAULT 0,
    series_created INTEGER DEFAULT 0,
    series_updated INTEGER DEFAULT 0,
    rows_skipped INTEGER DEFAULT 0,
    relations_reaped INTEGER DEFAULT 0,
    entities_reaped INTEGER DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_sync_log_provider ON sync_log(provider_id, started_at);
"#;
