use vodsync_db::schema::{CURRENT_VERSION, add_column_if_missing, create_schema, get_schema_version};
use vodsync_db::{open_database, open_memory};

#[test]
fn create_schema_in_memory() {
    let conn = open_memory().unwrap();
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(version, CURRENT_VERSION);
}

#[test]
fn schema_is_idempotent() {
    let conn = open_memory().unwrap();
    // Creating again should not error
    create_schema(&conn).unwrap();
}

#[test]
fn foreign_keys_enabled() {
    let conn = open_memory().unwrap();
    let fk: i32 = conn
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    assert_eq!(fk, 1);
}

#[test]
fn all_tables_exist() {
    let conn = open_memory().unwrap();
    let tables = [
        "schema_version",
        "providers",
        "categories",
        "movies",
        "series",
        "provider_movie_relations",
        "provider_series_relations",
        "provider_episode_relations",
        "sync_log",
    ];
    for table in tables {
        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert!(exists, "table '{}' should exist", table);
    }
}

#[test]
fn duplicate_column_is_suppressed() {
    let conn = open_memory().unwrap();
    // rating already exists in the current schema
    assert!(!add_column_if_missing(&conn, "movies", "rating REAL").unwrap());
    assert!(add_column_if_missing(&conn, "movies", "trailer TEXT").unwrap());
}

#[test]
fn other_alter_errors_propagate() {
    let conn = open_memory().unwrap();
    assert!(add_column_if_missing(&conn, "no_such_table", "x TEXT").is_err());
}

const V1_SQL: &str = r#"
CREATE TABLE schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
INSERT INTO schema_version (version) VALUES (1);
CREATE TABLE movies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    provider_unique_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    year INTEGER,
    description TEXT,
    logo TEXT,
    category_name TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
CREATE TABLE series (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    provider_unique_id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    year INTEGER,
    description TEXT,
    logo TEXT,
    category_name TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

fn has_column(conn: &rusqlite::Connection, table: &str, column: &str) -> bool {
    let mut stmt = conn
        .prepare(&format!("SELECT name FROM pragma_table_info('{table}')"))
        .unwrap();
    let names: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    names.iter().any(|n| n == column)
}

#[test]
fn migrates_v1_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(V1_SQL).unwrap();
    }

    let conn = open_database(&path).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
    assert!(has_column(&conn, "movies", "rating"));
    assert!(has_column(&conn, "series", "rating"));
}

#[test]
fn migration_tolerates_partially_applied_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(V1_SQL).unwrap();
        // Column added but version never bumped
        conn.execute_batch("ALTER TABLE movies ADD COLUMN rating REAL;")
            .unwrap();
    }

    let conn = open_database(&path).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
    assert!(has_column(&conn, "series", "rating"));
}

#[test]
fn reopening_current_database_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("catalog.db");
    drop(open_database(&path).unwrap());
    let conn = open_database(&path).unwrap();
    assert_eq!(get_schema_version(&conn).unwrap(), CURRENT_VERSION);
}
