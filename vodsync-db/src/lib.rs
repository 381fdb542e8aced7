//! SQLite persistence layer for the VOD catalog.
//!
//! Provides schema creation, write operations, and query APIs
//! backed by SQLite (via rusqlite with bundled feature).

pub mod operations;
pub mod queries;
pub mod schema;

pub use operations::{
    OperationError, delete_detached_episode_relations, delete_orphan_entities, delete_provider,
    delete_stale_relations, delete_stale_series_episodes, get_provider, insert_entity,
    insert_sync_log, load_entity_id_map, update_entity, upsert_category_if_absent,
    upsert_episode_relation, upsert_provider, upsert_relation,
};
pub use queries::{
    CatalogStats, catalog_stats, count_relations, episodes_for_series, find_entity_by_unique_id,
    find_relation, get_entity, list_categories, list_entities, list_providers, list_sync_logs,
    relations_for_entity, search_entities,
};
pub use rusqlite::Connection;
pub use schema::{SchemaError, add_column_if_missing, open_database, open_memory};
