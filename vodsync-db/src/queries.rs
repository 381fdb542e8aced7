//! Read queries for the catalog database.
//!
//! Provides entity lookup, listing, search, relation inspection, and stats.

use rusqlite::{Connection, OptionalExtension, params};
use vodsync_catalog::types::*;

use crate::operations::{
    OperationError, entity_table, relation_entity_column, relation_table, row_to_provider,
};

const ENTITY_COLUMNS: &str = "id, provider_unique_id, name, year, description, logo,
     category_name, rating, created_at, updated_at";

fn row_to_entity(kind: EntityKind) -> impl Fn(&rusqlite::Row<'_>) -> rusqlite::Result<Entity> {
    move |row| {
        Ok(Entity {
            id: row.get(0)?,
            kind,
            provider_unique_id: row.get(1)?,
            name: row.get(2)?,
            year: row.get(3)?,
            description: row.get(4)?,
            logo: row.get(5)?,
            category_name: row.get(6)?,
            rating: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

// ── Entity Lookups ──────────────────────────────────────────────────────────

/// Fetch a movie or series by internal id.
pub fn get_entity(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
) -> Result<Option<Entity>, OperationError> {
    conn.query_row(
        &format!(
            "SELECT {ENTITY_COLUMNS} FROM {} WHERE id = ?1",
            entity_table(kind)
        ),
        params![id],
        row_to_entity(kind),
    )
    .optional()
    .map_err(Into::into)
}

/// Fetch a movie or series by its provider-unique id.
pub fn find_entity_by_unique_id(
    conn: &Connection,
    kind: EntityKind,
    provider_unique_id: &str,
) -> Result<Option<Entity>, OperationError> {
    conn.query_row(
        &format!(
            "SELECT {ENTITY_COLUMNS} FROM {} WHERE provider_unique_id = ?1",
            entity_table(kind)
        ),
        params![provider_unique_id],
        row_to_entity(kind),
    )
    .optional()
    .map_err(Into::into)
}

/// List entities, optionally restricted to one category name.
pub fn list_entities(
    conn: &Connection,
    kind: EntityKind,
    category: Option<&str>,
    limit: u32,
) -> Result<Vec<Entity>, OperationError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTITY_COLUMNS} FROM {}
         WHERE (?1 IS NULL OR category_name = ?1)
         ORDER BY name LIMIT ?2",
        entity_table(kind)
    ))?;
    let rows = stmt.query_map(params![category, limit], row_to_entity(kind))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Search entities by name (case-insensitive LIKE).
pub fn search_entities(
    conn: &Connection,
    kind: EntityKind,
    query: &str,
) -> Result<Vec<Entity>, OperationError> {
    let pattern = format!("%{}%", query);
    let mut stmt = conn.prepare(&format!(
        "SELECT {ENTITY_COLUMNS} FROM {} WHERE name LIKE ?1 ORDER BY name LIMIT 100",
        entity_table(kind)
    ))?;
    let rows = stmt.query_map(params![pattern], row_to_entity(kind))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Relation Lookups ────────────────────────────────────────────────────────

/// All provider relations pointing at one movie or series.
pub fn relations_for_entity(
    conn: &Connection,
    kind: EntityKind,
    entity_id: i64,
) -> Result<Vec<Relation>, OperationError> {
    let rel_kind = RelationKind::from(kind);
    let column = relation_entity_column(rel_kind);
    let mut stmt = conn.prepare(&format!(
        "SELECT provider_id, {column}, native_id, container, last_seen
         FROM {} WHERE {column} = ?1 ORDER BY provider_id, native_id",
        relation_table(rel_kind)
    ))?;
    let rows = stmt.query_map(params![entity_id], |row| {
        Ok(Relation {
            provider_id: row.get(0)?,
            entity_id: row.get(1)?,
            native_id: row.get(2)?,
            container: row.get(3)?,
            last_seen: row.get(4)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Find the relation a provider holds for a native id.
pub fn find_relation(
    conn: &Connection,
    kind: EntityKind,
    provider_id: &str,
    native_id: &str,
) -> Result<Option<Relation>, OperationError> {
    let rel_kind = RelationKind::from(kind);
    let column = relation_entity_column(rel_kind);
    conn.query_row(
        &format!(
            "SELECT provider_id, {column}, native_id, container, last_seen
             FROM {} WHERE provider_id = ?1 AND native_id = ?2",
            relation_table(rel_kind)
        ),
        params![provider_id, native_id],
        |row| {
            Ok(Relation {
                provider_id: row.get(0)?,
                entity_id: row.get(1)?,
                native_id: row.get(2)?,
                container: row.get(3)?,
                last_seen: row.get(4)?,
            })
        },
    )
    .optional()
    .map_err(Into::into)
}

/// Episodes of one series, across providers, in season/episode order.
pub fn episodes_for_series(
    conn: &Connection,
    series_id: i64,
) -> Result<Vec<EpisodeRelation>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT provider_id, series_id, native_id, season, episode_num, title, container, last_seen
         FROM provider_episode_relations WHERE series_id = ?1
         ORDER BY season, episode_num, title",
    )?;
    let rows = stmt.query_map(params![series_id], |row| {
        Ok(EpisodeRelation {
            provider_id: row.get(0)?,
            series_id: row.get(1)?,
            native_id: row.get(2)?,
            season: row.get(3)?,
            episode_num: row.get(4)?,
            title: row.get(5)?,
            container: row.get(6)?,
            last_seen: row.get(7)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Count one provider's relations of a kind.
pub fn count_relations(
    conn: &Connection,
    kind: RelationKind,
    provider_id: &str,
) -> Result<i64, OperationError> {
    let count = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE provider_id = ?1",
            relation_table(kind)
        ),
        params![provider_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Providers and Categories ────────────────────────────────────────────────

/// List all registered providers.
pub fn list_providers(conn: &Connection) -> Result<Vec<Provider>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, kind, base_url, username, password, created_at
         FROM providers ORDER BY id",
    )?;
    let rows = stmt.query_map([], row_to_provider)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Stored category names for one provider.
pub fn list_categories(
    conn: &Connection,
    provider_id: &str,
) -> Result<Vec<Category>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT id, name FROM categories WHERE provider_id = ?1 ORDER BY name",
    )?;
    let rows = stmt.query_map(params![provider_id], |row| {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Sync Log ────────────────────────────────────────────────────────────────

/// List sync log entries, newest first, optionally for one provider.
pub fn list_sync_logs(
    conn: &Connection,
    provider_id: Option<&str>,
    limit: u32,
) -> Result<Vec<SyncLog>, OperationError> {
    let mut stmt = conn.prepare(
        "SELECT id, provider_id, source, started_at, finished_at, outcome,
                movies_created, movies_updated, series_created, series_updated,
                rows_skipped, relations_reaped, entities_reaped
         FROM sync_log
         WHERE (?1 IS NULL OR provider_id = ?1)
         ORDER BY started_at DESC, id DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![provider_id, limit], |row| {
        Ok(SyncLog {
            id: row.get(0)?,
            provider_id: row.get(1)?,
            source: row.get(2)?,
            started_at: row.get(3)?,
            finished_at: row.get(4)?,
            outcome: row.get(5)?,
            movies_created: row.get(6)?,
            movies_updated: row.get(7)?,
            series_created: row.get(8)?,
            series_updated: row.get(9)?,
            rows_skipped: row.get(10)?,
            relations_reaped: row.get(11)?,
            entities_reaped: row.get(12)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

// ── Statistics ──────────────────────────────────────────────────────────────

/// Summary counts for the whole catalog.
#[derive(Debug, Default)]
pub struct CatalogStats {
    pub providers: i64,
    pub categories: i64,
    pub movies: i64,
    pub series: i64,
    pub movie_relations: i64,
    pub series_relations: i64,
    pub episode_relations: i64,
    pub syncs: i64,
}

/// Get summary statistics for the catalog.
pub fn catalog_stats(conn: &Connection) -> Result<CatalogStats, OperationError> {
    let count = |table: &str| -> Result<i64, OperationError> {
        let n = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
            row.get(0)
        })?;
        Ok(n)
    };

    Ok(CatalogStats {
        providers: count("providers")?,
        categories: count("categories")?,
        movies: count("movies")?,
        series: count("series")?,
        movie_relations: count("provider_movie_relations")?,
        series_relations: count("provider_series_relations")?,
        episode_relations: count("provider_episode_relations")?,
        syncs: count("sync_log")?,
    })
}
