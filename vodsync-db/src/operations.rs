//! Write operations for providers, categories, entities, and relations.
//!
//! Per-row writes go through `prepare_cached`, so a sync phase that loops over
//! thousands of feed rows inside one transaction compiles each statement once.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use vodsync_catalog::name_parser::provider_unique_id;
use vodsync_catalog::types::*;

#[derive(Debug, Error)]
pub enum OperationError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Entity not found: {entity_type} with id '{id}'")]
    NotFound { entity_type: String, id: String },
}

impl OperationError {
    fn not_found(entity_type: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }
}

// ── Table mapping ───────────────────────────────────────────────────────────

pub(crate) fn entity_table(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Movie => "movies",
        EntityKind::Series => "series",
    }
}

pub(crate) fn relation_table(kind: RelationKind) -> &'static str {
    match kind {
        RelationKind::Movie => "provider_movie_relations",
        RelationKind::Series => "provider_series_relations",
        RelationKind::Episode => "provider_episode_relations",
    }
}

pub(crate) fn relation_entity_column(kind: RelationKind) -> &'static str {
    match kind {
        RelationKind::Movie => "movie_id",
        RelationKind::Series | RelationKind::Episode => "series_id",
    }
}

// ── Provider Operations ─────────────────────────────────────────────────────

/// Insert or update a provider descriptor.
pub fn upsert_provider(conn: &Connection, provider: &Provider) -> Result<(), OperationError> {
    conn.execute(
        "INSERT INTO providers (id, name, kind, base_url, username, password)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
             name = excluded.name,
             kind = excluded.kind,
             base_url = excluded.base_url,
             username = excluded.username,
             password = excluded.password",
        params![
            provider.id,
            provider.name,
            provider.kind.as_str(),
            provider.base_url,
            provider.username,
            provider.password,
        ],
    )?;
    Ok(())
}

/// Look up a provider by id.
pub fn get_provider(conn: &Connection, id: &str) -> Result<Option<Provider>, OperationError> {
    conn.query_row(
        "SELECT id, name, kind, base_url, username, password, created_at
         FROM providers WHERE id = ?1",
        params![id],
        row_to_provider,
    )
    .optional()
    .map_err(Into::into)
}

pub(crate) fn row_to_provider(row: &rusqlite::Row<'_>) -> rusqlite::Result<Provider> {
    let kind: String = row.get(2)?;
    Ok(Provider {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: ProviderKind::from_str_loose(&kind).unwrap_or(ProviderKind::Xtream),
        base_url: row.get(3)?,
        username: row.get(4)?,
        password: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Delete a provider. Its categories and relations cascade; entities they
/// referenced are left for `delete_orphan_entities`.
pub fn delete_provider(conn: &Connection, id: &str) -> Result<(), OperationError> {
    let changed = conn.execute("DELETE FROM providers WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(OperationError::not_found("provider", id));
    }
    Ok(())
}

// ── Category Operations ─────────────────────────────────────────────────────

/// Store a category name unless this provider already has one for the id.
///
/// Returns `true` if a row was inserted. Existing names are never overwritten.
pub fn upsert_category_if_absent(
    conn: &Connection,
    provider_id: &str,
    category: &Category,
) -> Result<bool, OperationError> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO categories (provider_id, id, name) VALUES (?1, ?2, ?3)",
    )?;
    let inserted = stmt.execute(params![provider_id, category.id, category.name])?;
    Ok(inserted > 0)
}

// ── Entity Operations ───────────────────────────────────────────────────────

/// Load every `provider_unique_id → internal id` pair for one provider and kind.
///
/// Provider-unique ids share the `"{kind}:{provider}:"` prefix, so this is a
/// single index range scan rather than one lookup per feed row.
pub fn load_entity_id_map(
    conn: &Connection,
    kind: EntityKind,
    provider_id: &str,
) -> Result<HashMap<String, i64>, OperationError> {
    let lower = provider_unique_id(kind, provider_id, "");
    // ';' sorts immediately after ':'
    let upper = format!("{};", &lower[..lower.len() - 1]);

    let mut stmt = conn.prepare(&format!(
        "SELECT provider_unique_id, id FROM {}
         WHERE provider_unique_id >= ?1 AND provider_unique_id < ?2",
        entity_table(kind)
    ))?;
    let rows = stmt.query_map(params![lower, upper], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    rows.collect::<Result<HashMap<_, _>, _>>().map_err(Into::into)
}

/// Insert a new movie or series. Returns the generated internal id.
pub fn insert_entity(
    conn: &Connection,
    kind: EntityKind,
    provider_unique_id: &str,
    fields: &EntityFields,
) -> Result<i64, OperationError> {
    let mut stmt = conn.prepare_cached(&format!(
        "INSERT INTO {} (provider_unique_id, name, year, description, logo, category_name, rating)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        entity_table(kind)
    ))?;
    stmt.execute(params![
        provider_unique_id,
        fields.name,
        fields.year,
        fields.description,
        fields.logo,
        fields.category_name,
        fields.rating,
    ])?;
    Ok(conn.last_insert_rowid())
}

/// Refresh the mutable fields of an existing entity.
///
/// Returns `false` when the stored values already match, in which case the
/// row (including `updated_at`) is left untouched.
pub fn update_entity(
    conn: &Connection,
    kind: EntityKind,
    id: i64,
    fields: &EntityFields,
) -> Result<bool, OperationError> {
    let table = entity_table(kind);
    let mut stmt = conn.prepare_cached(&format!(
        "UPDATE {table} SET
             name = ?2, year = ?3, description = ?4, logo = ?5,
             category_name = ?6, rating = ?7, updated_at = datetime('now')
         WHERE id = ?1
           AND (name IS NOT ?2 OR year IS NOT ?3 OR description IS NOT ?4
                OR logo IS NOT ?5 OR category_name IS NOT ?6 OR rating IS NOT ?7)"
    ))?;
    let changed = stmt.execute(params![
        id,
        fields.name,
        fields.year,
        fields.description,
        fields.logo,
        fields.category_name,
        fields.rating,
    ])?;
    if changed > 0 {
        return Ok(true);
    }

    let exists: bool = conn
        .prepare_cached(&format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"))?
        .query_row(params![id], |row| row.get(0))?;
    if exists {
        Ok(false)
    } else {
        Err(OperationError::not_found(kind.as_str(), id))
    }
}

/// Delete every entity of `kind` that no relation references, across all
/// providers. Series count references from both series and episode relations.
pub fn delete_orphan_entities(conn: &Connection, kind: EntityKind) -> Result<usize, OperationError> {
    let sql = match kind {
        EntityKind::Movie => {
            "DELETE FROM movies WHERE NOT EXISTS (
                 SELECT 1 FROM provider_movie_relations r WHERE r.movie_id = movies.id)"
        }
        EntityKind::Series => {
            "DELETE FROM series WHERE NOT EXISTS (
                 SELECT 1 FROM provider_series_relations r WHERE r.series_id = series.id)
             AND NOT EXISTS (
                 SELECT 1 FROM provider_episode_relations e WHERE e.series_id = series.id)"
        }
    };
    Ok(conn.execute(sql, [])?)
}

// ── Relation Operations ─────────────────────────────────────────────────────

/// Insert or refresh a provider → movie/series relation.
pub fn upsert_relation(
    conn: &Connection,
    kind: EntityKind,
    relation: &Relation,
) -> Result<(), OperationError> {
    let rel_kind = RelationKind::from(kind);
    let column = relation_entity_column(rel_kind);
    let mut stmt = conn.prepare_cached(&format!(
        "INSERT INTO {} (provider_id, {column}, native_id, container, last_seen)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(provider_id, native_id) DO UPDATE SET
             {column} = excluded.{column},
             container = excluded.container,
             last_seen = excluded.last_seen",
        relation_table(rel_kind)
    ))?;
    stmt.execute(params![
        relation.provider_id,
        relation.entity_id,
        relation.native_id,
        relation.container,
        relation.last_seen,
    ])?;
    Ok(())
}

/// Insert or refresh a provider → series relation for one episode.
pub fn upsert_episode_relation(
    conn: &Connection,
    episode: &EpisodeRelation,
) -> Result<(), OperationError> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO provider_episode_relations
             (provider_id, series_id, native_id, season, episode_num, title, container, last_seen)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(provider_id, native_id) DO UPDATE SET
             series_id = excluded.series_id,
             season = excluded.season,
             episode_num = excluded.episode_num,
             title = excluded.title,
             container = excluded.container,
             last_seen = excluded.last_seen",
    )?;
    stmt.execute(params![
        episode.provider_id,
        episode.series_id,
        episode.native_id,
        episode.season,
        episode.episode_num,
        episode.title,
        episode.container,
        episode.last_seen,
    ])?;
    Ok(())
}

/// Delete this provider's relations of `kind` last seen before `before`.
pub fn delete_stale_relations(
    conn: &Connection,
    kind: RelationKind,
    provider_id: &str,
    before: i64,
) -> Result<usize, OperationError> {
    let deleted = conn.execute(
        &format!(
            "DELETE FROM {} WHERE provider_id = ?1 AND last_seen < ?2",
            relation_table(kind)
        ),
        params![provider_id, before],
    )?;
    Ok(deleted)
}

/// Delete this provider's episode relations whose series it no longer lists.
pub fn delete_detached_episode_relations(
    conn: &Connection,
    provider_id: &str,
) -> Result<usize, OperationError> {
    let deleted = conn.execute(
        "DELETE FROM provider_episode_relations
         WHERE provider_id = ?1
           AND NOT EXISTS (
               SELECT 1 FROM provider_series_relations s
               WHERE s.provider_id = provider_episode_relations.provider_id
                 AND s.series_id = provider_episode_relations.series_id)",
        params![provider_id],
    )?;
    Ok(deleted)
}

/// Delete one series' episode relations from this provider last seen before `before`.
pub fn delete_stale_series_episodes(
    conn: &Connection,
    provider_id: &str,
    series_id: i64,
    before: i64,
) -> Result<usize, OperationError> {
    let deleted = conn.execute(
        "DELETE FROM provider_episode_relations
         WHERE provider_id = ?1 AND series_id = ?2 AND last_seen < ?3",
        params![provider_id, series_id, before],
    )?;
    Ok(deleted)
}

// ── Sync Log Operations ─────────────────────────────────────────────────────

/// Insert a sync log entry. Returns the generated ID.
pub fn insert_sync_log(conn: &Connection, log: &SyncLog) -> Result<i64, OperationError> {
    conn.execute(
        "INSERT INTO sync_log (provider_id, source, started_at, finished_at, outcome,
             movies_created, movies_updated, series_created, series_updated,
             rows_skipped, relations_reaped, entities_reaped)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            log.provider_id,
            log.source,
            log.started_at,
            log.finished_at,
            log.outcome,
            log.movies_created,
            log.movies_updated,
            log.series_created,
            log.series_updated,
            log.rows_skipped,
            log.relations_reaped,
            log.entities_reaped,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}
