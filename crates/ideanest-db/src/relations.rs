//! Relation repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use ideanest_core::{new_v7, Error, Origin, Relation, RelationRepository, RelationUpsert, Result};

const RELATION_COLUMNS: &str =
    "id, source_id, target_id, strength, created_by, created_at, updated_at";

/// SQLite implementation of RelationRepository.
#[derive(Clone)]
pub struct SqliteRelationRepository {
    pool: SqlitePool,
}

impl SqliteRelationRepository {
    /// Create a new SqliteRelationRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_relation_row(row: SqliteRow) -> Result<Relation> {
        let created_by: String = row.try_get("created_by")?;
        Ok(Relation {
            id: row.try_get("id")?,
            source_id: row.try_get("source_id")?,
            target_id: row.try_get("target_id")?,
            strength: row.try_get("strength")?,
            created_by: created_by.parse().map_err(Error::Internal)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl RelationRepository for SqliteRelationRepository {
    async fn upsert(
        &self,
        source_id: Uuid,
        target_id: Uuid,
        strength: f64,
        created_by: Origin,
    ) -> Result<RelationUpsert> {
        if source_id == target_id {
            return Err(Error::InvalidInput(format!(
                "An idea cannot be related to itself: {}",
                source_id
            )));
        }
        if !(0.0..=1.0).contains(&strength) {
            return Err(Error::InvalidInput(format!(
                "Relation strength must be within [0, 1], got {}",
                strength
            )));
        }

        let new_id = new_v7();
        let now = Utc::now();

        // The conflict target keeps one row per ordered pair; creator and
        // identity of an existing row are preserved.
        let row = sqlx::query(&format!(
            "INSERT INTO idea_relation
                (id, source_id, target_id, strength, created_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT (source_id, target_id)
             DO UPDATE SET strength = excluded.strength, updated_at = excluded.updated_at
             RETURNING {RELATION_COLUMNS}"
        ))
        .bind(new_id)
        .bind(source_id)
        .bind(target_id)
        .bind(strength)
        .bind(created_by.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e
                .as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation())
            {
                Error::NotFound(format!(
                    "Relation endpoint missing: {} -> {}",
                    source_id, target_id
                ))
            } else {
                Error::Database(e)
            }
        })?;

        let relation = Self::parse_relation_row(row)?;
        let created = relation.id == new_id;
        Ok(RelationUpsert { relation, created })
    }

    async fn outgoing(&self, idea_id: Uuid) -> Result<Vec<Relation>> {
        let rows = sqlx::query(&format!(
            "SELECT {RELATION_COLUMNS} FROM idea_relation
             WHERE source_id = ?
             ORDER BY created_at ASC, rowid ASC"
        ))
        .bind(idea_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(Self::parse_relation_row).collect()
    }
}
