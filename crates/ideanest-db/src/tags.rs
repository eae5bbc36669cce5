//! Tag repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use ideanest_core::{defaults, new_v7, Error, Origin, Result, Tag, TagRepository};

/// Validate a tag name and return its canonical (trimmed) form.
///
/// Tag names must:
/// - Be non-empty after trimming surrounding whitespace
/// - Be at most 100 characters
/// - Contain no control characters
///
/// Names are otherwise free-form so CJK keywords such as `工作` are valid.
pub fn validate_tag_name(tag: &str) -> std::result::Result<String, String> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if tag.chars().count() > defaults::TAG_NAME_MAX_LEN {
        return Err(format!(
            "Tag name must be {} characters or less",
            defaults::TAG_NAME_MAX_LEN
        ));
    }
    if tag.chars().any(char::is_control) {
        return Err("Tag name cannot contain control characters".to_string());
    }
    Ok(tag.to_string())
}

/// SQLite implementation of TagRepository.
#[derive(Clone)]
pub struct SqliteTagRepository {
    pool: SqlitePool,
}

impl SqliteTagRepository {
    /// Create a new SqliteTagRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_tag_row(row: SqliteRow) -> Result<Tag> {
        Ok(Tag {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
            idea_count: row.try_get("idea_count")?,
        })
    }

    /// Find-or-create a tag within an existing transaction.
    pub async fn resolve_tx(tx: &mut Transaction<'_, Sqlite>, name: &str) -> Result<Tag> {
        let name = validate_tag_name(name).map_err(Error::InvalidInput)?;

        sqlx::query(
            "INSERT INTO tag (id, name, created_at) VALUES (?, ?, ?)
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(new_v7())
        .bind(&name)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        let row = sqlx::query(
            "SELECT t.id, t.name, t.created_at,
                    (SELECT COUNT(*) FROM idea_tag it
                     JOIN idea i ON i.id = it.idea_id
                     WHERE it.tag_id = t.id AND i.archived = 0) AS idea_count
             FROM tag t WHERE t.name = ?",
        )
        .bind(&name)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Self::parse_tag_row(row)
    }

    /// Attach a tag to an idea within an existing transaction.
    ///
    /// An existing association keeps its original origin.
    pub async fn attach_tx(
        tx: &mut Transaction<'_, Sqlite>,
        idea_id: Uuid,
        tag_id: Uuid,
        origin: Origin,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO idea_tag (idea_id, tag_id, origin, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT (idea_id, tag_id) DO NOTHING",
        )
        .bind(idea_id)
        .bind(tag_id)
        .bind(origin.as_str())
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if e
                .as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation())
            {
                Error::IdeaNotFound(idea_id)
            } else {
                Error::Database(e)
            }
        })?;
        Ok(())
    }
}

#[async_trait]
impl TagRepository for SqliteTagRepository {
    async fn resolve(&self, name: &str) -> Result<Tag> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let tag = Self::resolve_tx(&mut tx, name).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(tag)
    }

    async fn attach(&self, idea_id: Uuid, tag_id: Uuid, origin: Origin) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        Self::attach_tx(&mut tx, idea_id, tag_id, origin).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT t.id, t.name, t.created_at,
                    COUNT(i.id) AS idea_count
             FROM tag t
             LEFT JOIN idea_tag it ON it.tag_id = t.id
             LEFT JOIN idea i ON i.id = it.idea_id AND i.archived = 0
             GROUP BY t.id, t.name, t.created_at
             ORDER BY t.name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(Self::parse_tag_row).collect()
    }
}
