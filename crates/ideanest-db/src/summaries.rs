//! Summary repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use ideanest_core::{new_v7, Error, Origin, Result, Summary, SummaryRepository};

/// SQLite implementation of SummaryRepository.
#[derive(Clone)]
pub struct SqliteSummaryRepository {
    pool: SqlitePool,
}

impl SqliteSummaryRepository {
    /// Create a new SqliteSummaryRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_summary_row(row: SqliteRow) -> Result<Summary> {
        let kind: String = row.try_get("kind")?;
        Ok(Summary {
            id: row.try_get("id")?,
            idea_id: row.try_get("idea_id")?,
            content: row.try_get("content")?,
            kind: kind.parse().map_err(Error::Internal)?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl SummaryRepository for SqliteSummaryRepository {
    async fn append(&self, idea_id: Uuid, content: &str, kind: Origin) -> Result<Summary> {
        let summary = Summary {
            id: new_v7(),
            idea_id,
            content: content.to_string(),
            kind,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO summary (id, idea_id, content, kind, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(summary.id)
        .bind(summary.idea_id)
        .bind(&summary.content)
        .bind(summary.kind.as_str())
        .bind(summary.created_at)
        .execute(&self.pool)
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

        Ok(summary)
    }

    async fn list_for_idea(&self, idea_id: Uuid) -> Result<Vec<Summary>> {
        let rows = sqlx::query(
            "SELECT id, idea_id, content, kind, created_at FROM summary
             WHERE idea_id = ?
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(idea_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(Self::parse_summary_row).collect()
    }
}
