//! Reminder repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use ideanest_core::{new_v7, Error, Reminder, ReminderRepository, Result};

/// SQLite implementation of ReminderRepository.
#[derive(Clone)]
pub struct SqliteReminderRepository {
    pool: SqlitePool,
}

impl SqliteReminderRepository {
    /// Create a new SqliteReminderRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_reminder_row(row: SqliteRow) -> Result<Reminder> {
        Ok(Reminder {
            id: row.try_get("id")?,
            idea_id: row.try_get("idea_id")?,
            due_at: row.try_get("due_at")?,
            completed: row.try_get("completed")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ReminderRepository for SqliteReminderRepository {
    async fn create(&self, idea_id: Uuid, due_at: DateTime<Utc>) -> Result<Reminder> {
        let reminder = Reminder {
            id: new_v7(),
            idea_id,
            due_at,
            completed: false,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO reminder (id, idea_id, due_at, completed, created_at)
             VALUES (?, ?, ?, 0, ?)",
        )
        .bind(reminder.id)
        .bind(reminder.idea_id)
        .bind(reminder.due_at)
        .bind(reminder.created_at)
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

        Ok(reminder)
    }

    async fn due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        let rows = sqlx::query(
            "SELECT id, idea_id, due_at, completed, created_at FROM reminder
             WHERE completed = 0 AND due_at <= ?
             ORDER BY due_at ASC, rowid ASC",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(Self::parse_reminder_row).collect()
    }

    async fn complete(&self, id: Uuid) -> Result<()> {
        let rows = sqlx::query("UPDATE reminder SET completed = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        if rows == 0 {
            return Err(Error::NotFound(format!("Reminder {}", id)));
        }
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        due_at: Option<DateTime<Utc>>,
        completed: Option<bool>,
    ) -> Result<Reminder> {
        if due_at.is_none() && completed.is_none() {
            return Err(Error::InvalidInput("Nothing to update".to_string()));
        }

        let row = sqlx::query(
            "UPDATE reminder
             SET due_at = COALESCE(?, due_at),
                 completed = COALESCE(?, completed)
             WHERE id = ?
             RETURNING id, idea_id, due_at, completed, created_at",
        )
        .bind(due_at)
        .bind(completed)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound(format!("Reminder {}", id)))?;

        Self::parse_reminder_row(row)
    }

    async fn list_for_idea(&self, idea_id: Uuid) -> Result<Vec<Reminder>> {
        let rows = sqlx::query(
            "SELECT id, idea_id, due_at, completed, created_at FROM reminder
             WHERE idea_id = ?
             ORDER BY due_at ASC, rowid ASC",
        )
        .bind(idea_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(Self::parse_reminder_row).collect()
    }
}
