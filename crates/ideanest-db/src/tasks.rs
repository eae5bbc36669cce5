//! Task queue repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use ideanest_core::{new_v7, Error, QueueStats, Result, Task, TaskKind, TaskRepository, TaskStatus};

const TASK_COLUMNS: &str = "id, kind, payload, priority, status, result, error_message, \
                            created_at, started_at, completed_at";

/// SQLite implementation of TaskRepository.
#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    /// Create a new SqliteTaskRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Parse a task row into a Task struct.
    fn parse_task_row(row: SqliteRow) -> Result<Task> {
        let kind: String = row.try_get("kind")?;
        let status: String = row.try_get("status")?;
        let payload: String = row.try_get("payload")?;
        let result: Option<String> = row.try_get("result")?;

        Ok(Task {
            id: row.try_get("id")?,
            kind: kind.parse().map_err(Error::Internal)?,
            payload: serde_json::from_str(&payload)?,
            priority: row.try_get("priority")?,
            status: status.parse().map_err(Error::Internal)?,
            result: result.as_deref().map(serde_json::from_str).transpose()?,
            error_message: row.try_get("error_message")?,
            created_at: row.try_get("created_at")?,
            started_at: row.try_get("started_at")?,
            completed_at: row.try_get("completed_at")?,
        })
    }

    /// Queue a task within an existing transaction.
    ///
    /// Used by the idea write path so an idea and its enrichment task are
    /// committed together.
    pub async fn queue_tx(
        tx: &mut Transaction<'_, Sqlite>,
        kind: TaskKind,
        payload: &JsonValue,
        priority: i32,
    ) -> Result<Uuid> {
        let id = new_v7();
        sqlx::query(
            "INSERT INTO task_queue (id, kind, payload, priority, status, created_at)
             VALUES (?, ?, ?, ?, 'pending', ?)",
        )
        .bind(id)
        .bind(kind.as_str())
        .bind(payload.to_string())
        .bind(priority)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "tasks",
            op = "queue",
            task_id = %id,
            task_kind = %kind,
            priority,
            "Task queued"
        );
        Ok(id)
    }

    async fn current_status(&self, id: Uuid) -> Result<Option<TaskStatus>> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM task_queue WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;
        status
            .map(|s| s.parse().map_err(Error::Internal))
            .transpose()
    }

    /// Map a rejected conditional update to the error describing why.
    async fn rejected_transition(&self, id: Uuid, to: TaskStatus) -> Error {
        match self.current_status(id).await {
            Ok(Some(from)) => Error::InvalidTransition { from, to },
            Ok(None) => Error::TaskNotFound(id),
            Err(e) => e,
        }
    }

    async fn finish(
        &self,
        id: Uuid,
        to: TaskStatus,
        at: DateTime<Utc>,
        result: Option<String>,
        error_message: Option<&str>,
    ) -> Result<()> {
        let rows = sqlx::query(
            "UPDATE task_queue
             SET status = ?, completed_at = ?, result = ?, error_message = ?
             WHERE id = ? AND status = 'processing'",
        )
        .bind(to.as_str())
        .bind(at)
        .bind(result)
        .bind(error_message)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if rows == 0 {
            return Err(self.rejected_transition(id, to).await);
        }
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn queue(&self, kind: TaskKind, payload: JsonValue, priority: i32) -> Result<Uuid> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let id = Self::queue_tx(&mut tx, kind, &payload, priority).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(id)
    }

    async fn find_pending(&self, limit: i64) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM task_queue
             WHERE status = 'pending'
             ORDER BY priority DESC, created_at ASC, rowid ASC
             LIMIT ?"
        ))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(Self::parse_task_row).collect()
    }

    async fn claim(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Task>> {
        // Single conditional statement: only one claimer can observe `pending`.
        let row = sqlx::query(&format!(
            "UPDATE task_queue
             SET status = 'processing', started_at = ?
             WHERE id = ? AND status = 'pending'
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(row) => Ok(Some(Self::parse_task_row(row)?)),
            None => match self.current_status(id).await? {
                Some(_) => Ok(None),
                None => Err(Error::TaskNotFound(id)),
            },
        }
    }

    async fn complete(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
        result: Option<JsonValue>,
    ) -> Result<()> {
        let result = result.map(|r| r.to_string());
        self.finish(id, TaskStatus::Completed, at, result, None).await
    }

    async fn fail(&self, id: Uuid, at: DateTime<Utc>, error: &str) -> Result<()> {
        self.finish(id, TaskStatus::Failed, at, None, Some(error)).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>> {
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM task_queue WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(Self::parse_task_row).transpose()
    }

    async fn pending_count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM task_queue WHERE status = 'pending'")
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(count)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM task_queue
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?"
        ))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(Self::parse_task_row).collect()
    }

    async fn queue_stats(&self) -> Result<QueueStats> {
        let row = sqlx::query(
            "SELECT
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending,
                COALESCE(SUM(CASE WHEN status = 'processing' THEN 1 ELSE 0 END), 0) AS processing,
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed,
                COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0) AS failed,
                COUNT(*) AS total
             FROM task_queue",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(QueueStats {
            pending: row.try_get("pending")?,
            processing: row.try_get("processing")?,
            completed: row.try_get("completed")?,
            failed: row.try_get("failed")?,
            total: row.try_get("total")?,
        })
    }
}
