//! Settings repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use ideanest_core::{Error, Result, Setting, SettingRepository};

/// SQLite implementation of SettingRepository.
#[derive(Clone)]
pub struct SqliteSettingRepository {
    pool: SqlitePool,
}

impl SqliteSettingRepository {
    /// Create a new SqliteSettingRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingRepository for SqliteSettingRepository {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM setting WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if key.trim().is_empty() {
            return Err(Error::InvalidInput("Setting key cannot be empty".to_string()));
        }

        sqlx::query(
            "INSERT INTO setting (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Setting>> {
        let rows = sqlx::query("SELECT key, value, updated_at FROM setting ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.into_iter()
            .map(|row| -> Result<Setting> {
                Ok(Setting {
                    key: row.try_get("key")?,
                    value: row.try_get("value")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }
}
