//! # ideanest-db
//!
//! SQLite database layer for ideanest.
//!
//! This crate provides:
//! - Connection pool management
//! - Embedded schema migrations
//! - Repository implementations for ideas, tags, relations, summaries,
//!   reminders, settings and the enrichment task queue
//!
//! ## Example
//!
//! ```rust,ignore
//! use ideanest_db::{Database, IdeaRepository, CreateIdeaRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite://ideanest.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let idea = db.ideas.insert(CreateIdeaRequest {
//!         content: "这是一个关于工作的重要想法".to_string(),
//!         importance: Some(4),
//!         tags: vec!["灵感".to_string()],
//!     }).await?;
//!
//!     println!("Created idea: {}", idea.id);
//!     Ok(())
//! }
//! ```
pub mod ideas;
pub mod pool;
pub mod relations;
pub mod reminders;
pub mod settings;
pub mod summaries;
pub mod tags;
pub mod tasks;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) and downstream crates can use them
pub mod test_fixtures;

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::info;

// Re-export core types
pub use ideanest_core::*;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Escape LIKE wildcard characters (`%`, `_`, `\`) in user input.
///
/// Pair with `ESCAPE '\'` in the query.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// Re-export repository implementations
pub use ideas::SqliteIdeaRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig, IN_MEMORY_URL};
pub use relations::SqliteRelationRepository;
pub use reminders::SqliteReminderRepository;
pub use settings::SqliteSettingRepository;
pub use summaries::SqliteSummaryRepository;
pub use tags::{validate_tag_name, SqliteTagRepository};
pub use tasks::SqliteTaskRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: SqlitePool,
    /// Idea repository for CRUD operations.
    pub ideas: SqliteIdeaRepository,
    /// Tag repository.
    pub tags: SqliteTagRepository,
    /// Relation repository for idea-to-idea links.
    pub relations: SqliteRelationRepository,
    /// Append-only summary repository.
    pub summaries: SqliteSummaryRepository,
    /// Reminder repository.
    pub reminders: SqliteReminderRepository,
    /// Key/value settings.
    pub settings: SqliteSettingRepository,
    /// Enrichment task queue.
    pub tasks: SqliteTaskRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            ideas: SqliteIdeaRepository::new(pool.clone()),
            tags: SqliteTagRepository::new(pool.clone()),
            relations: SqliteRelationRepository::new(pool.clone()),
            summaries: SqliteSummaryRepository::new(pool.clone()),
            reminders: SqliteReminderRepository::new(pool.clone()),
            settings: SqliteSettingRepository::new(pool.clone()),
            tasks: SqliteTaskRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create a new Database instance with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Open a private in-memory database with the schema applied.
    pub async fn connect_in_memory() -> Result<Self> {
        let db = Self::connect_with_config(IN_MEMORY_URL, PoolConfig::in_memory()).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(e.into()))?;
        info!(
            subsystem = "db",
            component = "migrate",
            op = "run",
            migrations = MIGRATOR.iter().count(),
            "Database schema up to date"
        );
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\dir"), "c:\\\\dir");
        assert_eq!(escape_like("工作"), "工作");
    }

    #[tokio::test]
    async fn test_connect_in_memory_applies_schema() {
        let db = Database::connect_in_memory().await.unwrap();
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
             AND name IN ('idea', 'tag', 'idea_tag', 'reminder', 'idea_relation',
                          'summary', 'task_queue', 'setting')",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(tables, 8);
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let db = Database::connect_in_memory().await.unwrap();
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
