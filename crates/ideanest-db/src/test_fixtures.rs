//! Test fixtures for database integration tests.
//!
//! Provides an isolated, migrated database per test and builders for
//! consistent test data across the workspace.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ideanest_db::test_fixtures::{IdeaBuilder, TestDatabase};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let test_db = TestDatabase::new().await;
//!     let idea = IdeaBuilder::new("学习 Rust")
//!         .importance(4)
//!         .tag("编程")
//!         .insert(&test_db.db)
//!         .await;
//!
//!     // Run your tests...
//! }
//! ```

use std::path::Path;

use crate::{CreateIdeaRequest, Database, Idea, IdeaRepository, PoolConfig};

/// Isolated database for a single test.
///
/// Backed by a private in-memory SQLite database, so no cleanup is needed:
/// the data disappears with the pool.
pub struct TestDatabase {
    pub db: Database,
}

impl TestDatabase {
    /// Create a new migrated in-memory test database.
    pub async fn new() -> Self {
        let db = Database::connect_in_memory()
            .await
            .expect("Failed to create in-memory test database");
        Self { db }
    }

    /// Create a migrated on-disk test database at `path`.
    ///
    /// Unlike the in-memory database this pool has several connections, so
    /// concurrent callers really do race each other.
    pub async fn on_disk(path: &Path) -> Self {
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let db = Database::connect_with_config(&url, PoolConfig::new().max_connections(4))
            .await
            .expect("Failed to create on-disk test database");
        db.migrate().await.expect("Failed to migrate test database");
        Self { db }
    }
}

/// Builder for test ideas.
#[derive(Debug, Clone)]
pub struct IdeaBuilder {
    content: String,
    importance: Option<i32>,
    tags: Vec<String>,
    archived: bool,
}

impl IdeaBuilder {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            importance: None,
            tags: Vec::new(),
            archived: false,
        }
    }

    pub fn importance(mut self, importance: i32) -> Self {
        self.importance = Some(importance);
        self
    }

    /// Add a manual tag.
    pub fn tag(mut self, name: impl Into<String>) -> Self {
        self.tags.push(name.into());
        self
    }

    /// Archive the idea right after inserting it.
    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    /// Insert the idea (which also enqueues its analysis task).
    pub async fn insert(self, db: &Database) -> Idea {
        let mut idea = db
            .ideas
            .insert(CreateIdeaRequest {
                content: self.content,
                importance: self.importance,
                tags: self.tags,
            })
            .await
            .expect("Failed to insert test idea");

        if self.archived {
            db.ideas
                .archive(idea.id)
                .await
                .expect("Failed to archive test idea");
            idea.archived = true;
        }
        idea
    }
}
