//! Idea repository implementation.
//!
//! Every insert and every edit enqueues an `analyze_idea` task in the same
//! transaction.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use ideanest_core::{
    defaults, new_v7, AnalyzeIdeaPayload, CreateIdeaRequest, Error, Idea, IdeaRepository,
    IdeaSort, ListIdeasRequest, Origin, Result, TaskKind, UpdateIdeaRequest,
};

use crate::escape_like;
use crate::tags::SqliteTagRepository;
use crate::tasks::SqliteTaskRepository;

const IDEA_COLUMNS: &str = "i.id, i.content, i.importance, i.archived, i.created_at, i.updated_at";

/// Reject empty content.
fn validate_content(content: &str) -> Result<()> {
    if content.trim().is_empty() {
        return Err(Error::InvalidInput("Idea content cannot be empty".to_string()));
    }
    Ok(())
}

/// Reject importance outside the accepted ordinal range.
fn validate_importance(importance: i32) -> Result<()> {
    if !(defaults::IMPORTANCE_MIN..=defaults::IMPORTANCE_MAX).contains(&importance) {
        return Err(Error::InvalidInput(format!(
            "Importance must be between {} and {}, got {}",
            defaults::IMPORTANCE_MIN,
            defaults::IMPORTANCE_MAX,
            importance
        )));
    }
    Ok(())
}

/// SQLite implementation of IdeaRepository.
#[derive(Clone)]
pub struct SqliteIdeaRepository {
    pool: SqlitePool,
}

impl SqliteIdeaRepository {
    /// Create a new SqliteIdeaRepository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_idea_row(row: SqliteRow) -> Result<Idea> {
        Ok(Idea {
            id: row.try_get("id")?,
            content: row.try_get("content")?,
            importance: row.try_get("importance")?,
            archived: row.try_get("archived")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn fetch_tx(tx: &mut Transaction<'_, Sqlite>, id: Uuid) -> Result<Option<Idea>> {
        let row = sqlx::query(&format!("SELECT {IDEA_COLUMNS} FROM idea i WHERE i.id = ?"))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;
        row.map(Self::parse_idea_row).transpose()
    }

    /// Swap the user-supplied tag set; automated associations survive.
    async fn replace_manual_tags_tx(
        tx: &mut Transaction<'_, Sqlite>,
        idea_id: Uuid,
        tags: &[String],
    ) -> Result<()> {
        sqlx::query("DELETE FROM idea_tag WHERE idea_id = ? AND origin = ?")
            .bind(idea_id)
            .bind(Origin::Manual.as_str())
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        for name in tags {
            let tag = SqliteTagRepository::resolve_tx(tx, name).await?;
            SqliteTagRepository::attach_tx(tx, idea_id, tag.id, Origin::Manual).await?;
        }
        Ok(())
    }

    /// Enqueue the enrichment task for an idea inside the write transaction.
    async fn enqueue_analysis_tx(tx: &mut Transaction<'_, Sqlite>, idea_id: Uuid) -> Result<Uuid> {
        let kind = TaskKind::AnalyzeIdea;
        let payload = serde_json::to_value(AnalyzeIdeaPayload { idea_id })?;
        SqliteTaskRepository::queue_tx(tx, kind, &payload, kind.default_priority()).await
    }
}

#[async_trait]
impl IdeaRepository for SqliteIdeaRepository {
    async fn insert(&self, req: CreateIdeaRequest) -> Result<Idea> {
        validate_content(&req.content)?;
        let importance = req.importance.unwrap_or(defaults::IMPORTANCE_DEFAULT);
        validate_importance(importance)?;

        let id = new_v7();
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO idea (id, content, importance, archived, created_at, updated_at)
             VALUES (?, ?, ?, 0, ?, ?)",
        )
        .bind(id)
        .bind(&req.content)
        .bind(importance)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        for name in &req.tags {
            let tag = SqliteTagRepository::resolve_tx(&mut tx, name).await?;
            SqliteTagRepository::attach_tx(&mut tx, id, tag.id, Origin::Manual).await?;
        }

        let task_id = Self::enqueue_analysis_tx(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "ideas",
            op = "insert",
            idea_id = %id,
            task_id = %task_id,
            tag_count = req.tags.len(),
            "Idea created"
        );

        Ok(Idea {
            id,
            content: req.content,
            importance,
            archived: false,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, id: Uuid, req: UpdateIdeaRequest) -> Result<Idea> {
        if req.is_empty() {
            return Err(Error::InvalidInput("Nothing to update".to_string()));
        }
        if let Some(content) = &req.content {
            validate_content(content)?;
        }
        if let Some(importance) = req.importance {
            validate_importance(importance)?;
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let rows = sqlx::query(
            "UPDATE idea
             SET content = COALESCE(?, content),
                 importance = COALESCE(?, importance),
                 archived = COALESCE(?, archived),
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(&req.content)
        .bind(req.importance)
        .bind(req.archived)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if rows == 0 {
            return Err(Error::IdeaNotFound(id));
        }

        if let Some(tags) = &req.tags {
            Self::replace_manual_tags_tx(&mut tx, id, tags).await?;
        }

        let task_id = Self::enqueue_analysis_tx(&mut tx, id).await?;
        let idea = Self::fetch_tx(&mut tx, id)
            .await?
            .ok_or(Error::IdeaNotFound(id))?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "ideas",
            op = "update",
            idea_id = %id,
            task_id = %task_id,
            tags_replaced = req.tags.is_some(),
            "Idea updated"
        );
        Ok(idea)
    }

    async fn archive(&self, id: Uuid) -> Result<()> {
        let rows = sqlx::query("UPDATE idea SET archived = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        if rows == 0 {
            return Err(Error::IdeaNotFound(id));
        }
        debug!(subsystem = "db", component = "ideas", op = "archive", idea_id = %id, "Idea archived");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Idea>> {
        let row = sqlx::query(&format!("SELECT {IDEA_COLUMNS} FROM idea i WHERE i.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.map(Self::parse_idea_row).transpose()
    }

    async fn list(&self, req: ListIdeasRequest) -> Result<Vec<Idea>> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {IDEA_COLUMNS} FROM idea i WHERE 1 = 1"));

        if !req.include_archived {
            query.push(" AND i.archived = 0");
        }
        if let Some(tag) = &req.tag {
            query.push(
                " AND EXISTS (SELECT 1 FROM idea_tag it JOIN tag t ON t.id = it.tag_id
                   WHERE it.idea_id = i.id AND t.name = ",
            );
            query.push_bind(tag.clone());
            query.push(")");
        }
        if let Some(search) = req.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query.push(" AND i.content LIKE ");
            query.push_bind(format!("%{}%", escape_like(search)));
            query.push(" ESCAPE '\\'");
        }

        query.push(match req.sort {
            IdeaSort::Newest => " ORDER BY i.created_at DESC, i.rowid DESC",
            IdeaSort::Oldest => " ORDER BY i.created_at ASC, i.rowid ASC",
            IdeaSort::Importance => " ORDER BY i.importance DESC, i.created_at DESC, i.rowid DESC",
        });
        query.push(" LIMIT ");
        query.push_bind(req.limit.unwrap_or(defaults::PAGE_LIMIT).max(0));

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        rows.into_iter().map(Self::parse_idea_row).collect()
    }

    async fn tags_for(&self, id: Uuid) -> Result<Vec<String>> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT t.name FROM idea_tag it
             JOIN tag t ON t.id = it.tag_id
             WHERE it.idea_id = ?
             ORDER BY t.name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(names)
    }

    async fn find_by_tags_excluding(
        &self,
        tag_names: &[String],
        exclude_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Idea>> {
        // An empty IN () list is not valid SQL; nothing can match anyway.
        if tag_names.is_empty() || limit <= 0 {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {IDEA_COLUMNS} FROM idea i
             WHERE i.archived = 0 AND i.id <> "
        ));
        query.push_bind(exclude_id);
        query.push(
            " AND EXISTS (SELECT 1 FROM idea_tag it JOIN tag t ON t.id = it.tag_id
               WHERE it.idea_id = i.id AND t.name IN (",
        );
        let mut names = query.separated(", ");
        for name in tag_names {
            names.push_bind(name.as_str());
        }
        names.push_unseparated("))");
        query.push(" ORDER BY i.created_at ASC, i.rowid ASC LIMIT ");
        query.push_bind(limit);

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "ideas",
            op = "find_by_tags_excluding",
            idea_id = %exclude_id,
            tag_count = tag_names.len(),
            result_count = rows.len(),
            "Related idea candidates loaded"
        );

        rows.into_iter().map(Self::parse_idea_row).collect()
    }
}
