//! Core traits for ideanest abstractions.
//!
//! These traits define the storage interfaces the enrichment job consumes
//! and the idea CRUD layer produces into, enabling pluggable backends and
//! testability.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// IDEA REPOSITORY TRAITS
// =============================================================================

/// Request for creating a new idea.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateIdeaRequest {
    pub content: String,
    /// Defaults to [`crate::defaults::IMPORTANCE_DEFAULT`].
    pub importance: Option<i32>,
    /// Tags supplied by the user.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request for editing an idea. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIdeaRequest {
    pub content: Option<String>,
    pub importance: Option<i32>,
    /// Replaces the user-supplied tag set. Automated tags are kept.
    pub tags: Option<Vec<String>>,
    pub archived: Option<bool>,
}

impl UpdateIdeaRequest {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.importance.is_none()
            && self.tags.is_none()
            && self.archived.is_none()
    }
}

/// Ordering for idea listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaSort {
    #[default]
    Newest,
    Oldest,
    /// Highest importance first, newest first within equal importance.
    Importance,
}

/// Request for listing ideas.
#[derive(Debug, Clone, Default)]
pub struct ListIdeasRequest {
    /// Only ideas carrying this exact tag
    pub tag: Option<String>,
    /// Case-insensitive substring filter on content
    pub search: Option<String>,
    pub sort: IdeaSort,
    pub include_archived: bool,
    /// Maximum results
    pub limit: Option<i64>,
}

/// Repository for ideas.
#[async_trait]
pub trait IdeaRepository: Send + Sync {
    /// Insert a new idea, attach its tags and enqueue an `analyze_idea` task.
    async fn insert(&self, req: CreateIdeaRequest) -> Result<Idea>;

    /// Edit an idea and enqueue a fresh `analyze_idea` task.
    ///
    /// When `tags` is given, the idea's manual tag associations are replaced
    /// in the same transaction.
    async fn update(&self, id: Uuid, req: UpdateIdeaRequest) -> Result<Idea>;

    /// Archive an idea. Ideas are never hard-deleted.
    async fn archive(&self, id: Uuid) -> Result<()>;

    /// Fetch an idea by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Idea>>;

    /// List ideas with filtering and ordering.
    async fn list(&self, req: ListIdeasRequest) -> Result<Vec<Idea>>;

    /// Names of the tags attached to an idea, alphabetically.
    async fn tags_for(&self, id: Uuid) -> Result<Vec<String>>;

    /// Non-archived ideas other than `exclude_id` carrying at least one of
    /// `tag_names`, oldest first. An empty `tag_names` matches nothing.
    async fn find_by_tags_excluding(
        &self,
        tag_names: &[String],
        exclude_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Idea>>;
}

// =============================================================================
// TAG REPOSITORY TRAITS
// =============================================================================

/// Repository for tags.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Find-or-create a tag by exact name.
    async fn resolve(&self, name: &str) -> Result<Tag>;

    /// Attach a tag to an idea. Attaching twice is a no-op.
    async fn attach(&self, idea_id: Uuid, tag_id: Uuid, origin: Origin) -> Result<()>;

    /// All tags with their non-archived idea counts.
    async fn list(&self) -> Result<Vec<Tag>>;
}

// =============================================================================
// RELATION REPOSITORY TRAITS
// =============================================================================

/// Repository for idea-to-idea relations.
#[async_trait]
pub trait RelationRepository: Send + Sync {
    /// Create the (source, target) relation, or update its strength if present.
    async fn upsert(
        &self,
        source_id: Uuid,
        target_id: Uuid,
        strength: f64,
        created_by: Origin,
    ) -> Result<RelationUpsert>;

    /// Relations whose source is `idea_id`.
    async fn outgoing(&self, idea_id: Uuid) -> Result<Vec<Relation>>;
}

// =============================================================================
// SUMMARY REPOSITORY TRAITS
// =============================================================================

/// Repository for append-only summaries.
#[async_trait]
pub trait SummaryRepository: Send + Sync {
    /// Append a summary. Existing summaries are never replaced.
    async fn append(&self, idea_id: Uuid, content: &str, kind: Origin) -> Result<Summary>;

    /// All summaries for an idea, oldest first.
    async fn list_for_idea(&self, idea_id: Uuid) -> Result<Vec<Summary>>;
}

// =============================================================================
// REMINDER REPOSITORY TRAITS
// =============================================================================

/// Repository for reminders.
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Create a reminder for an idea.
    async fn create(&self, idea_id: Uuid, due_at: DateTime<Utc>) -> Result<Reminder>;

    /// Reminders with `due_at <= now` that are not completed, earliest first.
    async fn due(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>>;

    /// Mark a reminder as completed.
    async fn complete(&self, id: Uuid) -> Result<()>;

    /// Reschedule and/or change the completed flag of a reminder.
    async fn update(
        &self,
        id: Uuid,
        due_at: Option<DateTime<Utc>>,
        completed: Option<bool>,
    ) -> Result<Reminder>;

    /// All reminders for an idea, earliest first.
    async fn list_for_idea(&self, idea_id: Uuid) -> Result<Vec<Reminder>>;
}

// =============================================================================
// SETTING REPOSITORY TRAITS
// =============================================================================

/// Key/value settings store.
#[async_trait]
pub trait SettingRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite a setting.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn list(&self) -> Result<Vec<Setting>>;
}

// =============================================================================
// TASK QUEUE TRAITS
// =============================================================================

/// Repository for the enrichment task queue.
///
/// Status changes only move forward; `claim`, `complete` and `fail` return
/// [`crate::Error::InvalidTransition`] for any other step.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Queue a new pending task.
    async fn queue(&self, kind: TaskKind, payload: JsonValue, priority: i32) -> Result<Uuid>;

    /// Up to `limit` pending tasks, priority descending then arrival order.
    async fn find_pending(&self, limit: i64) -> Result<Vec<Task>>;

    /// Atomically move a pending task to processing.
    ///
    /// Returns `None` when the task is no longer pending (claimed elsewhere).
    async fn claim(&self, id: Uuid, at: DateTime<Utc>) -> Result<Option<Task>>;

    /// Move a processing task to completed with its result payload.
    async fn complete(&self, id: Uuid, at: DateTime<Utc>, result: Option<JsonValue>)
        -> Result<()>;

    /// Move a processing task to failed with the error detail.
    async fn fail(&self, id: Uuid, at: DateTime<Utc>, error: &str) -> Result<()>;

    /// Get a task by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Task>>;

    /// Count pending tasks.
    async fn pending_count(&self) -> Result<i64>;

    /// Most recently created tasks first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<Task>>;

    /// Task counts by status.
    async fn queue_stats(&self) -> Result<QueueStats>;
}
