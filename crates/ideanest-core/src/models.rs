//! Domain models for ideanest.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// IDEA TYPES
// =============================================================================

/// A user-captured idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub id: Uuid,
    pub content: String,
    /// Ordinal importance, 1 (lowest) through 5 (highest).
    pub importance: i32,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Who produced a tag association, relation or summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Entered by the user.
    #[default]
    Manual,
    /// Derived by the enrichment job.
    Automated,
}

impl Origin {
    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automated => "automated",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Origin {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "automated" => Ok(Self::Automated),
            _ => Err(format!("Invalid origin: {}", s)),
        }
    }
}

/// A tag shared across ideas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Number of non-archived ideas carrying this tag (computed)
    #[serde(default)]
    pub idea_count: i64,
}

/// A reminder attached to an idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub idea_id: Uuid,
    pub due_at: DateTime<Utc>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    /// A reminder is due once its time has passed and it has not been completed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_at <= now
    }
}

/// Directed, weighted link between two ideas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: Uuid,
    pub source_id: Uuid,
    pub target_id: Uuid,
    /// Relevance weight in `[0, 1]`.
    pub strength: f64,
    pub created_by: Origin,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a relation upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationUpsert {
    pub relation: Relation,
    /// `true` when the row was inserted, `false` when an existing pair was updated.
    pub created: bool,
}

/// Generated or hand-written synopsis of an idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub id: Uuid,
    pub idea_id: Uuid,
    pub content: String,
    pub kind: Origin,
    pub created_at: DateTime<Utc>,
}

/// Application setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// TASK TYPES
// =============================================================================

/// Status of an enrichment task.
///
/// The lifecycle only moves forward:
/// `pending -> processing -> completed` or `pending -> processing -> failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Completed and failed tasks are never touched again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> next` is a legal lifecycle step.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

/// Kind of enrichment task to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Extract keywords, tag, link related ideas and summarize one idea
    AnalyzeIdea,
}

impl TaskKind {
    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnalyzeIdea => "analyze_idea",
        }
    }

    /// Default priority for this task kind (higher = more urgent)
    pub fn default_priority(&self) -> i32 {
        match self {
            Self::AnalyzeIdea => crate::defaults::ANALYZE_IDEA_PRIORITY,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "analyze_idea" => Ok(Self::AnalyzeIdea),
            _ => Err(format!("Invalid task kind: {}", s)),
        }
    }
}

/// Payload of an `analyze_idea` task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeIdeaPayload {
    pub idea_id: Uuid,
}

/// A queued unit of background enrichment work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub kind: TaskKind,
    pub payload: JsonValue,
    pub priority: i32,
    pub status: TaskStatus,
    pub result: Option<JsonValue>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    /// Processed timestamp, set when the task reaches a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Decode the opaque payload into a typed value.
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| Error::MalformedPayload(format!("{} (payload: {})", e, self.payload)))
    }
}

/// Queue statistics summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
    pub total: i64,
}
