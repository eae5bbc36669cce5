//! Task handlers for each task kind.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use ideanest_core::{Clock, Result, SystemClock, Task, TaskKind};

/// Context provided to task handlers.
pub struct TaskContext {
    /// The claimed task being processed.
    pub task: Task,
    clock: Arc<dyn Clock>,
}

impl TaskContext {
    /// Create a new task context using the system clock.
    pub fn new(task: Task) -> Self {
        Self {
            task,
            clock: Arc::new(SystemClock),
        }
    }

    /// Use the given clock instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Get the task ID.
    pub fn task_id(&self) -> Uuid {
        self.task.id
    }

    /// Decode the payload into a typed value.
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T> {
        self.task.parse_payload()
    }

    /// Current time according to the worker's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

/// Result of task execution.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    /// Task completed successfully with optional result data.
    Success(Option<JsonValue>),
    /// Task failed with an error message.
    Failed(String),
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl From<Result<JsonValue>> for TaskResult {
    fn from(result: Result<JsonValue>) -> Self {
        match result {
            Ok(value) => Self::Success(Some(value)),
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

/// Trait for task handlers.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// The task kind this handler processes.
    fn kind(&self) -> TaskKind;

    /// Execute the task.
    async fn execute(&self, ctx: TaskContext) -> TaskResult;

    /// Check if this handler can process the given task kind.
    fn can_handle(&self, kind: TaskKind) -> bool {
        self.kind() == kind
    }
}

/// No-op handler for testing.
pub struct NoOpHandler {
    kind: TaskKind,
}

impl NoOpHandler {
    /// Create a new no-op handler for the given task kind.
    pub fn new(kind: TaskKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl TaskHandler for NoOpHandler {
    fn kind(&self) -> TaskKind {
        self.kind
    }

    async fn execute(&self, _ctx: TaskContext) -> TaskResult {
        TaskResult::Success(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ideanest_core::{AnalyzeIdeaPayload, Error, ManualClock, TaskStatus};
    use serde_json::json;

    fn task(payload: JsonValue) -> Task {
        Task {
            id: Uuid::new_v4(),
            kind: TaskKind::AnalyzeIdea,
            payload,
            priority: 1,
            status: TaskStatus::Processing,
            result: None,
            error_message: None,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    #[test]
    fn test_task_context_parses_payload() {
        let idea_id = Uuid::new_v4();
        let ctx = TaskContext::new(task(json!({ "idea_id": idea_id })));
        let payload: AnalyzeIdeaPayload = ctx.parse_payload().unwrap();
        assert_eq!(payload.idea_id, idea_id);
        assert_eq!(ctx.task_id(), ctx.task.id);
    }

    #[test]
    fn test_task_context_malformed_payload() {
        let ctx = TaskContext::new(task(json!({ "note": 1 })));
        let err = ctx.parse_payload::<AnalyzeIdeaPayload>().unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn test_task_context_uses_injected_clock() {
        let pinned = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        let ctx = TaskContext::new(task(json!({}))).with_clock(Arc::new(ManualClock::new(pinned)));
        assert_eq!(ctx.now(), pinned);
    }

    #[test]
    fn test_task_result_from_result() {
        let ok: TaskResult = Ok::<_, Error>(json!({ "tags": [] })).into();
        assert!(ok.is_success());

        let err: TaskResult = Err::<JsonValue, _>(Error::IdeaNotFound(Uuid::nil())).into();
        assert_eq!(
            err,
            TaskResult::Failed(format!("Idea not found: {}", Uuid::nil()))
        );
    }

    #[tokio::test]
    async fn test_noop_handler() {
        let handler = NoOpHandler::new(TaskKind::AnalyzeIdea);
        assert!(handler.can_handle(TaskKind::AnalyzeIdea));

        let result = handler.execute(TaskContext::new(task(json!({})))).await;
        assert_eq!(result, TaskResult::Success(None));
    }
}
