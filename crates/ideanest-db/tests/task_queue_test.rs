//! Tests for the enrichment task queue.
//!
//! Covers:
//! - Pending selection order (priority desc, then arrival)
//! - Batch limits
//! - Atomic claim semantics
//! - Forward-only status transitions
//! - Queue statistics

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use ideanest_db::test_fixtures::TestDatabase;
use ideanest_db::{Error, TaskKind, TaskRepository, TaskStatus};

async fn queue_n(test_db: &TestDatabase, priorities: &[i32]) -> Vec<Uuid> {
    let mut ids = Vec::new();
    for (i, priority) in priorities.iter().enumerate() {
        let id = test_db
            .db
            .tasks
            .queue(TaskKind::AnalyzeIdea, json!({ "seq": i }), *priority)
            .await
            .unwrap();
        ids.push(id);
    }
    ids
}

#[tokio::test]
async fn test_find_pending_orders_by_priority_then_arrival() {
    let test_db = TestDatabase::new().await;
    let ids = queue_n(&test_db, &[1, 5, 1, 3]).await;

    let pending = test_db.db.tasks.find_pending(10).await.unwrap();
    let order: Vec<Uuid> = pending.iter().map(|t| t.id).collect();

    assert_eq!(order, vec![ids[1], ids[3], ids[0], ids[2]]);
    assert!(pending.iter().all(|t| t.status == TaskStatus::Pending));
}

#[tokio::test]
async fn test_find_pending_respects_limit() {
    let test_db = TestDatabase::new().await;
    queue_n(&test_db, &[1; 7]).await;

    assert_eq!(test_db.db.tasks.find_pending(5).await.unwrap().len(), 5);
    assert_eq!(test_db.db.tasks.find_pending(0).await.unwrap().len(), 0);
    assert_eq!(test_db.db.tasks.pending_count().await.unwrap(), 7);
}

#[tokio::test]
async fn test_queue_stores_payload_and_kind() {
    let test_db = TestDatabase::new().await;
    let idea_id = Uuid::new_v4();
    let id = test_db
        .db
        .tasks
        .queue(TaskKind::AnalyzeIdea, json!({ "idea_id": idea_id }), 1)
        .await
        .unwrap();

    let task = test_db.db.tasks.get(id).await.unwrap().unwrap();
    assert_eq!(task.kind, TaskKind::AnalyzeIdea);
    assert_eq!(task.payload, json!({ "idea_id": idea_id }));
    assert_eq!(task.priority, 1);
    assert!(task.started_at.is_none());
    assert!(task.completed_at.is_none());
}

#[tokio::test]
async fn test_claim_moves_pending_to_processing_once() {
    let test_db = TestDatabase::new().await;
    let id = queue_n(&test_db, &[1]).await[0];
    let at = Utc::now();

    let claimed = test_db.db.tasks.claim(id, at).await.unwrap().unwrap();
    assert_eq!(claimed.status, TaskStatus::Processing);
    assert_eq!(claimed.started_at, Some(at));

    // Second claimer loses the race
    assert!(test_db.db.tasks.claim(id, at).await.unwrap().is_none());
    assert!(test_db.db.tasks.find_pending(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_claim_unknown_task_is_not_found() {
    let test_db = TestDatabase::new().await;
    let missing = Uuid::new_v4();

    let err = test_db.db.tasks.claim(missing, Utc::now()).await.unwrap_err();
    assert!(matches!(err, Error::TaskNotFound(id) if id == missing));
}

#[tokio::test]
async fn test_complete_records_result_and_timestamp() {
    let test_db = TestDatabase::new().await;
    let id = queue_n(&test_db, &[1]).await[0];
    let started = Utc::now();
    let finished = started + Duration::seconds(2);

    test_db.db.tasks.claim(id, started).await.unwrap();
    test_db
        .db
        .tasks
        .complete(id, finished, Some(json!({ "tags": ["工作"] })))
        .await
        .unwrap();

    let task = test_db.db.tasks.get(id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.completed_at, Some(finished));
    assert_eq!(task.result, Some(json!({ "tags": ["工作"] })));
    assert!(task.error_message.is_none());
}

#[tokio::test]
async fn test_fail_records_error_message() {
    let test_db = TestDatabase::new().await;
    let id = queue_n(&test_db, &[1]).await[0];

    test_db.db.tasks.claim(id, Utc::now()).await.unwrap();
    test_db
        .db
        .tasks
        .fail(id, Utc::now(), "Idea not found")
        .await
        .unwrap();

    let task = test_db.db.tasks.get(id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error_message.as_deref(), Some("Idea not found"));
    assert!(task.completed_at.is_some());
}

#[tokio::test]
async fn test_complete_requires_processing() {
    let test_db = TestDatabase::new().await;
    let id = queue_n(&test_db, &[1]).await[0];

    let err = test_db
        .db
        .tasks
        .complete(id, Utc::now(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTransition {
            from: TaskStatus::Pending,
            to: TaskStatus::Completed
        }
    ));

    let task = test_db.db.tasks.get(id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
}

#[tokio::test]
async fn test_terminal_tasks_never_change() {
    let test_db = TestDatabase::new().await;
    let id = queue_n(&test_db, &[1]).await[0];

    test_db.db.tasks.claim(id, Utc::now()).await.unwrap();
    test_db.db.tasks.fail(id, Utc::now(), "boom").await.unwrap();

    let err = test_db
        .db
        .tasks
        .complete(id, Utc::now(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidTransition {
            from: TaskStatus::Failed,
            to: TaskStatus::Completed
        }
    ));

    // A failed task is not claimable again
    assert!(test_db.db.tasks.claim(id, Utc::now()).await.unwrap().is_none());

    let task = test_db.db.tasks.get(id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert_eq!(task.error_message.as_deref(), Some("boom"));
}

#[tokio::test]
async fn test_finish_unknown_task_is_not_found() {
    let test_db = TestDatabase::new().await;
    let err = test_db
        .db
        .tasks
        .fail(Uuid::new_v4(), Utc::now(), "x")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TaskNotFound(_)));
}

#[tokio::test]
async fn test_queue_stats_and_recent() {
    let test_db = TestDatabase::new().await;
    let ids = queue_n(&test_db, &[1, 1, 1, 1]).await;

    test_db.db.tasks.claim(ids[0], Utc::now()).await.unwrap();
    test_db.db.tasks.claim(ids[1], Utc::now()).await.unwrap();
    test_db
        .db
        .tasks
        .complete(ids[1], Utc::now(), None)
        .await
        .unwrap();
    test_db.db.tasks.claim(ids[2], Utc::now()).await.unwrap();
    test_db.db.tasks.fail(ids[2], Utc::now(), "x").await.unwrap();

    let stats = test_db.db.tasks.queue_stats().await.unwrap();
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.processing, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.total, 4);

    let recent = test_db.db.tasks.list_recent(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].id, ids[3]);
    assert_eq!(recent[1].id, ids[2]);
}
