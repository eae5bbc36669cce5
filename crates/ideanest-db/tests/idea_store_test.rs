//! Tests for the idea store and its enqueue-on-write behavior.

use serde_json::json;
use uuid::Uuid;

use ideanest_db::test_fixtures::{IdeaBuilder, TestDatabase};
use ideanest_db::{
    CreateIdeaRequest, Error, IdeaRepository, IdeaSort, ListIdeasRequest, Origin, TagRepository,
    TaskKind, TaskRepository, TaskStatus, UpdateIdeaRequest,
};

#[tokio::test]
async fn test_insert_enqueues_one_analyze_task() {
    let test_db = TestDatabase::new().await;
    let idea = IdeaBuilder::new("这是一个关于工作的重要想法")
        .insert(&test_db.db)
        .await;

    let pending = test_db.db.tasks.find_pending(10).await.unwrap();
    assert_eq!(pending.len(), 1);
    let task = &pending[0];
    assert_eq!(task.kind, TaskKind::AnalyzeIdea);
    assert_eq!(task.priority, 1);
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.payload, json!({ "idea_id": idea.id }));
}

#[tokio::test]
async fn test_insert_defaults_and_manual_tags() {
    let test_db = TestDatabase::new().await;
    let idea = IdeaBuilder::new("周末去爬山")
        .tag("户外")
        .tag(" 周末 ")
        .insert(&test_db.db)
        .await;

    assert_eq!(idea.importance, 1);
    assert!(!idea.archived);

    let tags = test_db.db.ideas.tags_for(idea.id).await.unwrap();
    assert_eq!(tags, vec!["周末".to_string(), "户外".to_string()]);
}

#[tokio::test]
async fn test_insert_rejects_invalid_input_without_side_effects() {
    let test_db = TestDatabase::new().await;

    let err = test_db
        .db
        .ideas
        .insert(CreateIdeaRequest {
            content: "   ".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let err = test_db
        .db
        .ideas
        .insert(CreateIdeaRequest {
            content: "valid".to_string(),
            importance: Some(9),
            tags: vec![],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    // A bad tag rolls back the whole insert, including the task
    let err = test_db
        .db
        .ideas
        .insert(CreateIdeaRequest {
            content: "valid".to_string(),
            importance: None,
            tags: vec!["".to_string()],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    assert_eq!(test_db.db.tasks.pending_count().await.unwrap(), 0);
    let all = test_db
        .db
        .ideas
        .list(ListIdeasRequest {
            include_archived: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn test_update_enqueues_fresh_task() {
    let test_db = TestDatabase::new().await;
    let idea = IdeaBuilder::new("初稿").insert(&test_db.db).await;

    let updated = test_db
        .db
        .ideas
        .update(
            idea.id,
            UpdateIdeaRequest {
                content: Some("定稿：学习计划".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.content, "定稿：学习计划");
    assert_eq!(updated.importance, idea.importance);
    assert!(updated.updated_at >= idea.updated_at);
    assert_eq!(test_db.db.tasks.pending_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_update_validation_and_missing_idea() {
    let test_db = TestDatabase::new().await;
    let idea = IdeaBuilder::new("内容").insert(&test_db.db).await;

    let err = test_db
        .db
        .ideas
        .update(idea.id, UpdateIdeaRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let missing = Uuid::new_v4();
    let err = test_db
        .db
        .ideas
        .update(
            missing,
            UpdateIdeaRequest {
                importance: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::IdeaNotFound(id) if id == missing));

    // Only the insert enqueued anything
    assert_eq!(test_db.db.tasks.pending_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_replaces_manual_tags_and_keeps_automated() {
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;
    let idea = IdeaBuilder::new("项目复盘")
        .tag("旧标签")
        .tag("保留")
        .insert(db)
        .await;

    // Simulate an enrichment pass having added an automated tag
    let automated = db.tags.resolve("项目").await.unwrap();
    db.tags
        .attach(idea.id, automated.id, Origin::Automated)
        .await
        .unwrap();

    db.ideas
        .update(
            idea.id,
            UpdateIdeaRequest {
                tags: Some(vec!["保留".to_string(), "新标签".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(
        db.ideas.tags_for(idea.id).await.unwrap(),
        vec!["保留".to_string(), "新标签".to_string(), "项目".to_string()]
    );
    assert_eq!(db.tasks.pending_count().await.unwrap(), 2);

    // An empty set clears every manual tag
    db.ideas
        .update(
            idea.id,
            UpdateIdeaRequest {
                tags: Some(Vec::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(
        db.ideas.tags_for(idea.id).await.unwrap(),
        vec!["项目".to_string()]
    );
}

#[tokio::test]
async fn test_update_with_invalid_tag_rolls_back() {
    let test_db = TestDatabase::new().await;
    let db = &test_db.db;
    let idea = IdeaBuilder::new("内容").tag("原有").insert(db).await;

    let err = db
        .ideas
        .update(
            idea.id,
            UpdateIdeaRequest {
                content: Some("新内容".to_string()),
                tags: Some(vec!["ok".to_string(), "  ".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let stored = db.ideas.get(idea.id).await.unwrap().unwrap();
    assert_eq!(stored.content, "内容");
    assert_eq!(
        db.ideas.tags_for(idea.id).await.unwrap(),
        vec!["原有".to_string()]
    );
    assert_eq!(db.tasks.pending_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_update_can_archive_and_restore() {
    let test_db = TestDatabase::new().await;
    let idea = IdeaBuilder::new("可恢复").insert(&test_db.db).await;

    let archived = test_db
        .db
        .ideas
        .update(
            idea.id,
            UpdateIdeaRequest {
                archived: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(archived.archived);

    let restored = test_db
        .db
        .ideas
        .update(
            idea.id,
            UpdateIdeaRequest {
                archived: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!restored.archived);
    assert_eq!(restored.content, "可恢复");
}

#[tokio::test]
async fn test_archive_hides_idea_from_default_listing() {
    let test_db = TestDatabase::new().await;
    let kept = IdeaBuilder::new("保留").insert(&test_db.db).await;
    let archived = IdeaBuilder::new("归档").archived().insert(&test_db.db).await;

    let visible = test_db
        .db
        .ideas
        .list(ListIdeasRequest::default())
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, kept.id);

    let all = test_db
        .db
        .ideas
        .list(ListIdeasRequest {
            include_archived: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    // Archived ideas are still retrievable by id
    let fetched = test_db.db.ideas.get(archived.id).await.unwrap().unwrap();
    assert!(fetched.archived);

    let err = test_db.db.ideas.archive(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, Error::IdeaNotFound(_)));
}

#[tokio::test]
async fn test_list_sort_filter_and_search() {
    let test_db = TestDatabase::new().await;
    let first = IdeaBuilder::new("读书笔记 100%")
        .importance(2)
        .tag("阅读")
        .insert(&test_db.db)
        .await;
    let second = IdeaBuilder::new("健身计划")
        .importance(5)
        .insert(&test_db.db)
        .await;
    let third = IdeaBuilder::new("阅读清单")
        .importance(2)
        .tag("阅读")
        .insert(&test_db.db)
        .await;

    let newest = test_db
        .db
        .ideas
        .list(ListIdeasRequest::default())
        .await
        .unwrap();
    let ids: Vec<Uuid> = newest.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);

    let oldest = test_db
        .db
        .ideas
        .list(ListIdeasRequest {
            sort: IdeaSort::Oldest,
            limit: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    let ids: Vec<Uuid> = oldest.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);

    let by_importance = test_db
        .db
        .ideas
        .list(ListIdeasRequest {
            sort: IdeaSort::Importance,
            ..Default::default()
        })
        .await
        .unwrap();
    let ids: Vec<Uuid> = by_importance.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![second.id, third.id, first.id]);

    let tagged = test_db
        .db
        .ideas
        .list(ListIdeasRequest {
            tag: Some("阅读".to_string()),
            sort: IdeaSort::Oldest,
            ..Default::default()
        })
        .await
        .unwrap();
    let ids: Vec<Uuid> = tagged.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![first.id, third.id]);

    // `%` is matched literally
    let searched = test_db
        .db
        .ideas
        .list(ListIdeasRequest {
            search: Some("100%".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(searched.len(), 1);
    assert_eq!(searched[0].id, first.id);
}

#[tokio::test]
async fn test_find_by_tags_excluding() {
    let test_db = TestDatabase::new().await;
    let source = IdeaBuilder::new("source").tag("学习").insert(&test_db.db).await;
    let a = IdeaBuilder::new("a").tag("学习").insert(&test_db.db).await;
    let b = IdeaBuilder::new("b")
        .tag("生活")
        .tag("学习")
        .insert(&test_db.db)
        .await;
    IdeaBuilder::new("archived")
        .tag("学习")
        .archived()
        .insert(&test_db.db)
        .await;
    IdeaBuilder::new("unrelated").tag("旅行").insert(&test_db.db).await;

    let tags = vec!["学习".to_string(), "生活".to_string()];
    let found = test_db
        .db
        .ideas
        .find_by_tags_excluding(&tags, source.id, 5)
        .await
        .unwrap();
    let ids: Vec<Uuid> = found.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![a.id, b.id], "oldest first, no duplicates, no source");

    let limited = test_db
        .db
        .ideas
        .find_by_tags_excluding(&tags, source.id, 1)
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, a.id);
}

#[tokio::test]
async fn test_find_by_tags_excluding_empty_set_matches_nothing() {
    let test_db = TestDatabase::new().await;
    let source = IdeaBuilder::new("source").insert(&test_db.db).await;
    IdeaBuilder::new("other").tag("学习").insert(&test_db.db).await;

    let found = test_db
        .db
        .ideas
        .find_by_tags_excluding(&[], source.id, 5)
        .await
        .unwrap();
    assert!(found.is_empty());
}
