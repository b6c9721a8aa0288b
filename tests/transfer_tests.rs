mod common;

use std::sync::Arc;

use common::{column, sync_over, task, MemoryProvider};
use kanban_sync::domain::{Column, ErrorKind, KanbanError, Priority, Task};
use kanban_sync::infrastructure::EmbeddedProvider;
use kanban_sync::services::{export_board, import_board, validate_document, BoardSync, EXPORT_VERSION};
use serde_json::json;

fn sorted(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| a.id.cmp(&b.id));
    tasks
}

async fn populated_board() -> Arc<BoardSync> {
    let mut tasks = vec![
        task("t1", "todo", Some(0), 1_000),
        task("t2", "todo", Some(1), 2_000),
        task("t3", "todo", Some(2), 3_000),
        task("t4", "done", Some(0), 4_000),
        task("t5", "done", Some(1), 5_000),
    ];
    tasks[0].tags = vec!["ui".into(), "bug".into()];
    tasks[0].priority = Priority::Critical;
    tasks[1].priority = Priority::Low;
    tasks[2].add_comment("Needs a test", "alice", Some("https://avatars.example/alice.png".into()));
    tasks[3].points = 8;
    tasks[4].description = "Shipped in 1.2".into();

    let provider = MemoryProvider::seeded(
        vec![column("todo", "To Do", 0), column("done", "Done", 1)],
        tasks,
    );
    let sync = sync_over(provider);
    sync.initialize().await.unwrap();
    sync
}

#[tokio::test]
async fn test_export_then_import_reproduces_board() {
    let source = populated_board().await;
    let document = export_board(&source, "Sprint 12").await;
    assert_eq!(document.version, EXPORT_VERSION);
    assert_eq!(document.board_name, "Sprint 12");

    let value = serde_json::to_value(&document).unwrap();
    assert!(validate_document(&value).valid);

    let target = Arc::new(BoardSync::new(Arc::new(
        EmbeddedProvider::open("sqlite::memory:").await.unwrap(),
    )));
    target.initialize().await.unwrap();

    let summary = import_board(&target, &value).await.unwrap();
    assert_eq!(summary.columns, 2);
    assert_eq!(summary.tasks, 5);

    assert_eq!(target.columns().await, source.columns().await);
    assert_eq!(sorted(target.tasks().await), sorted(source.tasks().await));
}

#[tokio::test]
async fn test_import_replaces_existing_board() {
    let provider = MemoryProvider::seeded(
        vec![column("old", "Old", 0)],
        vec![task("stale", "old", Some(0), 1)],
    );
    let target = sync_over(provider.clone());
    target.initialize().await.unwrap();

    let document = json!({
        "version": "1.0",
        "boardName": "Fresh",
        "exportedAt": 1_700_000_000_000i64,
        "board": {
            "columns": [{"id": "new", "name": "New", "color": "teal", "order": 0}],
            "tasks": [{"id": "n1", "title": "First", "columnId": "new", "createdAt": 5, "tags": []}]
        }
    });
    import_board(&target, &document).await.unwrap();

    let ids: Vec<_> = provider.stored_tasks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["n1"]);
    let columns: Vec<_> = provider.stored_columns().into_iter().map(|c| c.id).collect();
    assert_eq!(columns, vec!["new"]);
    assert_eq!(target.tasks().await[0].order, Some(0));
}

#[tokio::test]
async fn test_invalid_document_changes_nothing() {
    let provider = MemoryProvider::seeded(vec![column("keep", "Keep", 0)], Vec::new());
    let target = sync_over(provider.clone());

    let err = import_board(&target, &json!({"board": {"columns": []}}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("\"tasks\" array"));
    assert_eq!(provider.stored_columns().len(), 1);
}

#[tokio::test]
async fn test_failed_import_stops_with_partial_batch() {
    let provider = MemoryProvider::seeded(
        vec![column("old", "Old", 0)],
        vec![task("s1", "old", Some(0), 1), task("s2", "old", Some(1), 2)],
    );
    let target = sync_over(provider.clone());
    target.initialize().await.unwrap();
    provider.set(&provider.fail_writes, true);

    let document = serde_json::to_value(export_board(&*populated_board().await, "").await).unwrap();
    let err = import_board(&target, &document).await.unwrap_err();

    match err {
        KanbanError::PartialBatch {
            applied,
            failed_id,
            remaining,
            ..
        } => {
            assert_eq!(applied, 0);
            assert_eq!(failed_id, "s1");
            assert_eq!(remaining, vec!["s2".to_string()]);
        }
        other => panic!("expected partial batch, got {:?}", other),
    }
    assert_eq!(provider.stored_tasks().len(), 2);
}

#[tokio::test]
async fn test_blank_export_name_gets_default() {
    let source = populated_board().await;
    let document = export_board(&source, "  ").await;
    assert_eq!(document.board_name, "My Kanban Board");
    assert_eq!(document.board.tasks.len(), 5);
}

#[tokio::test]
async fn test_column_at_max_order_blocks_new_columns_without_panicking() {
    let provider = MemoryProvider::seeded(Vec::new(), Vec::new());
    let target = sync_over(provider.clone());
    target.initialize().await.unwrap();

    let document = json!({
        "version": "1.0",
        "boardName": "Edge",
        "exportedAt": 1_700_000_000_000i64,
        "board": {
            "columns": [{"id": "c", "name": "Last", "color": "teal", "order": i64::MAX}],
            "tasks": []
        }
    });
    import_board(&target, &document).await.unwrap();

    let err = target
        .create_column(Column::new("Overflow", "red"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(provider.stored_columns().len(), 1);

    let reordered = target.reorder_columns(target.columns().await).await.unwrap();
    assert_eq!(reordered[0].order, 0);
    let created = target.create_column(Column::new("Next", "red")).await.unwrap();
    assert_eq!(created.order, 1);
}
