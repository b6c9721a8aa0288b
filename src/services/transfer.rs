//! Board export and import as a single JSON document.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{now_millis, Board, Column, KanbanError, RepoResult, Task};
use crate::repository::DataProvider;

use super::batch::run_batch;
use super::sync::BoardSync;

pub const EXPORT_VERSION: &str = "1.0";
pub const DEFAULT_BOARD_NAME: &str = "My Kanban Board";
const MAX_REPORTED_ERRORS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardDocument {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub board_name: String,
    #[serde(default)]
    pub exported_at: i64,
    pub board: Board,
}

/// Outcome of checking an import document, shown before anything is replaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub valid: bool,
    pub board_name: Option<String>,
    pub exported_at: Option<i64>,
    pub version: Option<String>,
    pub columns_count: usize,
    pub tasks_count: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub columns: usize,
    pub tasks: usize,
}

/// Builds an export document from the current cache.
pub async fn export_board(sync: &BoardSync, board_name: &str) -> BoardDocument {
    let snapshot = sync.snapshot().await;
    let board_name = match board_name.trim() {
        "" => DEFAULT_BOARD_NAME.to_string(),
        name => name.to_string(),
    };

    BoardDocument {
        version: EXPORT_VERSION.to_string(),
        board_name,
        exported_at: now_millis(),
        board: Board {
            columns: snapshot.columns,
            tasks: snapshot.tasks,
        },
    }
}

pub fn validate_document(document: &Value) -> ImportPreview {
    let Some(root) = document.as_object() else {
        return ImportPreview {
            errors: vec!["Invalid JSON format".to_string()],
            ..ImportPreview::default()
        };
    };

    let mut errors = Vec::new();
    let board = root.get("board").filter(|b| b.is_object());
    if board.is_none() {
        errors.push("Missing \"board\" property".to_string());
    }

    let columns = board.and_then(|b| b.get("columns")).and_then(Value::as_array);
    let tasks = board.and_then(|b| b.get("tasks")).and_then(Value::as_array);

    match columns {
        None => errors.push("Missing or invalid \"columns\" array".to_string()),
        Some(columns) => {
            for (idx, column) in columns.iter().enumerate() {
                let n = idx + 1;
                if !is_non_empty_str(column.get("id")) {
                    errors.push(format!("Column {}: missing or invalid id", n));
                }
                if !is_non_empty_str(column.get("name")) {
                    errors.push(format!("Column {}: missing or invalid name", n));
                }
                if !is_non_empty_str(column.get("color")) {
                    errors.push(format!("Column {}: missing or invalid color", n));
                }
                if !column.get("order").is_some_and(Value::is_number) {
                    errors.push(format!("Column {}: missing or invalid order", n));
                }
            }
        }
    }

    match tasks {
        None => errors.push("Missing or invalid \"tasks\" array".to_string()),
        Some(tasks) => {
            let column_ids: HashSet<&str> = columns
                .into_iter()
                .flatten()
                .filter_map(|c| c.get("id").and_then(Value::as_str))
                .collect();

            for (idx, task) in tasks.iter().enumerate() {
                let n = idx + 1;
                if !is_non_empty_str(task.get("id")) {
                    errors.push(format!("Task {}: missing or invalid id", n));
                }
                if !is_non_empty_str(task.get("title")) {
                    errors.push(format!("Task {}: missing or invalid title", n));
                }
                match task.get("columnId").and_then(Value::as_str).filter(|s| !s.is_empty()) {
                    None => errors.push(format!("Task {}: missing or invalid columnId", n)),
                    Some(column_id) if !column_ids.contains(column_id) => errors.push(format!(
                        "Task {}: references non-existent column {}",
                        n, column_id
                    )),
                    Some(_) => {}
                }
                if !task.get("createdAt").is_some_and(Value::is_number) {
                    errors.push(format!("Task {}: missing or invalid createdAt", n));
                }
                if !task.get("tags").is_some_and(Value::is_array) {
                    errors.push(format!("Task {}: missing or invalid tags array", n));
                }
            }
        }
    }

    if errors.len() > MAX_REPORTED_ERRORS {
        let hidden = errors.len() - MAX_REPORTED_ERRORS;
        errors.truncate(MAX_REPORTED_ERRORS);
        errors.push(format!("... and {} more errors", hidden));
    }

    ImportPreview {
        valid: errors.is_empty(),
        board_name: root.get("boardName").and_then(Value::as_str).map(str::to_string),
        exported_at: root.get("exportedAt").and_then(Value::as_i64),
        version: root.get("version").and_then(Value::as_str).map(str::to_string),
        columns_count: columns.map_or(0, Vec::len),
        tasks_count: tasks.map_or(0, Vec::len),
        errors,
    }
}

fn is_non_empty_str(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}

/// Replaces the whole board with the document's contents.
///
/// Existing tasks are deleted, then existing columns, then the imported columns and
/// tasks are created, each step one write at a time. The first failed write stops
/// the import with [`KanbanError::PartialBatch`]; the board is reloaded either way.
pub async fn import_board(sync: &BoardSync, document: &Value) -> RepoResult<ImportSummary> {
    let preview = validate_document(document);
    if !preview.valid {
        return Err(KanbanError::Validation(format!(
            "invalid board document: {}",
            preview.errors.join("; ")
        )));
    }

    let parsed: BoardDocument = serde_json::from_value(document.clone())
        .map_err(|err| KanbanError::Validation(format!("invalid board document: {}", err)))?;
    let Board { columns, tasks } = parsed.board;
    let summary = ImportSummary {
        columns: columns.len(),
        tasks: tasks.len(),
    };

    tracing::info!(
        board_name = parsed.board_name.as_str(),
        columns = summary.columns,
        tasks = summary.tasks,
        "Importing board"
    );

    let result = replace_board(Arc::clone(sync.provider()), columns, tasks).await;
    if let Err(err) = sync.refresh_all().await {
        tracing::warn!(error = %err, "Reload after import failed");
    }

    result.map(|_| summary)
}

async fn replace_board(
    provider: Arc<dyn DataProvider>,
    columns: Vec<Column>,
    tasks: Vec<Task>,
) -> RepoResult<()> {
    let existing_tasks = provider.tasks().get_tasks().await?;
    run_batch(existing_tasks, |t| t.id.clone(), |task| {
        let provider = Arc::clone(&provider);
        async move { provider.tasks().delete_task(&task.id).await }
    })
    .await?;

    let existing_columns = provider.columns().get_columns().await?;
    run_batch(existing_columns, |c| c.id.clone(), |column| {
        let provider = Arc::clone(&provider);
        async move { provider.columns().delete_column(&column.id).await }
    })
    .await?;

    run_batch(columns, |c| c.id.clone(), |column| {
        let provider = Arc::clone(&provider);
        async move { provider.columns().create_column(&column).await.map(|_| ()) }
    })
    .await?;

    run_batch(tasks, |t| t.id.clone(), |task| {
        let provider = Arc::clone(&provider);
        async move { provider.tasks().create_task(&task).await.map(|_| ()) }
    })
    .await?;

    Ok(())
}
