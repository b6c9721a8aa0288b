use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::dto::{
    CreateCommentRequest, CreateTaskRequest, MoveTaskRequest, ReorderTaskRequest, UpdateTaskRequest,
};
use crate::api::AppState;
use crate::domain::{Comment, KanbanError, Task};
use crate::services::MoveOutcome;

pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    Json(state.sync.tasks().await)
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), KanbanError> {
    let task = state.sync.create_task(req.into_task()).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, KanbanError> {
    let task = state
        .sync
        .get_task_by_id(&id)
        .await?
        .ok_or_else(|| KanbanError::NotFound(format!("task {}", id)))?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, KanbanError> {
    let mut task = state
        .sync
        .get_task_by_id(&id)
        .await?
        .ok_or_else(|| KanbanError::NotFound(format!("task {}", id)))?;

    req.apply_to(&mut task);
    let task = state.sync.update_task(&task).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, KanbanError> {
    state.sync.delete_task(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn move_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MoveTaskRequest>,
) -> Result<Json<MoveOutcome>, KanbanError> {
    let outcome = state.sync.move_task_to_column(&id, &req.column_id).await?;
    Ok(Json(outcome))
}

pub async fn reorder_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReorderTaskRequest>,
) -> Result<Json<MoveOutcome>, KanbanError> {
    let outcome = match (req.target_task_id, req.index) {
        (Some(target), _) => state.sync.reorder_task(&id, &target).await?,
        (None, Some(index)) => state.sync.move_task_to_index(&id, index).await?,
        (None, None) => {
            return Err(KanbanError::Validation(
                "either targetTaskId or index is required".into(),
            ))
        }
    };
    Ok(Json(outcome))
}

pub async fn move_task_to_top(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MoveOutcome>, KanbanError> {
    Ok(Json(state.sync.move_task_to_top(&id).await?))
}

pub async fn move_task_to_bottom(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MoveOutcome>, KanbanError> {
    Ok(Json(state.sync.move_task_to_bottom(&id).await?))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), KanbanError> {
    let author = req
        .author
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| state.config.owner_id.clone());

    let comment = state
        .sync
        .add_comment(&id, &req.text, &author, req.author_avatar)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode, KanbanError> {
    state.sync.remove_comment(&id, &comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
