use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::api::dto::{CreateColumnRequest, DeleteColumnQuery, MoveColumnRequest, UpdateColumnRequest};
use crate::api::AppState;
use crate::domain::{Column, KanbanError};
use crate::services::MoveOutcome;

pub async fn list_columns(State(state): State<AppState>) -> Json<Vec<Column>> {
    Json(state.sync.columns().await)
}

pub async fn create_column(
    State(state): State<AppState>,
    Json(req): Json<CreateColumnRequest>,
) -> Result<(StatusCode, Json<Column>), KanbanError> {
    let column = state.sync.create_column(req.into_column()).await?;
    Ok((StatusCode::CREATED, Json(column)))
}

pub async fn update_column(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateColumnRequest>,
) -> Result<Json<Column>, KanbanError> {
    let mut column = state
        .sync
        .get_column_by_id(&id)
        .await?
        .ok_or_else(|| KanbanError::NotFound(format!("column {}", id)))?;

    if let Some(name) = req.name {
        column.name = name.trim().to_string();
    }
    if let Some(color) = req.color {
        column.color = color;
    }

    let column = state.sync.update_column(&column).await?;
    Ok(Json(column))
}

pub async fn delete_column(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteColumnQuery>,
) -> Result<Json<Value>, KanbanError> {
    let deleted_tasks = state.sync.delete_column(&id, query.cascade).await?;
    Ok(Json(json!({ "deleted": id, "deletedTasks": deleted_tasks })))
}

pub async fn move_column(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MoveColumnRequest>,
) -> Result<Json<MoveOutcome>, KanbanError> {
    let outcome = state.sync.move_column(&id, &req.target_column_id).await?;
    Ok(Json(outcome))
}

/// Replaces the column sequence with the one in the body.
pub async fn reorder_columns(
    State(state): State<AppState>,
    Json(columns): Json<Vec<Column>>,
) -> Result<Json<Vec<Column>>, KanbanError> {
    let columns = state.sync.reorder_columns(columns).await?;
    Ok(Json(columns))
}
