use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::Value;

use crate::api::dto::{BoardResponse, ExportQuery, ThemeRequest, ThemeResponse};
use crate::api::AppState;
use crate::domain::{KanbanError, PRESET_COLORS};
use crate::services::{
    export_board, import_board, validate_document, BoardDocument, ImportPreview, ImportSummary,
};

pub async fn get_board(State(state): State<AppState>) -> Json<BoardResponse> {
    let cache = state.sync.snapshot().await;
    Json(BoardResponse::new(state.sync.provider().name(), cache, PRESET_COLORS))
}

pub async fn refresh_board(State(state): State<AppState>) -> Result<Json<BoardResponse>, KanbanError> {
    state.sync.refresh_all().await?;
    Ok(get_board(State(state)).await)
}

pub async fn get_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    Json(ThemeResponse {
        theme: state.sync.theme().await,
    })
}

pub async fn set_theme(
    State(state): State<AppState>,
    Json(req): Json<ThemeRequest>,
) -> Result<Json<ThemeResponse>, KanbanError> {
    let theme = state.sync.set_theme(req.theme).await?;
    Ok(Json(ThemeResponse { theme }))
}

pub async fn toggle_theme(State(state): State<AppState>) -> Result<Json<ThemeResponse>, KanbanError> {
    let theme = state.sync.toggle_theme().await?;
    Ok(Json(ThemeResponse { theme }))
}

pub async fn export(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Json<BoardDocument> {
    let name = query.name.unwrap_or_default();
    Json(export_board(&state.sync, &name).await)
}

pub async fn validate_import(Json(document): Json<Value>) -> Json<ImportPreview> {
    Json(validate_document(&document))
}

pub async fn import(
    State(state): State<AppState>,
    Json(document): Json<Value>,
) -> Result<Json<ImportSummary>, KanbanError> {
    let summary = import_board(&state.sync, &document).await?;
    Ok(Json(summary))
}
