pub mod board;
pub mod columns;
pub mod sse;
pub mod tasks;

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::api::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "provider": state.sync.provider().name(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
