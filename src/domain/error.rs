use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Result returned by every repository and sync operation. Not-found lookups are
/// `Ok(None)`, never an error.
pub type RepoResult<T> = Result<T, KanbanError>;

#[derive(Debug, thiserror::Error)]
pub enum KanbanError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("backend error{}: {message}", code_suffix(.code))]
    Backend {
        code: Option<String>,
        message: String,
    },

    #[error("connectivity error: {0}")]
    Connectivity(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A sequential write batch stopped at `failed_id`. Writes before it were applied,
    /// `remaining` were never issued.
    #[error("batch stopped after {applied} write(s) at {failed_id}: {source}")]
    PartialBatch {
        applied: usize,
        failed_id: String,
        remaining: Vec<String>,
        #[source]
        source: Box<KanbanError>,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Backend,
    Connectivity,
    Config,
    PartialBatch,
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref()
        .map(|c| format!(" [{c}]"))
        .unwrap_or_default()
}

/// Serializable error half of an operation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl KanbanError {
    pub fn backend(message: impl Into<String>) -> Self {
        KanbanError::Backend {
            code: None,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            KanbanError::Validation(_) => ErrorKind::Validation,
            KanbanError::NotFound(_) => ErrorKind::NotFound,
            KanbanError::Connectivity(_) => ErrorKind::Connectivity,
            KanbanError::Config(_) => ErrorKind::Config,
            KanbanError::PartialBatch { .. } => ErrorKind::PartialBatch,
            KanbanError::Backend { .. }
            | KanbanError::Database(_)
            | KanbanError::Serialization(_)
            | KanbanError::Http(_) => ErrorKind::Backend,
        }
    }

    pub fn info(&self) -> ErrorInfo {
        ErrorInfo {
            kind: self.kind(),
            message: self.to_string(),
        }
    }

    fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::PartialBatch => StatusCode::CONFLICT,
            ErrorKind::Connectivity => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Backend => StatusCode::BAD_GATEWAY,
            ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for KanbanError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            KanbanError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                "Internal storage error".to_string()
            }
            KanbanError::Serialization(err) => {
                tracing::error!("Serialization error: {:?}", err);
                "Internal serialization error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({
            "error": message,
            "kind": self.kind(),
            "status": status.as_u16(),
        });
        if let KanbanError::PartialBatch {
            applied, remaining, ..
        } = &self
        {
            body["applied"] = json!(applied);
            body["remaining"] = json!(remaining);
        }

        (status, axum::Json(body)).into_response()
    }
}
