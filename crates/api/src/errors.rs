use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use ingest::DeckError;
use orchestrator::{FailureInfo, FailureKind, OrchestratorError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid pitch deck: {0}")]
    InvalidDeck(#[from] DeckError),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The session is not in a state that allows the request
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An AI call failed; carries the user-facing guidance
    #[error("Upstream failure: {}", .0.message)]
    Upstream(FailureInfo),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::EmptyMessage => ApiError::BadRequest(err.to_string()),
            OrchestratorError::NotReady(_)
            | OrchestratorError::MemoInFlight
            | OrchestratorError::Superseded => ApiError::Conflict(err.to_string()),
            OrchestratorError::Memo(info) => ApiError::Upstream(info),
            OrchestratorError::Interrupted(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({"error": msg})),
            ApiError::InvalidDeck(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({"error": e.to_string()}),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({"error": msg})),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({"error": msg})),
            ApiError::Upstream(info) => {
                tracing::warn!(kind = ?info.kind, "Upstream AI failure: {}", info.message);
                let status = match info.kind {
                    FailureKind::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
                    FailureKind::MissingCredential => StatusCode::PRECONDITION_FAILED,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (
                    status,
                    json!({
                        "error": info.message,
                        "kind": info.kind,
                        "guidance": info.guidance,
                    }),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Internal server error"}),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
