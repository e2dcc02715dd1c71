//! Maps domain errors onto HTTP status codes and JSON bodies.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::error;

use crate::engine::EngineError;
use crate::labinfo::LabInfoError;

use super::HTTP_TARGET;

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Engine operation failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Lab info operation failed.
    #[error(transparent)]
    LabInfo(#[from] LabInfoError),
    /// The request body is not JSON.
    #[error("request body is not valid JSON: {0}")]
    Body(#[source] serde_json::Error),
    /// The blocking worker running the operation did not complete.
    #[error("request worker failed: {0}")]
    Worker(#[from] JoinError),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    reason: &'static str,
}

impl ApiError {
    fn status_and_reason(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Engine(EngineError::NotStarted) | Self::LabInfo(LabInfoError::NotFound) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            Self::LabInfo(LabInfoError::Validation) | Self::Body(_) => {
                (StatusCode::BAD_REQUEST, "validation")
            }
            Self::Engine(EngineError::Launch { .. } | EngineError::DefaultConfig { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "launch")
            }
            Self::Engine(EngineError::Store(_))
            | Self::LabInfo(LabInfoError::Store(_))
            | Self::Worker(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason) = self.status_and_reason();
        if status.is_server_error() {
            error!(target: HTTP_TARGET, reason, error = %self, "request failed");
        }
        let body = ErrorBody {
            message: self.to_string(),
            reason,
        };
        (status, Json(body)).into_response()
    }
}
