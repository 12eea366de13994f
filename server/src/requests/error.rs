//! Subject Request Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dp_common::RequestStatus;
use serde_json::json;

use crate::processing::ProcessingError;
use crate::storage::StorageError;

/// Error types for request queue and erasure operations.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Request not found")]
    NotFound,

    #[error("Cannot transition request from {from:?} to {to:?}")]
    InvalidTransition {
        from: RequestStatus,
        to: RequestStatus,
    },

    #[error("A rejection reason is required")]
    MissingRejectionReason,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<ProcessingError> for RequestError {
    fn from(e: ProcessingError) -> Self {
        let ProcessingError::Storage(e) = e;
        Self::Storage(e)
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Self::InvalidTransition { .. } => (StatusCode::CONFLICT, self.to_string()),
            Self::MissingRejectionReason | Self::Validation(_) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            Self::Storage(e) => {
                tracing::error!(error = %e, "Request queue storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
