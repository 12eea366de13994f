//! Consent Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::storage::StorageError;

/// Error types for consent operations.
#[derive(Debug, thiserror::Error)]
pub enum ConsentError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ConsentError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::Storage(e) => {
                tracing::error!(error = %e, "Consent storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
