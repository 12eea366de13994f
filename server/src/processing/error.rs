//! Processing Ledger Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::storage::StorageError;

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ProcessingError {
    fn into_response(self) -> Response {
        let Self::Storage(e) = &self;
        tracing::error!(error = %e, "Processing ledger storage error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response()
    }
}
