//! Processing Ledger HTTP Handlers
//!
//! Users read their own history; platform services record processing through
//! the internal ingest endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::error::ProcessingError;
use super::types::{DataProcessingRecord, RecordProcessing};
use crate::api::AppState;
use crate::auth::AuthUser;

/// List the current user's processing records.
#[utoipa::path(
    get,
    path = "/api/me/processing-records",
    responses(
        (status = 200, description = "Processing history", body = [DataProcessingRecord]),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %auth.id))]
pub async fn list_processing_records(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<DataProcessingRecord>>, ProcessingError> {
    let records = state.ledger.get_processing_records(auth.id).await?;
    Ok(Json(records))
}

/// Record a processing operation (platform services only).
#[utoipa::path(
    post,
    path = "/api/internal/processing",
    request_body = RecordProcessing,
    responses(
        (status = 201, description = "Record appended", body = DataProcessingRecord),
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn record_processing(
    State(state): State<AppState>,
    Json(body): Json<RecordProcessing>,
) -> Result<impl IntoResponse, ProcessingError> {
    let record = state.ledger.record_data_processing(body).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
