//! Subject Request HTTP Handlers
//!
//! User-facing endpoints for submitting requests and pulling exports, plus
//! the internal surface compliance staff and platform services use.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::error::RequestError;
use super::export::{DataExport, PortabilityExport};
use super::types::{
    ContractRef, DataSubjectRequest, EligibilityResponse, EraseUserBody, ErasureOutcome,
    SubmitRequestBody, SubmitRequestResponse, UpdateRequestBody,
};
use crate::api::AppState;
use crate::auth::AuthUser;

/// Submit a data subject request.
#[utoipa::path(
    post,
    path = "/api/me/requests",
    request_body = SubmitRequestBody,
    responses(
        (status = 201, description = "Request queued", body = SubmitRequestResponse),
        (status = 400, description = "Invalid request body"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, body), fields(user_id = %auth.id))]
pub async fn submit_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SubmitRequestBody>,
) -> Result<impl IntoResponse, RequestError> {
    body.validate()
        .map_err(|e| RequestError::Validation(e.to_string()))?;

    let request = state
        .requests
        .submit(auth.id, body.request_type, body.details)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitRequestResponse {
            id: request.id,
            status: request.status,
            completion_deadline: request.completion_deadline,
        }),
    ))
}

/// List the current user's requests.
#[utoipa::path(
    get,
    path = "/api/me/requests",
    responses(
        (status = 200, description = "The user's requests", body = [DataSubjectRequest]),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_my_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<DataSubjectRequest>>, RequestError> {
    let requests = state.requests.list_for_user(auth.id).await?;
    Ok(Json(requests))
}

/// Generate the right-of-access export for the current user.
#[utoipa::path(
    get,
    path = "/api/me/data-export",
    responses(
        (status = 200, description = "Everything held about the user", body = DataExport),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %auth.id))]
pub async fn data_export(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DataExport>, RequestError> {
    let export = state.requests.generate_data_export(auth.id).await?;
    Ok(Json(export))
}

/// Generate the portability export for the current user.
#[utoipa::path(
    get,
    path = "/api/me/data-export/portability",
    responses(
        (status = 200, description = "Machine-readable subset", body = PortabilityExport),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %auth.id))]
pub async fn portability_export(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PortabilityExport>, RequestError> {
    let export = state.requests.generate_portability_export(auth.id).await?;
    Ok(Json(export))
}

/// List all requests (compliance staff).
#[utoipa::path(
    get,
    path = "/api/internal/requests",
    responses(
        (status = 200, description = "All requests", body = [DataSubjectRequest]),
    )
)]
pub async fn list_all_requests(
    State(state): State<AppState>,
) -> Result<Json<Vec<DataSubjectRequest>>, RequestError> {
    let requests = state.requests.list().await?;
    Ok(Json(requests))
}

/// Transition a request's status (compliance staff).
#[utoipa::path(
    patch,
    path = "/api/internal/requests/{id}",
    request_body = UpdateRequestBody,
    responses(
        (status = 200, description = "Updated request", body = DataSubjectRequest),
        (status = 404, description = "Unknown request id"),
        (status = 409, description = "Transition not allowed"),
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn update_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRequestBody>,
) -> Result<Json<DataSubjectRequest>, RequestError> {
    let request = state.requests.update_status(id, body).await?;
    Ok(Json(request))
}

/// Check whether a user can be erased.
#[utoipa::path(
    get,
    path = "/api/internal/users/{user_id}/erasure",
    responses(
        (status = 200, description = "Eligibility", body = EligibilityResponse),
    )
)]
pub async fn erasure_eligibility(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<EligibilityResponse>, RequestError> {
    let active_contracts = state.requests.active_contracts(user_id).await?;
    Ok(Json(EligibilityResponse {
        eligible: active_contracts == 0,
        active_contracts,
    }))
}

/// Erase a user's data (compliance staff).
#[utoipa::path(
    post,
    path = "/api/internal/users/{user_id}/erasure",
    request_body = EraseUserBody,
    responses(
        (status = 200, description = "Erasure completed"),
        (status = 409, description = "Active contracts block erasure", body = EligibilityResponse),
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn erase_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<EraseUserBody>,
) -> Result<impl IntoResponse, RequestError> {
    body.validate()
        .map_err(|e| RequestError::Validation(e.to_string()))?;

    match state.requests.erase_user_data(user_id, body.reason).await? {
        ErasureOutcome::Completed => {
            Ok((StatusCode::OK, Json(json!({ "status": "completed" }))).into_response())
        }
        ErasureOutcome::Ineligible { active_contracts } => Ok((
            StatusCode::CONFLICT,
            Json(
                serde_json::to_value(EligibilityResponse {
                    eligible: false,
                    active_contracts,
                })
                .map_err(crate::storage::StorageError::Encode)?,
            ),
        )
            .into_response()),
    }
}

/// Replace a user's contract snapshot (platform services).
#[utoipa::path(
    put,
    path = "/api/internal/users/{user_id}/contracts",
    request_body = [ContractRef],
    responses(
        (status = 204, description = "Snapshot replaced"),
    )
)]
pub async fn put_contracts(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(contracts): Json<Vec<ContractRef>>,
) -> Result<StatusCode, RequestError> {
    state.requests.set_contracts(user_id, contracts).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace a user's personal data payload (platform services).
#[utoipa::path(
    put,
    path = "/api/internal/users/{user_id}/personal-data",
    responses(
        (status = 204, description = "Payload replaced"),
    )
)]
pub async fn put_personal_data(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(data): Json<serde_json::Value>,
) -> Result<StatusCode, RequestError> {
    state.requests.set_personal_data(user_id, data).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Append one communication history entry (platform services).
#[utoipa::path(
    post,
    path = "/api/internal/users/{user_id}/communications",
    responses(
        (status = 204, description = "Entry appended"),
    )
)]
pub async fn post_communication(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(entry): Json<serde_json::Value>,
) -> Result<StatusCode, RequestError> {
    state.requests.append_communication(user_id, entry).await?;
    Ok(StatusCode::NO_CONTENT)
}
