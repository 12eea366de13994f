//! Consent HTTP Handlers

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dp_common::{ConsentType, COOKIE_MAX_AGE_DAYS};
use validator::Validate;

use super::error::ConsentError;
use super::types::{
    AcceptPolicyRequest, BannerSubmission, ConsentRecord, ConsentStatusResponse,
    CookieConsentSummary, PolicyAcceptance, RecordConsent, UpdateConsentRequest,
};
use crate::api::{client_meta, AppState};
use crate::auth::AuthUser;

/// Name of the browser cookie mirroring the consent summary.
pub const CONSENT_COOKIE: &str = "gdpr_consent";

/// List the current user's consent records.
#[utoipa::path(
    get,
    path = "/api/me/consents",
    responses(
        (status = 200, description = "Stored consent records", body = [ConsentRecord]),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %auth.id))]
pub async fn list_consents(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ConsentRecord>>, ConsentError> {
    let records = state.consents.get_consents(auth.id).await?;
    Ok(Json(records))
}

/// Check whether one consent category is currently valid.
#[utoipa::path(
    get,
    path = "/api/me/consents/{consent_type}",
    responses(
        (status = 200, description = "Validity of the category", body = ConsentStatusResponse),
    ),
    security(("bearer_auth" = []))
)]
pub async fn consent_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(consent_type): Path<ConsentType>,
) -> Result<Json<ConsentStatusResponse>, ConsentError> {
    let valid = state.consents.has_valid_consent(auth.id, consent_type).await?;
    Ok(Json(ConsentStatusResponse {
        consent_type,
        valid,
    }))
}

/// Update a single consent category.
#[utoipa::path(
    put,
    path = "/api/me/consents/{consent_type}",
    request_body = UpdateConsentRequest,
    responses(
        (status = 200, description = "Consent recorded", body = ConsentRecord),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, body), fields(user_id = %auth.id))]
pub async fn update_consent(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path(consent_type): Path<ConsentType>,
    Json(body): Json<UpdateConsentRequest>,
) -> Result<Json<ConsentRecord>, ConsentError> {
    let (ip_address, user_agent) = client_meta(&headers);

    let record = state
        .consents
        .record_consent(RecordConsent {
            user_id: auth.id,
            consent_type,
            granted: body.granted,
            lawful_basis: body.lawful_basis,
            purposes: body.purposes,
            ip_address,
            user_agent,
        })
        .await?;

    Ok(Json(record))
}

/// Submit a full banner selection.
///
/// Records one consent per category and sets the `gdpr_consent` cookie
/// mirror (base64 JSON, 30-day expiry, same-site strict) for fast
/// synchronous reads by the client.
#[utoipa::path(
    post,
    path = "/api/me/consents",
    request_body = BannerSubmission,
    responses(
        (status = 201, description = "Banner submission recorded", body = CookieConsentSummary),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, jar, body), fields(user_id = %auth.id))]
pub async fn submit_banner(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
    headers: HeaderMap,
    Json(body): Json<BannerSubmission>,
) -> Result<impl IntoResponse, ConsentError> {
    let (ip_address, user_agent) = client_meta(&headers);

    let summary = state
        .consents
        .record_banner_submission(auth.id, body.into(), ip_address, user_agent)
        .await?;

    let payload = STANDARD.encode(serde_json::to_vec(&summary).map_err(
        crate::storage::StorageError::Encode,
    )?);

    let cookie = Cookie::build((CONSENT_COOKIE, payload))
        .path("/")
        .max_age(time::Duration::days(COOKIE_MAX_AGE_DAYS))
        .secure(state.config.secure_cookies)
        .same_site(SameSite::Strict)
        // The client reads the mirror synchronously, so it must stay
        // accessible to scripts.
        .http_only(false)
        .build();

    Ok((StatusCode::CREATED, jar.add(cookie), Json(summary)))
}

/// Get the current privacy policy acceptance.
#[utoipa::path(
    get,
    path = "/api/me/privacy-policy",
    responses(
        (status = 200, description = "Acceptance record", body = PolicyAcceptance),
        (status = 404, description = "No policy accepted yet"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_privacy_policy(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ConsentError> {
    match state.consents.get_privacy_policy(auth.id).await? {
        Some(acceptance) => Ok(Json(acceptance).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// Accept a privacy policy version.
#[utoipa::path(
    post,
    path = "/api/me/privacy-policy",
    request_body = AcceptPolicyRequest,
    responses(
        (status = 201, description = "Acceptance recorded", body = PolicyAcceptance),
        (status = 400, description = "Invalid version string"),
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, body), fields(user_id = %auth.id))]
pub async fn accept_privacy_policy(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Json(body): Json<AcceptPolicyRequest>,
) -> Result<impl IntoResponse, ConsentError> {
    body.validate()
        .map_err(|e| ConsentError::Validation(e.to_string()))?;

    let (ip_address, _) = client_meta(&headers);
    let acceptance = state
        .consents
        .accept_privacy_policy(auth.id, body.version, ip_address)
        .await?;

    Ok((StatusCode::CREATED, Json(acceptance)))
}
