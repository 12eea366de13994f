//! Data Breach Register
//!
//! Article 33 register of personal data breaches. Recording a breach stamps
//! the 72-hour authority notification deadline; notification itself happens
//! outside this service and is marked back in.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, Utc};
use dp_common::DataCategory;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::api::AppState;
use crate::audit::{AuditAction, AuditLog};
use crate::storage::{self, SecureStorage, StorageError, DATA_BREACHES_KEY};

/// Hours after detection within which the supervisory authority must be
/// notified (GDPR art. 33(1)).
pub const AUTHORITY_NOTIFICATION_HOURS: i64 = 72;

/// Breach severity, set by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BreachSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// One register entry.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DataBreach {
    /// Register entry id.
    pub id: Uuid,
    /// What happened.
    pub description: String,
    /// Reporter-assessed severity.
    pub severity: BreachSeverity,
    /// Data categories involved.
    #[schema(value_type = Vec<String>)]
    pub data_categories: Vec<DataCategory>,
    /// Estimated number of affected users.
    pub affected_users: u64,
    /// When the breach was detected.
    pub detected_at: DateTime<Utc>,
    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
    /// `detected_at` + 72 hours.
    pub authority_deadline: DateTime<Utc>,
    /// Whether the supervisory authority has been notified.
    pub reported_to_authority: bool,
}

/// Request body for recording a breach.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct RecordBreachBody {
    /// What happened.
    #[validate(length(min = 1, max = 4000))]
    pub description: String,
    /// Reporter-assessed severity.
    pub severity: BreachSeverity,
    /// Data categories involved.
    #[schema(value_type = Vec<String>)]
    #[serde(default)]
    pub data_categories: Vec<DataCategory>,
    /// Estimated number of affected users.
    #[serde(default)]
    pub affected_users: u64,
    /// When the breach was detected; defaults to now.
    pub detected_at: Option<DateTime<Utc>>,
}

/// Error types for register operations.
#[derive(Debug, thiserror::Error)]
pub enum BreachError {
    #[error("Breach not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for BreachError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::Storage(e) => {
                tracing::error!(error = %e, "Breach register storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Breach register over the secure store.
#[derive(Clone)]
pub struct BreachRegister {
    store: Arc<dyn SecureStorage>,
    audit: AuditLog,
}

impl BreachRegister {
    /// Create a register sharing the given storage and audit log.
    #[must_use]
    pub fn new(store: Arc<dyn SecureStorage>, audit: AuditLog) -> Self {
        Self { store, audit }
    }

    /// Record a breach and stamp its notification deadline.
    pub async fn record(&self, body: RecordBreachBody) -> Result<DataBreach, BreachError> {
        let now = Utc::now();
        let detected_at = body.detected_at.unwrap_or(now);

        let breach = DataBreach {
            id: Uuid::now_v7(),
            description: body.description,
            severity: body.severity,
            data_categories: body.data_categories,
            affected_users: body.affected_users,
            detected_at,
            recorded_at: now,
            authority_deadline: detected_at + Duration::hours(AUTHORITY_NOTIFICATION_HOURS),
            reported_to_authority: false,
        };

        {
            let _guard = self.store.lock_key(DATA_BREACHES_KEY).await;
            let mut breaches: Vec<DataBreach> =
                storage::read_list(self.store.as_ref(), DATA_BREACHES_KEY).await?;
            breaches.push(breach.clone());
            storage::write_list(self.store.as_ref(), DATA_BREACHES_KEY, &breaches).await?;
        }

        self.audit
            .append(
                AuditAction::DataBreachRecorded,
                None,
                json!({
                    "breach_id": breach.id,
                    "severity": breach.severity,
                    "affected_users": breach.affected_users,
                    "authority_deadline": breach.authority_deadline,
                }),
            )
            .await?;

        tracing::warn!(
            breach_id = %breach.id,
            severity = ?breach.severity,
            affected_users = breach.affected_users,
            "Data breach recorded"
        );

        Ok(breach)
    }

    /// All register entries, in recording order.
    pub async fn list(&self) -> Result<Vec<DataBreach>, BreachError> {
        let breaches = storage::read_list(self.store.as_ref(), DATA_BREACHES_KEY).await?;
        Ok(breaches)
    }

    /// Mark a breach as reported to the supervisory authority.
    pub async fn mark_reported(&self, breach_id: Uuid) -> Result<DataBreach, BreachError> {
        let _guard = self.store.lock_key(DATA_BREACHES_KEY).await;
        let mut breaches: Vec<DataBreach> =
            storage::read_list(self.store.as_ref(), DATA_BREACHES_KEY).await?;

        let breach = breaches
            .iter_mut()
            .find(|b| b.id == breach_id)
            .ok_or(BreachError::NotFound)?;
        breach.reported_to_authority = true;
        let updated = breach.clone();

        storage::write_list(self.store.as_ref(), DATA_BREACHES_KEY, &breaches).await?;
        Ok(updated)
    }
}

/// Record a breach (internal).
#[utoipa::path(
    post,
    path = "/api/internal/breaches",
    request_body = RecordBreachBody,
    responses(
        (status = 201, description = "Breach recorded", body = DataBreach),
        (status = 400, description = "Invalid request body"),
    )
)]
#[tracing::instrument(skip(state, body))]
pub async fn record_breach(
    State(state): State<AppState>,
    Json(body): Json<RecordBreachBody>,
) -> Result<impl IntoResponse, BreachError> {
    body.validate()
        .map_err(|e| BreachError::Validation(e.to_string()))?;

    let breach = state.breaches.record(body).await?;
    Ok((StatusCode::CREATED, Json(breach)))
}

/// List the register (internal).
#[utoipa::path(
    get,
    path = "/api/internal/breaches",
    responses(
        (status = 200, description = "Register entries", body = [DataBreach]),
    )
)]
pub async fn list_breaches(
    State(state): State<AppState>,
) -> Result<Json<Vec<DataBreach>>, BreachError> {
    let breaches = state.breaches.list().await?;
    Ok(Json(breaches))
}

/// Mark a breach as reported to the authority (internal).
#[utoipa::path(
    post,
    path = "/api/internal/breaches/{id}/reported",
    responses(
        (status = 200, description = "Updated entry", body = DataBreach),
        (status = 404, description = "Unknown breach id"),
    )
)]
pub async fn mark_breach_reported(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DataBreach>, BreachError> {
    let breach = state.breaches.mark_reported(id).await?;
    Ok(Json(breach))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn register() -> BreachRegister {
        let backing: Arc<dyn SecureStorage> = Arc::new(MemoryStorage::new());
        let audit = AuditLog::new(backing.clone());
        BreachRegister::new(backing, audit)
    }

    fn body() -> RecordBreachBody {
        RecordBreachBody {
            description: "Misdirected deposit statement email".into(),
            severity: BreachSeverity::Medium,
            data_categories: vec![DataCategory::Financial],
            affected_users: 3,
            detected_at: None,
        }
    }

    #[tokio::test]
    async fn deadline_is_72_hours_after_detection() {
        let register = register();
        let breach = register.record(body()).await.unwrap();

        assert_eq!(
            breach.authority_deadline - breach.detected_at,
            Duration::hours(72)
        );
        assert!(!breach.reported_to_authority);
    }

    #[tokio::test]
    async fn marking_reported_flips_the_flag() {
        let register = register();
        let breach = register.record(body()).await.unwrap();

        let updated = register.mark_reported(breach.id).await.unwrap();
        assert!(updated.reported_to_authority);

        let err = register.mark_reported(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, BreachError::NotFound));
    }
}
