//! Subject Request, Contract and Erasure Types

use chrono::{DateTime, Utc};
use dp_common::{RequestStatus, RequestType};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-initiated exercise of a GDPR right.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DataSubjectRequest {
    /// Request id.
    pub id: Uuid,
    /// Requesting user.
    pub user_id: Uuid,
    /// Right being exercised.
    #[schema(value_type = String)]
    pub request_type: RequestType,
    /// Lifecycle state.
    #[schema(value_type = String)]
    pub status: RequestStatus,
    /// When the request was submitted.
    pub request_date: DateTime<Utc>,
    /// `request_date` + 30 days. Advisory; nothing transitions automatically.
    pub completion_deadline: DateTime<Utc>,
    /// When the request was completed, if it was.
    pub completed_date: Option<DateTime<Utc>>,
    /// Free-text detail supplied by the user.
    pub request_details: String,
    /// Payload attached on completion (export location, confirmation, ...).
    #[schema(value_type = Option<Object>)]
    pub response_data: Option<serde_json::Value>,
    /// Reason recorded on rejection.
    pub rejection_reason: Option<String>,
}

/// Lease contract state mirrored from the escrow platform.
///
/// Only the status matters here: users with an ACTIVE contract cannot be
/// erased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    /// Contract drafted but not signed.
    Draft,
    /// Deposit held in escrow; lease running.
    Active,
    /// Lease ended, deposit released.
    Completed,
    /// Contract cancelled before activation.
    Cancelled,
}

/// Minimal contract reference kept per user for the eligibility gate.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ContractRef {
    /// Contract id on the platform.
    pub id: Uuid,
    /// Current status.
    pub status: ContractStatus,
}

/// Non-reversible trace retained after erasure for legal audits.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AnonymizedRecord {
    /// Hex sha256 of the erased user id.
    pub original_user_id: String,
    /// When the erasure completed.
    pub erasure_date: DateTime<Utc>,
    /// Why the data was erased.
    pub reason: String,
    /// Always true; the trace exists only for compliance.
    pub retained_for_compliance: bool,
}

/// Stage of an in-flight erasure.
///
/// Persisted in the saga marker so a crash mid-erasure can be resumed from
/// the last completed stage instead of leaving a silent partial deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErasureStage {
    /// Eligibility passed; deletions not yet done.
    Started,
    /// Per-user collections removed; tombstone not yet written.
    RecordsDeleted,
    /// Anonymized trace written; final audit entry pending.
    TombstoneWritten,
}

/// Persisted marker for an erasure in progress (`erasure_marker_{user}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErasureMarker {
    /// User being erased.
    pub user_id: Uuid,
    /// Reason passed by the operator.
    pub reason: String,
    /// When the erasure began.
    pub started_at: DateTime<Utc>,
    /// Last completed stage.
    pub stage: ErasureStage,
}

/// Result of an erasure attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErasureOutcome {
    /// User holds active contracts; nothing was deleted.
    Ineligible {
        /// Number of blocking contracts.
        active_contracts: usize,
    },
    /// All stages completed.
    Completed,
}

/// Request body for submitting a data subject request.
#[derive(Debug, Deserialize, validator::Validate, utoipa::ToSchema)]
pub struct SubmitRequestBody {
    /// Right to exercise.
    #[schema(value_type = String)]
    pub request_type: RequestType,
    /// Free-text detail.
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub details: String,
}

/// Response after submitting a request.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubmitRequestResponse {
    /// Generated request id.
    pub id: Uuid,
    /// Initial status (always pending).
    #[schema(value_type = String)]
    pub status: RequestStatus,
    /// Fixed 30-day completion deadline.
    pub completion_deadline: DateTime<Utc>,
}

/// Request body for a compliance-staff status transition.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateRequestBody {
    /// Target status.
    #[schema(value_type = String)]
    pub status: RequestStatus,
    /// Payload attached when completing.
    #[schema(value_type = Option<Object>)]
    pub response_data: Option<serde_json::Value>,
    /// Reason required when rejecting.
    pub rejection_reason: Option<String>,
}

/// Request body for the operator-driven erasure endpoint.
#[derive(Debug, Deserialize, validator::Validate, utoipa::ToSchema)]
pub struct EraseUserBody {
    /// Why the data is being erased (e.g. "user_request").
    #[validate(length(min = 1, max = 200))]
    pub reason: String,
}

/// Response for the erasure eligibility check.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct EligibilityResponse {
    /// Whether erasure may proceed.
    pub eligible: bool,
    /// Number of contracts blocking erasure.
    pub active_contracts: usize,
}
