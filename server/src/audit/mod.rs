//! Audit Log
//!
//! Append-only log of every consent, processing, request and erasure event.
//! Each entry carries a content hash over its action, user and details so
//! post-hoc tampering with an individual entry is detectable. The log is not
//! chained: deletions across entries are out of scope for this trail.
//!
//! Write-mostly by design — there is no HTTP read surface; [`AuditLog::entries`]
//! exists for compliance tooling and tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::storage::{self, SecureStorage, StorageError, AUDIT_KEY};

/// Actions that produce an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A consent choice was recorded or superseded.
    ConsentRecorded,
    /// Personal data was processed.
    DataProcessed,
    /// A data subject request was submitted.
    DataSubjectRequest,
    /// A data subject request changed status.
    DataSubjectRequestUpdated,
    /// A user's data was erased.
    DataErased,
    /// An erasure attempt failed partway.
    DataErasureError,
    /// An access export was generated.
    DataExport,
    /// A portability export was generated.
    DataPortabilityExport,
    /// A privacy policy version was accepted.
    PrivacyPolicyAccepted,
    /// A data breach was recorded in the register.
    DataBreachRecorded,
}

impl AuditAction {
    /// Stable string form, part of the hashed content.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConsentRecorded => "CONSENT_RECORDED",
            Self::DataProcessed => "DATA_PROCESSED",
            Self::DataSubjectRequest => "DATA_SUBJECT_REQUEST",
            Self::DataSubjectRequestUpdated => "DATA_SUBJECT_REQUEST_UPDATED",
            Self::DataErased => "DATA_ERASED",
            Self::DataErasureError => "DATA_ERASURE_ERROR",
            Self::DataExport => "DATA_EXPORT",
            Self::DataPortabilityExport => "DATA_PORTABILITY_EXPORT",
            Self::PrivacyPolicyAccepted => "PRIVACY_POLICY_ACCEPTED",
            Self::DataBreachRecorded => "DATA_BREACH_RECORDED",
        }
    }
}

/// One audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// When the event happened.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub action: AuditAction,
    /// Affected user, absent for register-wide events (breaches).
    pub user_id: Option<Uuid>,
    /// Serialized event detail.
    pub details: serde_json::Value,
    /// Hex sha256 over action, user id and details.
    pub hash: String,
}

impl AuditLogEntry {
    /// Recompute the content hash from the entry's own fields.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        content_hash(self.action, self.user_id, &self.details)
    }

    /// Whether the stored hash matches the entry content.
    #[must_use]
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

/// Hex sha256 over `action ∥ user_id ∥ canonical-json(details)`.
///
/// `serde_json::Value` objects keep their keys sorted, so serializing the
/// details value is canonical.
fn content_hash(action: AuditAction, user_id: Option<Uuid>, details: &serde_json::Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(action.as_str().as_bytes());
    if let Some(user_id) = user_id {
        hasher.update(user_id.to_string().as_bytes());
    }
    hasher.update(details.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Append-only audit log over the secure store.
#[derive(Clone)]
pub struct AuditLog {
    store: Arc<dyn SecureStorage>,
}

impl AuditLog {
    /// Create a log writing to the given store.
    #[must_use]
    pub fn new(store: Arc<dyn SecureStorage>) -> Self {
        Self { store }
    }

    /// Append one entry.
    pub async fn append(
        &self,
        action: AuditAction,
        user_id: Option<Uuid>,
        details: serde_json::Value,
    ) -> Result<(), StorageError> {
        let entry = AuditLogEntry {
            timestamp: Utc::now(),
            action,
            user_id,
            hash: content_hash(action, user_id, &details),
            details,
        };

        let _guard = self.store.lock_key(AUDIT_KEY).await;
        let mut entries: Vec<AuditLogEntry> =
            storage::read_list(self.store.as_ref(), AUDIT_KEY).await?;
        entries.push(entry);
        storage::write_list(self.store.as_ref(), AUDIT_KEY, &entries).await?;

        tracing::debug!(action = action.as_str(), user_id = ?user_id, "Audit entry appended");
        Ok(())
    }

    /// All entries, in insertion order.
    pub async fn entries(&self) -> Result<Vec<AuditLogEntry>, StorageError> {
        storage::read_list(self.store.as_ref(), AUDIT_KEY).await
    }
}
