//! Processing Record Types

use chrono::{DateTime, Utc};
use dp_common::{DataCategory, LawfulBasis, ProcessingPurpose};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// One entry in the data processing ledger.
///
/// Never mutated after creation, except the `is_anonymized` flag which flips
/// exactly once during the erasure workflow.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DataProcessingRecord {
    /// Record id.
    pub id: Uuid,
    /// User whose data was processed.
    pub user_id: Uuid,
    /// Category of data touched.
    #[schema(value_type = String)]
    pub data_category: DataCategory,
    /// Purpose of the processing.
    #[schema(value_type = String)]
    pub purpose: ProcessingPurpose,
    /// Article 6 justification.
    #[schema(value_type = String)]
    pub lawful_basis: LawfulBasis,
    /// When the processing happened.
    pub processing_date: DateTime<Utc>,
    /// When the record may be purged.
    pub data_retention_until: DateTime<Utc>,
    /// Set once when the user's identity is scrubbed during erasure.
    pub is_anonymized: bool,
    /// Hex sha256 over the record's content fields.
    pub audit_hash: String,
}

impl DataProcessingRecord {
    /// Recompute the audit hash from the record's own fields.
    ///
    /// `is_anonymized` and the hash itself are excluded so the one-way
    /// anonymization flip does not invalidate the hash.
    #[must_use]
    pub fn compute_audit_hash(&self) -> String {
        // json! object keys are sorted, so the serialization is canonical.
        let content = json!({
            "id": self.id,
            "user_id": self.user_id,
            "data_category": self.data_category,
            "purpose": self.purpose,
            "lawful_basis": self.lawful_basis,
            "processing_date": self.processing_date,
            "data_retention_until": self.data_retention_until,
        });

        let mut hasher = Sha256::new();
        hasher.update(content.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Whether the stored hash matches the record content.
    #[must_use]
    pub fn verify_audit_hash(&self) -> bool {
        self.audit_hash == self.compute_audit_hash()
    }
}

/// Input for recording a processing operation.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct RecordProcessing {
    /// User whose data is processed.
    pub user_id: Uuid,
    /// Category of data touched.
    #[schema(value_type = String)]
    pub data_category: DataCategory,
    /// Purpose of the processing.
    #[schema(value_type = String)]
    pub purpose: ProcessingPurpose,
    /// Article 6 justification.
    #[schema(value_type = String)]
    pub lawful_basis: LawfulBasis,
    /// Retention override; defaults to seven years from now.
    pub data_retention_until: Option<DateTime<Utc>>,
}
