//! Access and Portability Exports
//!
//! Versioned export envelopes backing the right of access (everything held
//! about the user, human-auditable) and the right to data portability (the
//! machine-readable subset the user can carry to another provider).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::error::RequestError;
use super::queue::SubjectRequestQueue;
use super::types::{ContractRef, DataSubjectRequest};
use crate::audit::AuditAction;
use crate::consent::{ConsentRecord, PolicyAcceptance};
use crate::processing::DataProcessingRecord;
use crate::storage;

/// Bumped when the export envelope shape changes.
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// Right-of-access export: everything held about the user.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DataExport {
    /// Envelope format version.
    pub format_version: String,
    /// When the export was generated.
    pub generated_at: DateTime<Utc>,
    /// Exported user.
    pub user_id: Uuid,
    /// All consent records.
    pub consents: Vec<ConsentRecord>,
    /// Full processing history.
    pub processing_records: Vec<DataProcessingRecord>,
    /// The user's data subject requests.
    pub requests: Vec<DataSubjectRequest>,
    /// Ingested personal data payload, if any.
    #[schema(value_type = Option<Object>)]
    pub personal_data: Option<serde_json::Value>,
    /// Communication history entries.
    #[schema(value_type = Vec<Object>)]
    pub communication_history: Vec<serde_json::Value>,
    /// Privacy policy acceptance, if recorded.
    pub privacy_policy: Option<PolicyAcceptance>,
}

/// Right-to-portability export: the machine-readable subset a user can carry
/// to another provider. Preferences and documents are lifted out of the
/// ingested personal data payload.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PortabilityExport {
    /// Envelope format version.
    pub format_version: String,
    /// When the export was generated.
    pub generated_at: DateTime<Utc>,
    /// Exported user.
    pub user_id: Uuid,
    /// Ingested personal data payload, if any.
    #[schema(value_type = Option<Object>)]
    pub personal_data: Option<serde_json::Value>,
    /// `preferences` field of the personal data payload, if present.
    #[schema(value_type = Option<Object>)]
    pub preferences: Option<serde_json::Value>,
    /// `documents` field of the personal data payload, if present.
    #[schema(value_type = Option<Object>)]
    pub documents: Option<serde_json::Value>,
    /// Contract references mirrored from the platform.
    pub contracts: Vec<ContractRef>,
}

impl SubjectRequestQueue {
    /// Generate the right-of-access export for the user.
    pub async fn generate_data_export(&self, user_id: Uuid) -> Result<DataExport, RequestError> {
        let consents: Vec<ConsentRecord> =
            storage::read_list(self.store.as_ref(), &storage::consent_key(user_id)).await?;
        let processing_records = self.ledger.get_processing_records(user_id).await?;
        let requests = self.list_for_user(user_id).await?;
        let personal_data = self
            .store
            .get_item(&storage::personal_data_key(user_id))
            .await?;
        let communication_history =
            storage::read_list(self.store.as_ref(), &storage::communication_key(user_id)).await?;
        let privacy_policy =
            storage::read_object(self.store.as_ref(), &storage::privacy_policy_key(user_id))
                .await?;

        let export = DataExport {
            format_version: EXPORT_FORMAT_VERSION.to_string(),
            generated_at: Utc::now(),
            user_id,
            consents,
            processing_records,
            requests,
            personal_data,
            communication_history,
            privacy_policy,
        };

        self.audit
            .append(
                AuditAction::DataExport,
                Some(user_id),
                json!({
                    "format_version": export.format_version,
                    "consents": export.consents.len(),
                    "processing_records": export.processing_records.len(),
                }),
            )
            .await?;

        tracing::info!(user_id = %user_id, "Data export generated");
        Ok(export)
    }

    /// Generate the right-to-portability export for the user.
    pub async fn generate_portability_export(
        &self,
        user_id: Uuid,
    ) -> Result<PortabilityExport, RequestError> {
        let personal_data = self
            .store
            .get_item(&storage::personal_data_key(user_id))
            .await?;
        let preferences = personal_data
            .as_ref()
            .and_then(|d| d.get("preferences").cloned());
        let documents = personal_data
            .as_ref()
            .and_then(|d| d.get("documents").cloned());
        let contracts =
            storage::read_list(self.store.as_ref(), &storage::contracts_key(user_id)).await?;

        let export = PortabilityExport {
            format_version: EXPORT_FORMAT_VERSION.to_string(),
            generated_at: Utc::now(),
            user_id,
            personal_data,
            preferences,
            documents,
            contracts,
        };

        self.audit
            .append(
                AuditAction::DataPortabilityExport,
                Some(user_id),
                json!({ "format_version": export.format_version }),
            )
            .await?;

        tracing::info!(user_id = %user_id, "Portability export generated");
        Ok(export)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dp_common::RequestType;

    use super::*;
    use crate::audit::AuditLog;
    use crate::processing::ProcessingLedger;
    use crate::storage::{MemoryStorage, SecureStorage};

    fn queue() -> SubjectRequestQueue {
        let backing: Arc<dyn SecureStorage> = Arc::new(MemoryStorage::new());
        let audit = AuditLog::new(backing.clone());
        let ledger = ProcessingLedger::new(backing.clone(), audit.clone());
        SubjectRequestQueue::new(backing, audit, ledger)
    }

    #[tokio::test]
    async fn access_export_covers_requests_and_payload() {
        let queue = queue();
        let user_id = Uuid::now_v7();

        queue
            .submit(user_id, RequestType::Access, "full copy".into())
            .await
            .unwrap();
        queue
            .set_personal_data(user_id, json!({"name": "Mette Hansen"}))
            .await
            .unwrap();
        queue
            .append_communication(user_id, json!({"channel": "email"}))
            .await
            .unwrap();

        let export = queue.generate_data_export(user_id).await.unwrap();
        assert_eq!(export.format_version, EXPORT_FORMAT_VERSION);
        assert_eq!(export.requests.len(), 1);
        assert_eq!(export.communication_history.len(), 1);
        assert_eq!(export.personal_data, Some(json!({"name": "Mette Hansen"})));
    }

    #[tokio::test]
    async fn portability_export_lifts_preferences_and_documents() {
        let queue = queue();
        let user_id = Uuid::now_v7();

        queue
            .set_personal_data(
                user_id,
                json!({
                    "name": "Mette Hansen",
                    "preferences": {"language": "da"},
                    "documents": [{"id": "lease-1"}],
                }),
            )
            .await
            .unwrap();

        let export = queue.generate_portability_export(user_id).await.unwrap();
        assert_eq!(export.preferences, Some(json!({"language": "da"})));
        assert_eq!(export.documents, Some(json!([{"id": "lease-1"}])));
        assert!(export.contracts.is_empty());
    }

    #[tokio::test]
    async fn exports_for_an_unknown_user_are_empty_not_errors() {
        let queue = queue();
        let export = queue.generate_data_export(Uuid::now_v7()).await.unwrap();
        assert!(export.consents.is_empty());
        assert!(export.personal_data.is_none());
    }
}
