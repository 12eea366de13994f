//! Consent Store
//!
//! Persists per-user, per-category consent records with expiry and answers
//! "is consent X currently valid for user Y". Every mutation is audited and
//! every failure is surfaced to the caller.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dp_common::banner::ConsentSelection;
use dp_common::{
    default_lawful_basis, purposes_for, ConsentType, CONSENT_VALIDITY_DAYS,
};
use serde_json::json;
use uuid::Uuid;

use super::error::ConsentError;
use super::types::{ConsentRecord, CookieConsentSummary, PolicyAcceptance, RecordConsent};
use crate::audit::{AuditAction, AuditLog};
use crate::storage::{self, SecureStorage};

/// Consent record store over the secure storage seam.
#[derive(Clone)]
pub struct ConsentStore {
    store: Arc<dyn SecureStorage>,
    audit: AuditLog,
}

impl ConsentStore {
    /// Create a store sharing the given storage and audit log.
    #[must_use]
    pub fn new(store: Arc<dyn SecureStorage>, audit: AuditLog) -> Self {
        Self { store, audit }
    }

    /// Record a consent decision, superseding any prior record for the same
    /// (user, category) pair.
    ///
    /// `essential` is always stored as granted regardless of the submitted
    /// value; rejecting it outright would make banner reject-all submissions
    /// fail.
    pub async fn record_consent(
        &self,
        input: RecordConsent,
    ) -> Result<ConsentRecord, ConsentError> {
        let now = Utc::now();
        let granted = input.granted || !input.consent_type.is_revocable();

        let record = ConsentRecord {
            user_id: input.user_id,
            consent_type: input.consent_type,
            granted,
            timestamp: now,
            lawful_basis: input
                .lawful_basis
                .unwrap_or_else(|| default_lawful_basis(input.consent_type)),
            purposes: input
                .purposes
                .unwrap_or_else(|| purposes_for(input.consent_type).to_vec()),
            expires_at: now + Duration::days(CONSENT_VALIDITY_DAYS),
            ip_address: input.ip_address,
            user_agent: input.user_agent,
        };

        let key = storage::consent_key(input.user_id);
        {
            let _guard = self.store.lock_key(&key).await;
            let mut records: Vec<ConsentRecord> =
                storage::read_list(self.store.as_ref(), &key).await?;
            records.retain(|r| r.consent_type != input.consent_type);
            records.push(record.clone());
            storage::write_list(self.store.as_ref(), &key, &records).await?;
        }

        self.audit
            .append(
                AuditAction::ConsentRecorded,
                Some(input.user_id),
                json!({
                    "consent_type": record.consent_type,
                    "granted": record.granted,
                    "lawful_basis": record.lawful_basis,
                    "expires_at": record.expires_at,
                }),
            )
            .await?;

        tracing::info!(
            user_id = %input.user_id,
            consent_type = %record.consent_type,
            granted = record.granted,
            "Consent recorded"
        );

        Ok(record)
    }

    /// All stored records for the user, in insertion order.
    pub async fn get_consents(&self, user_id: Uuid) -> Result<Vec<ConsentRecord>, ConsentError> {
        let records =
            storage::read_list(self.store.as_ref(), &storage::consent_key(user_id)).await?;
        Ok(records)
    }

    /// True iff a record exists for the category, it is granted, and it has
    /// not expired. Expired-but-granted records read as false; re-prompting
    /// is a UI responsibility.
    pub async fn has_valid_consent(
        &self,
        user_id: Uuid,
        consent_type: ConsentType,
    ) -> Result<bool, ConsentError> {
        let now = Utc::now();
        let records = self.get_consents(user_id).await?;
        Ok(records
            .iter()
            .any(|r| r.consent_type == consent_type && r.granted && now <= r.expires_at))
    }

    /// Record a full banner submission: one consent per category, then the
    /// session-scoped summary mirror used for the browser cookie.
    pub async fn record_banner_submission(
        &self,
        user_id: Uuid,
        selection: ConsentSelection,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Result<CookieConsentSummary, ConsentError> {
        for (consent_type, granted) in selection.grants() {
            self.record_consent(RecordConsent {
                user_id,
                consent_type,
                granted,
                lawful_basis: None,
                purposes: None,
                ip_address: ip_address.clone(),
                user_agent: user_agent.clone(),
            })
            .await?;
        }

        let summary = CookieConsentSummary {
            essential: true,
            analytics: selection.analytics,
            marketing: selection.marketing,
            functional: selection.functional,
            third_party: selection.third_party,
            timestamp: Utc::now(),
        };

        self.store
            .set_temp_item(
                &storage::cookie_consent_key(user_id),
                serde_json::to_value(&summary).map_err(crate::storage::StorageError::Encode)?,
            )
            .await?;

        Ok(summary)
    }

    /// Record acceptance of a privacy policy version.
    pub async fn accept_privacy_policy(
        &self,
        user_id: Uuid,
        version: String,
        ip_address: Option<String>,
    ) -> Result<PolicyAcceptance, ConsentError> {
        let acceptance = PolicyAcceptance {
            version,
            accepted_at: Utc::now(),
            ip_address,
        };

        storage::write_object(
            self.store.as_ref(),
            &storage::privacy_policy_key(user_id),
            &acceptance,
        )
        .await?;

        self.audit
            .append(
                AuditAction::PrivacyPolicyAccepted,
                Some(user_id),
                json!({ "version": acceptance.version }),
            )
            .await?;

        Ok(acceptance)
    }

    /// The user's current privacy policy acceptance, if any.
    pub async fn get_privacy_policy(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PolicyAcceptance>, ConsentError> {
        let acceptance =
            storage::read_object(self.store.as_ref(), &storage::privacy_policy_key(user_id))
                .await?;
        Ok(acceptance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use dp_common::LawfulBasis;

    fn store() -> ConsentStore {
        let storage: Arc<dyn SecureStorage> = Arc::new(MemoryStorage::new());
        let audit = AuditLog::new(storage.clone());
        ConsentStore::new(storage, audit)
    }

    fn record(user_id: Uuid, consent_type: ConsentType, granted: bool) -> RecordConsent {
        RecordConsent {
            user_id,
            consent_type,
            granted,
            lawful_basis: None,
            purposes: None,
            ip_address: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn second_recording_supersedes_first() {
        let consents = store();
        let user_id = Uuid::now_v7();

        consents
            .record_consent(record(user_id, ConsentType::Analytics, true))
            .await
            .unwrap();
        consents
            .record_consent(record(user_id, ConsentType::Analytics, false))
            .await
            .unwrap();

        let records = consents.get_consents(user_id).await.unwrap();
        let analytics: Vec<_> = records
            .iter()
            .filter(|r| r.consent_type == ConsentType::Analytics)
            .collect();
        assert_eq!(analytics.len(), 1, "exactly one current record per type");
        assert!(!analytics[0].granted, "second call's values win");
    }

    #[tokio::test]
    async fn granted_consent_is_immediately_valid() {
        let consents = store();
        let user_id = Uuid::now_v7();

        consents
            .record_consent(record(user_id, ConsentType::Analytics, true))
            .await
            .unwrap();

        assert!(consents
            .has_valid_consent(user_id, ConsentType::Analytics)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unrecorded_consent_is_invalid() {
        let consents = store();
        assert!(!consents
            .has_valid_consent(Uuid::now_v7(), ConsentType::Marketing)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn expired_consent_reads_false_even_if_granted() {
        let backing: Arc<dyn SecureStorage> = Arc::new(MemoryStorage::new());
        let consents = ConsentStore::new(backing.clone(), AuditLog::new(backing.clone()));
        let user_id = Uuid::now_v7();

        // Write an already-expired record through the storage seam.
        let expired = ConsentRecord {
            user_id,
            consent_type: ConsentType::Analytics,
            granted: true,
            timestamp: Utc::now() - Duration::days(400),
            lawful_basis: LawfulBasis::Consent,
            purposes: purposes_for(ConsentType::Analytics).to_vec(),
            expires_at: Utc::now() - Duration::days(35),
            ip_address: None,
            user_agent: None,
        };
        storage::write_list(backing.as_ref(), &storage::consent_key(user_id), &[expired])
            .await
            .unwrap();

        assert!(!consents
            .has_valid_consent(user_id, ConsentType::Analytics)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn essential_cannot_be_revoked() {
        let consents = store();
        let user_id = Uuid::now_v7();

        let stored = consents
            .record_consent(record(user_id, ConsentType::Essential, false))
            .await
            .unwrap();
        assert!(stored.granted);
        assert_eq!(stored.lawful_basis, LawfulBasis::Contract);
    }

    #[tokio::test]
    async fn banner_submission_records_all_five_categories() {
        let consents = store();
        let user_id = Uuid::now_v7();

        let summary = consents
            .record_banner_submission(user_id, ConsentSelection::none(), None, None)
            .await
            .unwrap();

        assert!(summary.essential);
        assert!(!summary.analytics);

        let records = consents.get_consents(user_id).await.unwrap();
        assert_eq!(records.len(), 5);
        assert!(consents
            .has_valid_consent(user_id, ConsentType::Essential)
            .await
            .unwrap());
        assert!(!consents
            .has_valid_consent(user_id, ConsentType::ThirdParty)
            .await
            .unwrap());
    }
}
