//! Staged Erasure Workflow
//!
//! Right-to-erasure runs as a resumable saga: a persisted marker records the
//! last completed stage, so a crash mid-erasure never leaves a silent partial
//! deletion. On startup any leftover markers are picked up and driven to
//! completion.

use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::error::RequestError;
use super::queue::SubjectRequestQueue;
use super::types::{
    AnonymizedRecord, ContractRef, ContractStatus, ErasureMarker, ErasureOutcome, ErasureStage,
};
use crate::audit::AuditAction;
use crate::storage::{self, ANONYMIZED_USERS_KEY, ERASURE_MARKER_PREFIX};

/// Hex sha256 of the user id, the only trace kept after erasure.
fn anonymized_user_id(user_id: Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

impl SubjectRequestQueue {
    /// Number of contracts currently blocking erasure.
    pub async fn active_contracts(&self, user_id: Uuid) -> Result<usize, RequestError> {
        let contracts: Vec<ContractRef> =
            storage::read_list(self.store.as_ref(), &storage::contracts_key(user_id)).await?;
        Ok(contracts
            .iter()
            .filter(|c| c.status == ContractStatus::Active)
            .count())
    }

    /// Whether the user can be erased right now.
    pub async fn can_erase_data(&self, user_id: Uuid) -> Result<bool, RequestError> {
        Ok(self.active_contracts(user_id).await? == 0)
    }

    /// Erase all of the user's data.
    ///
    /// Refuses while the user holds an active contract (deposit still in
    /// escrow). Otherwise persists a saga marker and drives the erasure to
    /// completion.
    pub async fn erase_user_data(
        &self,
        user_id: Uuid,
        reason: String,
    ) -> Result<ErasureOutcome, RequestError> {
        let active = self.active_contracts(user_id).await?;
        if active > 0 {
            tracing::warn!(user_id = %user_id, active, "Erasure refused: active contracts");
            return Ok(ErasureOutcome::Ineligible {
                active_contracts: active,
            });
        }

        let marker = ErasureMarker {
            user_id,
            reason,
            started_at: Utc::now(),
            stage: ErasureStage::Started,
        };
        storage::write_object(
            self.store.as_ref(),
            &storage::erasure_marker_key(user_id),
            &marker,
        )
        .await?;

        self.run_erasure(marker).await?;
        Ok(ErasureOutcome::Completed)
    }

    /// Drive an erasure from its marker's last completed stage to the end.
    ///
    /// On failure the marker stays in place for the startup resume, and the
    /// failure itself lands in the audit trail.
    pub async fn run_erasure(&self, mut marker: ErasureMarker) -> Result<(), RequestError> {
        let user_id = marker.user_id;
        match self.advance_erasure(&mut marker).await {
            Ok(()) => {
                tracing::info!(user_id = %user_id, "Erasure completed");
                Ok(())
            }
            Err(e) => {
                let audit_result = self
                    .audit
                    .append(
                        AuditAction::DataErasureError,
                        Some(user_id),
                        json!({
                            "stage": marker.stage,
                            "error": e.to_string(),
                        }),
                    )
                    .await;
                if let Err(audit_err) = audit_result {
                    tracing::error!(error = %audit_err, "Failed to audit erasure error");
                }
                Err(e)
            }
        }
    }

    async fn advance_erasure(&self, marker: &mut ErasureMarker) -> Result<(), RequestError> {
        let user_id = marker.user_id;
        let marker_key = storage::erasure_marker_key(user_id);

        if marker.stage == ErasureStage::Started {
            // Flip the anonymization flag on the ledger first so the audit
            // trail reflects it even if the deletion below fails.
            self.ledger.anonymize_records(user_id).await?;
            self.ledger.remove_user_records(user_id).await?;

            for key in [
                storage::consent_key(user_id),
                storage::personal_data_key(user_id),
                storage::communication_key(user_id),
                storage::cookie_consent_key(user_id),
                storage::privacy_policy_key(user_id),
                storage::contracts_key(user_id),
            ] {
                self.store.remove_item(&key).await?;
            }

            marker.stage = ErasureStage::RecordsDeleted;
            storage::write_object(self.store.as_ref(), &marker_key, marker).await?;
        }

        if marker.stage == ErasureStage::RecordsDeleted {
            let _guard = self.store.lock_key(ANONYMIZED_USERS_KEY).await;
            let mut anonymized: Vec<AnonymizedRecord> =
                storage::read_list(self.store.as_ref(), ANONYMIZED_USERS_KEY).await?;
            anonymized.push(AnonymizedRecord {
                original_user_id: anonymized_user_id(user_id),
                erasure_date: Utc::now(),
                reason: marker.reason.clone(),
                retained_for_compliance: true,
            });
            storage::write_list(self.store.as_ref(), ANONYMIZED_USERS_KEY, &anonymized).await?;

            marker.stage = ErasureStage::TombstoneWritten;
            storage::write_object(self.store.as_ref(), &marker_key, marker).await?;
        }

        // TombstoneWritten: final audit entry, then retire the marker.
        self.audit
            .append(
                AuditAction::DataErased,
                Some(user_id),
                json!({
                    "reason": marker.reason,
                    "anonymized_user": anonymized_user_id(user_id),
                }),
            )
            .await?;
        self.store.remove_item(&marker_key).await?;
        Ok(())
    }

    /// Resume erasures interrupted by a crash. Called once at startup.
    ///
    /// Returns the number of markers picked up.
    pub async fn resume_pending_erasures(&self) -> Result<usize, RequestError> {
        let keys = self.store.list_keys(ERASURE_MARKER_PREFIX).await?;
        let mut resumed = 0;

        for key in keys {
            let Some(marker) =
                storage::read_object::<ErasureMarker>(self.store.as_ref(), &key).await?
            else {
                continue;
            };
            tracing::info!(
                user_id = %marker.user_id,
                stage = ?marker.stage,
                "Resuming interrupted erasure"
            );
            self.run_erasure(marker).await?;
            resumed += 1;
        }

        Ok(resumed)
    }

    /// All anonymized-user tombstones, in erasure order.
    pub async fn anonymized_users(&self) -> Result<Vec<AnonymizedRecord>, RequestError> {
        let records = storage::read_list(self.store.as_ref(), ANONYMIZED_USERS_KEY).await?;
        Ok(records)
    }
}
