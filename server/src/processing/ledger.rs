//! Processing Ledger Service

use std::sync::Arc;

use chrono::{Duration, Utc};
use dp_common::DEFAULT_RETENTION_DAYS;
use serde_json::json;
use uuid::Uuid;

use super::error::ProcessingError;
use super::types::{DataProcessingRecord, RecordProcessing};
use crate::audit::{AuditAction, AuditLog};
use crate::storage::{self, SecureStorage};

/// Append-only ledger of data processing operations.
#[derive(Clone)]
pub struct ProcessingLedger {
    store: Arc<dyn SecureStorage>,
    audit: AuditLog,
}

impl ProcessingLedger {
    /// Create a ledger sharing the given storage and audit log.
    #[must_use]
    pub fn new(store: Arc<dyn SecureStorage>, audit: AuditLog) -> Self {
        Self { store, audit }
    }

    /// Append one processing record.
    ///
    /// Retention defaults to 2555 days (seven years) from the point of call,
    /// matching financial-record retention law.
    pub async fn record_data_processing(
        &self,
        input: RecordProcessing,
    ) -> Result<DataProcessingRecord, ProcessingError> {
        let now = Utc::now();

        let mut record = DataProcessingRecord {
            id: Uuid::now_v7(),
            user_id: input.user_id,
            data_category: input.data_category,
            purpose: input.purpose,
            lawful_basis: input.lawful_basis,
            processing_date: now,
            data_retention_until: input
                .data_retention_until
                .unwrap_or_else(|| now + Duration::days(DEFAULT_RETENTION_DAYS)),
            is_anonymized: false,
            audit_hash: String::new(),
        };
        record.audit_hash = record.compute_audit_hash();

        let key = storage::processing_key(input.user_id);
        {
            let _guard = self.store.lock_key(&key).await;
            let mut records: Vec<DataProcessingRecord> =
                storage::read_list(self.store.as_ref(), &key).await?;
            records.push(record.clone());
            storage::write_list(self.store.as_ref(), &key, &records).await?;
        }

        self.audit
            .append(
                AuditAction::DataProcessed,
                Some(input.user_id),
                json!({
                    "record_id": record.id,
                    "data_category": record.data_category,
                    "purpose": record.purpose,
                    "lawful_basis": record.lawful_basis,
                    "data_retention_until": record.data_retention_until,
                }),
            )
            .await?;

        Ok(record)
    }

    /// Full processing history for the user, in append order.
    pub async fn get_processing_records(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<DataProcessingRecord>, ProcessingError> {
        let records =
            storage::read_list(self.store.as_ref(), &storage::processing_key(user_id)).await?;
        Ok(records)
    }

    /// Flip `is_anonymized` on every record that is not yet anonymized.
    ///
    /// Called by the erasure workflow before the user's ledger entries are
    /// removed. Returns the number of records flipped.
    pub async fn anonymize_records(&self, user_id: Uuid) -> Result<usize, ProcessingError> {
        let key = storage::processing_key(user_id);
        let _guard = self.store.lock_key(&key).await;
        let mut records: Vec<DataProcessingRecord> =
            storage::read_list(self.store.as_ref(), &key).await?;

        let mut flipped = 0;
        for record in &mut records {
            if !record.is_anonymized {
                record.is_anonymized = true;
                flipped += 1;
            }
        }

        if flipped > 0 {
            storage::write_list(self.store.as_ref(), &key, &records).await?;
        }
        Ok(flipped)
    }

    /// Remove the user's ledger entries. Only the erasure workflow calls this.
    pub(crate) async fn remove_user_records(&self, user_id: Uuid) -> Result<(), ProcessingError> {
        self.store
            .remove_item(&storage::processing_key(user_id))
            .await?;
        Ok(())
    }
}
