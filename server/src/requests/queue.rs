//! Subject Request Queue
//!
//! Global queue of data subject requests plus the per-user platform data the
//! erasure and export paths operate on (contract snapshots, personal data
//! payloads, communication history).

use std::sync::Arc;

use chrono::{Duration, Utc};
use dp_common::{RequestStatus, RequestType, REQUEST_DEADLINE_DAYS};
use serde_json::json;
use uuid::Uuid;

use super::error::RequestError;
use super::types::{ContractRef, DataSubjectRequest, UpdateRequestBody};
use crate::audit::{AuditAction, AuditLog};
use crate::processing::ProcessingLedger;
use crate::storage::{self, SecureStorage, REQUESTS_KEY};

/// Queue of data subject requests over the secure store.
#[derive(Clone)]
pub struct SubjectRequestQueue {
    pub(super) store: Arc<dyn SecureStorage>,
    pub(super) audit: AuditLog,
    pub(super) ledger: ProcessingLedger,
}

impl SubjectRequestQueue {
    /// Create a queue sharing the given storage, audit log and ledger.
    #[must_use]
    pub fn new(store: Arc<dyn SecureStorage>, audit: AuditLog, ledger: ProcessingLedger) -> Self {
        Self {
            store,
            audit,
            ledger,
        }
    }

    /// Submit a request. The completion deadline is fixed at 30 days after
    /// submission; the initial status is always pending.
    pub async fn submit(
        &self,
        user_id: Uuid,
        request_type: RequestType,
        details: String,
    ) -> Result<DataSubjectRequest, RequestError> {
        let now = Utc::now();
        let request = DataSubjectRequest {
            id: Uuid::now_v7(),
            user_id,
            request_type,
            status: RequestStatus::Pending,
            request_date: now,
            completion_deadline: now + Duration::days(REQUEST_DEADLINE_DAYS),
            completed_date: None,
            request_details: details,
            response_data: None,
            rejection_reason: None,
        };

        {
            let _guard = self.store.lock_key(REQUESTS_KEY).await;
            let mut requests: Vec<DataSubjectRequest> =
                storage::read_list(self.store.as_ref(), REQUESTS_KEY).await?;
            requests.push(request.clone());
            storage::write_list(self.store.as_ref(), REQUESTS_KEY, &requests).await?;
        }

        self.audit
            .append(
                AuditAction::DataSubjectRequest,
                Some(user_id),
                json!({
                    "request_id": request.id,
                    "request_type": request.request_type,
                    "completion_deadline": request.completion_deadline,
                }),
            )
            .await?;

        tracing::info!(
            user_id = %user_id,
            request_id = %request.id,
            request_type = ?request_type,
            "Data subject request submitted"
        );

        Ok(request)
    }

    /// All requests, in submission order.
    pub async fn list(&self) -> Result<Vec<DataSubjectRequest>, RequestError> {
        let requests = storage::read_list(self.store.as_ref(), REQUESTS_KEY).await?;
        Ok(requests)
    }

    /// The given user's requests, in submission order.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<DataSubjectRequest>, RequestError> {
        let mut requests = self.list().await?;
        requests.retain(|r| r.user_id == user_id);
        Ok(requests)
    }

    /// Transition a request's status.
    ///
    /// Requests only move forward (pending → in progress → completed or
    /// rejected); completing stamps `completed_date`, rejecting requires a
    /// reason.
    pub async fn update_status(
        &self,
        request_id: Uuid,
        update: UpdateRequestBody,
    ) -> Result<DataSubjectRequest, RequestError> {
        let _guard = self.store.lock_key(REQUESTS_KEY).await;
        let mut requests: Vec<DataSubjectRequest> =
            storage::read_list(self.store.as_ref(), REQUESTS_KEY).await?;

        let request = requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or(RequestError::NotFound)?;

        if !request.status.can_transition_to(update.status) {
            return Err(RequestError::InvalidTransition {
                from: request.status,
                to: update.status,
            });
        }

        if update.status == RequestStatus::Rejected && update.rejection_reason.is_none() {
            return Err(RequestError::MissingRejectionReason);
        }

        request.status = update.status;
        match update.status {
            RequestStatus::Completed => {
                request.completed_date = Some(Utc::now());
                request.response_data = update.response_data;
            }
            RequestStatus::Rejected => {
                request.rejection_reason = update.rejection_reason;
            }
            RequestStatus::Pending | RequestStatus::InProgress => {}
        }

        let updated = request.clone();
        storage::write_list(self.store.as_ref(), REQUESTS_KEY, &requests).await?;

        self.audit
            .append(
                AuditAction::DataSubjectRequestUpdated,
                Some(updated.user_id),
                json!({
                    "request_id": updated.id,
                    "status": updated.status,
                }),
            )
            .await?;

        Ok(updated)
    }

    /// Log open requests past their completion deadline.
    ///
    /// The deadline is advisory: nothing transitions automatically. Returns
    /// the number of overdue requests found.
    pub async fn sweep_overdue(&self) -> Result<usize, RequestError> {
        let now = Utc::now();
        let requests = self.list().await?;
        let overdue: Vec<_> = requests
            .iter()
            .filter(|r| r.status.is_open() && r.completion_deadline < now)
            .collect();

        for request in &overdue {
            tracing::warn!(
                request_id = %request.id,
                user_id = %request.user_id,
                deadline = %request.completion_deadline,
                "Data subject request past its completion deadline"
            );
        }

        Ok(overdue.len())
    }

    // ------------------------------------------------------------------
    // Platform data ingest (read by the erasure and export paths)
    // ------------------------------------------------------------------

    /// Replace the user's contract snapshot.
    pub async fn set_contracts(
        &self,
        user_id: Uuid,
        contracts: Vec<ContractRef>,
    ) -> Result<(), RequestError> {
        storage::write_list(
            self.store.as_ref(),
            &storage::contracts_key(user_id),
            &contracts,
        )
        .await?;
        Ok(())
    }

    /// Replace the user's personal data payload.
    pub async fn set_personal_data(
        &self,
        user_id: Uuid,
        data: serde_json::Value,
    ) -> Result<(), RequestError> {
        self.store
            .set_item(&storage::personal_data_key(user_id), data)
            .await?;
        Ok(())
    }

    /// Append one entry to the user's communication history.
    pub async fn append_communication(
        &self,
        user_id: Uuid,
        entry: serde_json::Value,
    ) -> Result<(), RequestError> {
        let key = storage::communication_key(user_id);
        let _guard = self.store.lock_key(&key).await;
        let mut history: Vec<serde_json::Value> =
            storage::read_list(self.store.as_ref(), &key).await?;
        history.push(entry);
        storage::write_list(self.store.as_ref(), &key, &history).await?;
        Ok(())
    }
}

/// Start the periodic deadline sweep.
///
/// The first tick is consumed immediately so the sweep does not run during
/// startup.
pub fn spawn_deadline_sweep(
    queue: SubjectRequestQueue,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        interval.tick().await; // consume immediate first tick
        loop {
            interval.tick().await;
            match queue.sweep_overdue().await {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "Deadline sweep found overdue requests"),
                Err(e) => tracing::warn!(error = %e, "Deadline sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn queue() -> SubjectRequestQueue {
        let backing: Arc<dyn SecureStorage> = Arc::new(MemoryStorage::new());
        let audit = AuditLog::new(backing.clone());
        let ledger = ProcessingLedger::new(backing.clone(), audit.clone());
        SubjectRequestQueue::new(backing, audit, ledger)
    }

    #[tokio::test]
    async fn deadline_is_exactly_thirty_days_and_status_pending() {
        let queue = queue();
        let request = queue
            .submit(Uuid::now_v7(), RequestType::Access, "everything".into())
            .await
            .unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(
            request.completion_deadline - request.request_date,
            Duration::days(30)
        );
    }

    #[tokio::test]
    async fn rejection_requires_a_reason() {
        let queue = queue();
        let request = queue
            .submit(Uuid::now_v7(), RequestType::Objection, String::new())
            .await
            .unwrap();

        let err = queue
            .update_status(
                request.id,
                UpdateRequestBody {
                    status: RequestStatus::Rejected,
                    response_data: None,
                    rejection_reason: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::MissingRejectionReason));
    }

    #[tokio::test]
    async fn completed_requests_are_terminal() {
        let queue = queue();
        let request = queue
            .submit(Uuid::now_v7(), RequestType::Access, String::new())
            .await
            .unwrap();

        let updated = queue
            .update_status(
                request.id,
                UpdateRequestBody {
                    status: RequestStatus::Completed,
                    response_data: Some(json!({"delivered": true})),
                    rejection_reason: None,
                },
            )
            .await
            .unwrap();
        assert!(updated.completed_date.is_some());

        let err = queue
            .update_status(
                request.id,
                UpdateRequestBody {
                    status: RequestStatus::InProgress,
                    response_data: None,
                    rejection_reason: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn sweep_counts_only_overdue_open_requests() {
        let queue = queue();
        let user_id = Uuid::now_v7();
        queue
            .submit(user_id, RequestType::Access, String::new())
            .await
            .unwrap();

        // Fresh request: not overdue.
        assert_eq!(queue.sweep_overdue().await.unwrap(), 0);

        // Backdate the deadline through the storage seam.
        let mut requests: Vec<DataSubjectRequest> =
            storage::read_list(queue.store.as_ref(), REQUESTS_KEY)
                .await
                .unwrap();
        requests[0].completion_deadline = Utc::now() - Duration::days(1);
        storage::write_list(queue.store.as_ref(), REQUESTS_KEY, &requests)
            .await
            .unwrap();

        assert_eq!(queue.sweep_overdue().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_submissions_all_land_in_the_queue() {
        let queue = queue();
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..50 {
            let queue = queue.clone();
            tasks.spawn(async move {
                queue
                    .submit(Uuid::now_v7(), RequestType::Access, String::new())
                    .await
                    .unwrap();
            });
        }
        while let Some(res) = tasks.join_next().await {
            res.unwrap();
        }

        assert_eq!(queue.list().await.unwrap().len(), 50);
    }
}
