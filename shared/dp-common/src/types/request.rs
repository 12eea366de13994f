//! Data Subject Request Types

use serde::{Deserialize, Serialize};

/// Days a controller has to complete a data subject request (GDPR Art. 12(3)).
pub const REQUEST_DEADLINE_DAYS: i64 = 30;

/// A GDPR right the user can exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    /// Copy of all stored data (Art. 15).
    Access,
    /// Correction of inaccurate data (Art. 16).
    Rectification,
    /// Right to be forgotten (Art. 17).
    Erasure,
    /// Machine-readable export (Art. 20).
    Portability,
    /// Restriction of processing (Art. 18).
    Restriction,
    /// Objection to processing (Art. 21).
    Objection,
}

/// Lifecycle state of a data subject request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Submitted, not yet picked up.
    Pending,
    /// Being handled by compliance staff.
    InProgress,
    /// Fulfilled; `completed_date` is set.
    Completed,
    /// Declined; a rejection reason is recorded.
    Rejected,
}

impl RequestStatus {
    /// Whether a request may move from `self` to `next`.
    ///
    /// Requests start `pending` and may move forward only; `completed` and
    /// `rejected` are terminal.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Pending,
                Self::InProgress | Self::Completed | Self::Rejected
            ) | (Self::InProgress, Self::Completed | Self::Rejected)
        )
    }

    /// Whether the request still counts against the completion deadline.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_cannot_transition() {
        for next in [
            RequestStatus::Pending,
            RequestStatus::InProgress,
            RequestStatus::Completed,
            RequestStatus::Rejected,
        ] {
            assert!(!RequestStatus::Completed.can_transition_to(next));
            assert!(!RequestStatus::Rejected.can_transition_to(next));
        }
    }

    #[test]
    fn pending_can_skip_straight_to_terminal() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Completed));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Rejected));
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::InProgress));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Pending));
    }
}
