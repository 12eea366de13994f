//! Storage Key Builders
//!
//! Every collection the governance services persist, in one place. Per-user
//! collections embed the user id; queue, audit log, anonymized-user and
//! breach collections are global.

use uuid::Uuid;

/// Global key: data subject request queue.
pub const REQUESTS_KEY: &str = "gdpr_requests";

/// Global key: append-only audit log.
pub const AUDIT_KEY: &str = "gdpr_audit";

/// Global key: anonymized traces retained after erasure.
pub const ANONYMIZED_USERS_KEY: &str = "anonymized_users";

/// Global key: data breach register.
pub const DATA_BREACHES_KEY: &str = "data_breaches";

/// Prefix of erasure saga markers, for startup resumption scans.
pub const ERASURE_MARKER_PREFIX: &str = "erasure_marker_";

/// Per-user consent record list.
#[must_use]
pub fn consent_key(user_id: Uuid) -> String {
    format!("gdpr_consent_{user_id}")
}

/// Per-user data processing record list.
#[must_use]
pub fn processing_key(user_id: Uuid) -> String {
    format!("gdpr_processing_{user_id}")
}

/// Session-scoped cookie consent summary mirror.
#[must_use]
pub fn cookie_consent_key(user_id: Uuid) -> String {
    format!("cookie_consent_{user_id}")
}

/// Per-user privacy policy acceptance record.
#[must_use]
pub fn privacy_policy_key(user_id: Uuid) -> String {
    format!("privacy_policy_{user_id}")
}

/// Per-user personal data payload ingested from the platform.
#[must_use]
pub fn personal_data_key(user_id: Uuid) -> String {
    format!("personal_data_{user_id}")
}

/// Per-user landlord/tenant message history.
#[must_use]
pub fn communication_key(user_id: Uuid) -> String {
    format!("communication_history_{user_id}")
}

/// Per-user lease contract snapshot (erasure eligibility gate reads this).
#[must_use]
pub fn contracts_key(user_id: Uuid) -> String {
    format!("contracts_{user_id}")
}

/// Per-user erasure saga marker.
#[must_use]
pub fn erasure_marker_key(user_id: Uuid) -> String {
    format!("{ERASURE_MARKER_PREFIX}{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_key_matches_prefix() {
        let user_id = Uuid::now_v7();
        let key = erasure_marker_key(user_id);
        assert!(key.starts_with(ERASURE_MARKER_PREFIX));
        assert!(key.ends_with(&user_id.to_string()));
    }
}
