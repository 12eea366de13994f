//! Consent Record and Request/Response Types

use chrono::{DateTime, Utc};
use dp_common::banner::ConsentSelection;
use dp_common::{ConsentType, LawfulBasis, ProcessingPurpose};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored consent decision.
///
/// At most one current record exists per (user, consent type); a new
/// recording supersedes the prior one.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ConsentRecord {
    /// Owning user.
    pub user_id: Uuid,
    /// Consent category.
    #[schema(value_type = String)]
    pub consent_type: ConsentType,
    /// Whether the user granted this category.
    pub granted: bool,
    /// When the decision was recorded.
    pub timestamp: DateTime<Utc>,
    /// Article 6 basis for the covered processing.
    #[schema(value_type = String)]
    pub lawful_basis: LawfulBasis,
    /// Purposes this consent covers.
    #[schema(value_type = Vec<String>)]
    pub purposes: Vec<ProcessingPurpose>,
    /// When the consent lapses and the user must be re-asked.
    pub expires_at: DateTime<Utc>,
    /// Client address at recording time, when known.
    pub ip_address: Option<String>,
    /// Raw User-Agent header at recording time, when known.
    pub user_agent: Option<String>,
}

/// Input for recording a single consent decision.
#[derive(Debug, Clone)]
pub struct RecordConsent {
    /// Owning user.
    pub user_id: Uuid,
    /// Consent category.
    pub consent_type: ConsentType,
    /// Whether the user granted this category.
    pub granted: bool,
    /// Override of the default lawful basis for the category.
    pub lawful_basis: Option<LawfulBasis>,
    /// Override of the fixed purpose mapping for the category.
    pub purposes: Option<Vec<ProcessingPurpose>>,
    /// Client address.
    pub ip_address: Option<String>,
    /// Raw User-Agent header.
    pub user_agent: Option<String>,
}

/// Request body for a full banner submission, one boolean per revocable
/// category. Essential is not represented: it is always granted.
#[derive(Debug, Clone, Copy, Deserialize, utoipa::ToSchema)]
pub struct BannerSubmission {
    /// Usage analytics.
    pub analytics: bool,
    /// Marketing communication.
    pub marketing: bool,
    /// Convenience features.
    pub functional: bool,
    /// Third-party processors.
    pub third_party: bool,
}

impl From<BannerSubmission> for ConsentSelection {
    fn from(body: BannerSubmission) -> Self {
        Self {
            analytics: body.analytics,
            marketing: body.marketing,
            functional: body.functional,
            third_party: body.third_party,
        }
    }
}

/// Per-category summary mirrored into the `gdpr_consent` cookie and the
/// session-scoped `cookie_consent_{user}` entry.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CookieConsentSummary {
    /// Always true.
    pub essential: bool,
    /// Analytics granted.
    pub analytics: bool,
    /// Marketing granted.
    pub marketing: bool,
    /// Functional granted.
    pub functional: bool,
    /// Third-party granted.
    pub third_party: bool,
    /// When the banner was submitted.
    pub timestamp: DateTime<Utc>,
}

/// Privacy policy acceptance record (`privacy_policy_{user}`).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PolicyAcceptance {
    /// Policy version string the user accepted.
    pub version: String,
    /// When it was accepted.
    pub accepted_at: DateTime<Utc>,
    /// Client address at acceptance time, when known.
    pub ip_address: Option<String>,
}

/// Request body for updating a single consent category.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UpdateConsentRequest {
    /// Whether the category is granted.
    pub granted: bool,
    /// Optional lawful basis override.
    #[schema(value_type = Option<String>)]
    pub lawful_basis: Option<LawfulBasis>,
    /// Optional purposes override.
    #[schema(value_type = Option<Vec<String>>)]
    pub purposes: Option<Vec<ProcessingPurpose>>,
}

/// Response for a single-category validity check.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ConsentStatusResponse {
    /// Queried category.
    #[schema(value_type = String)]
    pub consent_type: ConsentType,
    /// True iff a granted, unexpired record exists.
    pub valid: bool,
}

/// Request body for accepting a privacy policy version.
#[derive(Debug, Deserialize, validator::Validate, utoipa::ToSchema)]
pub struct AcceptPolicyRequest {
    /// Version string of the accepted policy.
    #[validate(length(min = 1, max = 64))]
    pub version: String,
}
