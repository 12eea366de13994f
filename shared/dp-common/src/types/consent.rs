//! Consent Types
//!
//! The consent vocabulary: which categories of processing a user can opt in
//! or out of, the GDPR Article 6 bases that justify them, and the fixed
//! mapping from consent category to processing purposes.

use serde::{Deserialize, Serialize};

/// How long a recorded consent stays valid before the user must be re-asked.
pub const CONSENT_VALIDITY_DAYS: i64 = 365;

/// Lifetime of the `gdpr_consent` browser cookie mirror.
pub const COOKIE_MAX_AGE_DAYS: i64 = 30;

/// Category of data processing a user may opt in or out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentType {
    /// Required for the service to function. Always granted, never revocable.
    Essential,
    /// Usage analytics.
    Analytics,
    /// Marketing and promotional communication.
    Marketing,
    /// Convenience features (saved preferences, prefilled forms).
    Functional,
    /// Data shared with third-party processors.
    ThirdParty,
}

impl ConsentType {
    /// All consent categories, in banner display order.
    pub const ALL: [Self; 5] = [
        Self::Essential,
        Self::Analytics,
        Self::Marketing,
        Self::Functional,
        Self::ThirdParty,
    ];

    /// Stable string form used in storage keys and audit details.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Essential => "essential",
            Self::Analytics => "analytics",
            Self::Marketing => "marketing",
            Self::Functional => "functional",
            Self::ThirdParty => "third_party",
        }
    }

    /// Whether the user can revoke this category. Only `essential` is locked.
    #[must_use]
    pub const fn is_revocable(self) -> bool {
        !matches!(self, Self::Essential)
    }
}

impl std::fmt::Display for ConsentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Purpose a piece of processing serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingPurpose {
    /// Operating the deposit-escrow service itself.
    ServiceDelivery,
    /// Meeting legal obligations (bookkeeping, AML).
    LegalCompliance,
    /// Product analytics.
    Analytics,
    /// Marketing.
    Marketing,
    /// Messaging between landlords and tenants.
    Communication,
}

/// GDPR Article 6 justification for processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LawfulBasis {
    /// The data subject gave consent.
    Consent,
    /// Necessary for performance of a contract.
    Contract,
    /// Required by law.
    LegalObligation,
    /// Legitimate interest of the controller.
    LegitimateInterest,
}

/// Fixed mapping from consent category to the purposes it covers.
#[must_use]
pub const fn purposes_for(consent_type: ConsentType) -> &'static [ProcessingPurpose] {
    match consent_type {
        ConsentType::Essential => &[
            ProcessingPurpose::ServiceDelivery,
            ProcessingPurpose::LegalCompliance,
        ],
        ConsentType::Analytics => &[ProcessingPurpose::Analytics],
        ConsentType::Marketing => &[
            ProcessingPurpose::Marketing,
            ProcessingPurpose::Communication,
        ],
        ConsentType::Functional => &[ProcessingPurpose::ServiceDelivery],
        ConsentType::ThirdParty => &[
            ProcessingPurpose::ServiceDelivery,
            ProcessingPurpose::Analytics,
        ],
    }
}

/// Default lawful basis when a consent category is recorded from the banner.
///
/// Essential processing rests on the lease contract, everything else on the
/// user's explicit choice.
#[must_use]
pub const fn default_lawful_basis(consent_type: ConsentType) -> LawfulBasis {
    match consent_type {
        ConsentType::Essential => LawfulBasis::Contract,
        _ => LawfulBasis::Consent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn essential_is_not_revocable() {
        assert!(!ConsentType::Essential.is_revocable());
        for ct in [
            ConsentType::Analytics,
            ConsentType::Marketing,
            ConsentType::Functional,
            ConsentType::ThirdParty,
        ] {
            assert!(ct.is_revocable(), "{ct} should be revocable");
        }
    }

    #[test]
    fn purpose_mapping_matches_banner_table() {
        assert_eq!(
            purposes_for(ConsentType::Essential),
            &[
                ProcessingPurpose::ServiceDelivery,
                ProcessingPurpose::LegalCompliance
            ]
        );
        assert_eq!(
            purposes_for(ConsentType::Analytics),
            &[ProcessingPurpose::Analytics]
        );
        assert_eq!(
            purposes_for(ConsentType::Marketing),
            &[
                ProcessingPurpose::Marketing,
                ProcessingPurpose::Communication
            ]
        );
        assert_eq!(
            purposes_for(ConsentType::Functional),
            &[ProcessingPurpose::ServiceDelivery]
        );
        assert_eq!(
            purposes_for(ConsentType::ThirdParty),
            &[
                ProcessingPurpose::ServiceDelivery,
                ProcessingPurpose::Analytics
            ]
        );
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ConsentType::ThirdParty).unwrap();
        assert_eq!(json, "\"third_party\"");
        let back: ConsentType = serde_json::from_str("\"third_party\"").unwrap();
        assert_eq!(back, ConsentType::ThirdParty);
    }
}
