//! Data Processing Types

use serde::{Deserialize, Serialize};

/// Default retention horizon for processing records: seven years, matching
/// the Danish bookkeeping act for financial records.
pub const DEFAULT_RETENTION_DAYS: i64 = 2555;

/// Category of personal data touched by a processing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    /// Name, address, contact details.
    PersonalBasic,
    /// Bank accounts, deposit amounts, payment history.
    Financial,
    /// GDPR Article 9 special categories.
    SpecialCategory,
    /// Usage and interaction data.
    Behavioral,
    /// Device and connection data.
    Technical,
    /// Messages between tenants and landlords.
    Communication,
}

impl DataCategory {
    /// Stable string form used in audit details.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PersonalBasic => "personal_basic",
            Self::Financial => "financial",
            Self::SpecialCategory => "special_category",
            Self::Behavioral => "behavioral",
            Self::Technical => "technical",
            Self::Communication => "communication",
        }
    }
}

impl std::fmt::Display for DataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
