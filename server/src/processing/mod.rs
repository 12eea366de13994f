//! Data Processing Ledger
//!
//! Append-only record of every operation that touches personal data, tagged
//! with lawful basis and retention date.

pub mod error;
pub mod handlers;
pub mod ledger;
pub mod types;

pub use error::ProcessingError;
pub use ledger::ProcessingLedger;
pub use types::*;
