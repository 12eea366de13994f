//! Consent Management
//!
//! Server-authoritative consent records keyed by authenticated user, the
//! cookie banner submission endpoint, and privacy policy acceptance.

pub mod error;
pub mod handlers;
pub mod store;
pub mod types;

pub use error::ConsentError;
pub use store::ConsentStore;
pub use types::*;
