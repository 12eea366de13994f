//! Data Subject Requests
//!
//! Queue of GDPR rights requests with a fixed 30-day completion deadline,
//! the staged erasure workflow, and the access/portability exports.

pub mod erasure;
pub mod error;
pub mod export;
pub mod handlers;
pub mod queue;
pub mod types;

pub use error::RequestError;
pub use queue::{spawn_deadline_sweep, SubjectRequestQueue};
pub use types::*;
