//! Shared Domain Types

pub mod consent;
pub mod processing;
pub mod request;

pub use consent::*;
pub use processing::*;
pub use request::*;
