//! Depositum Common Library
//!
//! Consent vocabulary and cookie banner state machine shared by the
//! governance server and client UIs.

pub mod banner;
pub mod types;

pub use types::*;
