//! Deposit Privacy Server
//!
//! GDPR consent, processing-ledger and data-subject-request service for the
//! rental deposit escrow platform. All governance state lives behind one
//! key-value storage seam with `PostgreSQL` and in-memory backends.

pub mod api;
pub mod audit;
pub mod auth;
pub mod breach;
pub mod config;
pub mod consent;
pub mod db;
pub mod processing;
pub mod requests;
pub mod storage;
