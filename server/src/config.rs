//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// `PostgreSQL` connection URL. Not required in demo mode.
    pub database_url: Option<String>,

    /// Run against the in-memory storage backend instead of `PostgreSQL`.
    ///
    /// State is lost on restart; intended for demos and local development.
    pub demo_mode: bool,

    /// Shared secret for validating platform-issued JWT access tokens.
    pub jwt_secret: String,

    /// Shared token guarding the `/api/internal` platform endpoints.
    pub internal_api_token: Option<String>,

    /// Interval of the subject-request deadline sweep in seconds (default: 3600)
    pub sweep_interval_secs: u64,

    /// Whether the `gdpr_consent` cookie is marked `Secure` (default: true;
    /// disable only for plain-HTTP local development)
    pub secure_cookies: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let demo_mode = env::var("DEMO_MODE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);

        let database_url = env::var("DATABASE_URL").ok();
        if !demo_mode && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set unless DEMO_MODE=true");
        }

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            database_url,
            demo_mode,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            internal_api_token: env::var("INTERNAL_API_TOKEN").ok(),
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            secure_cookies: env::var("SECURE_COOKIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        })
    }

    /// Create a default configuration for testing.
    ///
    /// Tests run against the in-memory storage backend, so no database or
    /// container setup is needed.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".into(),
            database_url: None,
            demo_mode: true,
            jwt_secret: "test-secret".into(),
            internal_api_token: Some("test-internal-token".into()),
            sweep_interval_secs: 3600,
            secure_cookies: true,
        }
    }
}
