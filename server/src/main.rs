//! Deposit Privacy Server - Main Entry Point
//!
//! GDPR consent and data-subject-request backend for the deposit escrow
//! platform.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use dp_server::storage::{MemoryStorage, PgStorage, SecureStorage};
use dp_server::{api, config, db, requests};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dp_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        demo_mode = config.demo_mode,
        "Starting Deposit Privacy Server"
    );

    // Select the storage backend
    let storage: Arc<dyn SecureStorage> = if config.demo_mode {
        info!("Demo mode: running on the in-memory storage backend");
        Arc::new(MemoryStorage::new())
    } else {
        let database_url = config
            .database_url
            .as_deref()
            .context("DATABASE_URL must be set unless DEMO_MODE=true")?;
        let pool = db::create_pool(database_url).await?;
        db::run_migrations(&pool).await?;
        Arc::new(PgStorage::new(pool))
    };

    // Session-scoped entries do not survive a restart
    let purged = storage.purge_temp_items().await?;
    if purged > 0 {
        info!(purged, "Purged session-scoped storage entries");
    }

    // Build application state
    let state = api::AppState::new(config.clone(), storage);

    // Pick up erasures interrupted by a previous crash
    let resumed = state.requests.resume_pending_erasures().await?;
    if resumed > 0 {
        info!(resumed, "Resumed interrupted erasures");
    }

    // Periodic deadline sweep for overdue subject requests
    requests::spawn_deadline_sweep(state.requests.clone(), config.sweep_interval_secs);

    // Build router
    let app = api::create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown handler
    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Received shutdown signal, cleaning up...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");

    Ok(())
}
