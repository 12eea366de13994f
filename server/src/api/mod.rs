//! API Router and Application State
//!
//! Central routing configuration and shared state. All services hang off one
//! storage seam, so the whole router can run against the in-memory backend in
//! demo mode and tests.

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    audit::AuditLog,
    auth,
    breach::{self, BreachRegister},
    config::Config,
    consent::{self, ConsentStore},
    processing::{self, ProcessingLedger},
    requests::{handlers as request_handlers, SubjectRequestQueue},
    storage::SecureStorage,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<Config>,
    /// Storage seam shared by all services
    pub storage: Arc<dyn SecureStorage>,
    /// Audit log
    pub audit: AuditLog,
    /// Consent store
    pub consents: ConsentStore,
    /// Processing ledger
    pub ledger: ProcessingLedger,
    /// Subject request queue and erasure workflow
    pub requests: SubjectRequestQueue,
    /// Breach register
    pub breaches: BreachRegister,
}

impl AppState {
    /// Create new application state on top of a storage backend.
    #[must_use]
    pub fn new(config: Config, storage: Arc<dyn SecureStorage>) -> Self {
        let audit = AuditLog::new(storage.clone());
        let consents = ConsentStore::new(storage.clone(), audit.clone());
        let ledger = ProcessingLedger::new(storage.clone(), audit.clone());
        let requests = SubjectRequestQueue::new(storage.clone(), audit.clone(), ledger.clone());
        let breaches = BreachRegister::new(storage.clone(), audit.clone());

        Self {
            config: Arc::new(config),
            storage,
            audit,
            consents,
            ledger,
            requests,
            breaches,
        }
    }
}

/// Client metadata captured alongside consent decisions: forwarded address
/// and raw User-Agent, when present.
#[must_use]
pub fn client_meta(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    let user_agent = headers
        .get("user-agent")
        .and_then(|h| h.to_str().ok())
        .map(ToString::to_string);
    (ip_address, user_agent)
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // User-facing routes, authenticated with a platform bearer token.
    let me_routes = Router::new()
        .route(
            "/api/me/consents",
            get(consent::handlers::list_consents).post(consent::handlers::submit_banner),
        )
        .route(
            "/api/me/consents/{consent_type}",
            get(consent::handlers::consent_status).put(consent::handlers::update_consent),
        )
        .route(
            "/api/me/privacy-policy",
            get(consent::handlers::get_privacy_policy)
                .post(consent::handlers::accept_privacy_policy),
        )
        .route(
            "/api/me/processing-records",
            get(processing::handlers::list_processing_records),
        )
        .route(
            "/api/me/requests",
            get(request_handlers::list_my_requests).post(request_handlers::submit_request),
        )
        .route("/api/me/data-export", get(request_handlers::data_export))
        .route(
            "/api/me/data-export/portability",
            get(request_handlers::portability_export),
        )
        .layer(from_fn_with_state(state.clone(), auth::require_auth));

    // Internal surface for platform services and compliance staff.
    let internal_routes = Router::new()
        .route(
            "/api/internal/processing",
            post(processing::handlers::record_processing),
        )
        .route(
            "/api/internal/requests",
            get(request_handlers::list_all_requests),
        )
        .route(
            "/api/internal/requests/{id}",
            axum::routing::patch(request_handlers::update_request),
        )
        .route(
            "/api/internal/users/{user_id}/erasure",
            get(request_handlers::erasure_eligibility).post(request_handlers::erase_user),
        )
        .route(
            "/api/internal/users/{user_id}/contracts",
            put(request_handlers::put_contracts),
        )
        .route(
            "/api/internal/users/{user_id}/personal-data",
            put(request_handlers::put_personal_data),
        )
        .route(
            "/api/internal/users/{user_id}/communications",
            post(request_handlers::post_communication),
        )
        .route(
            "/api/internal/breaches",
            get(breach::list_breaches).post(breach::record_breach),
        )
        .route(
            "/api/internal/breaches/{id}/reported",
            post(breach::mark_breach_reported),
        )
        .layer(from_fn_with_state(state.clone(), auth::require_internal));

    Router::new()
        .route("/health", get(health_check))
        .merge(me_routes)
        .merge(internal_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    /// Service status
    status: &'static str,
    /// Whether the server runs on the in-memory backend
    demo_mode: bool,
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        demo_mode: state.config.demo_mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_meta_takes_first_forwarded_address() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        headers.insert("user-agent", "Mozilla/5.0".parse().unwrap());

        let (ip, ua) = client_meta(&headers);
        assert_eq!(ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(ua.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn client_meta_tolerates_missing_headers() {
        let (ip, ua) = client_meta(&HeaderMap::new());
        assert!(ip.is_none());
        assert!(ua.is_none());
    }
}
