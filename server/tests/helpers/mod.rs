//! Shared test helpers.
//!
//! Every HTTP test runs the full router against the in-memory storage
//! backend, so no database or container setup is needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use dp_server::api::{create_router, AppState};
use dp_server::auth::generate_access_token;
use dp_server::config::Config;
use dp_server::storage::MemoryStorage;

/// Shared internal token matching `Config::default_for_test`.
pub const INTERNAL_TOKEN: &str = "test-internal-token";

/// Application state over a fresh in-memory store.
pub fn test_state() -> AppState {
    AppState::new(Config::default_for_test(), Arc::new(MemoryStorage::new()))
}

/// Full router plus the state behind it, for seeding and inspection.
pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    (create_router(state.clone()), state)
}

/// Authorization header value for the given user.
pub fn bearer(user_id: Uuid) -> String {
    let token = generate_access_token(user_id, "test-secret", 900).expect("token generation");
    format!("Bearer {token}")
}

/// Send one request through the router.
pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("infallible")
}

/// Authenticated JSON request.
pub fn authed(method: &str, uri: &str, user_id: Uuid, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer(user_id))
        .header(header::CONTENT_TYPE, "application/json");
    match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Internal-surface JSON request.
pub fn internal(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-internal-token", INTERNAL_TOKEN)
        .header(header::CONTENT_TYPE, "application/json");
    match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("valid JSON body")
}

/// Assert status and return the JSON body.
pub async fn expect_json(response: Response, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
