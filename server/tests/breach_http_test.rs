//! Breach register endpoint tests.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use helpers::{expect_json, internal, send, test_app};

#[tokio::test]
async fn recording_a_breach_stamps_the_authority_deadline() {
    let (app, state) = test_app();

    let response = send(
        &app,
        internal(
            "POST",
            "/api/internal/breaches",
            Some(json!({
                "description": "Misdirected deposit statement email",
                "severity": "medium",
                "data_categories": ["financial", "personal_basic"],
                "affected_users": 3,
            })),
        ),
    )
    .await;
    let breach = expect_json(response, StatusCode::CREATED).await;
    assert_eq!(breach["reported_to_authority"], json!(false));
    assert!(breach["authority_deadline"].is_string());

    let response = send(&app, internal("GET", "/api/internal/breaches", None)).await;
    let register = expect_json(response, StatusCode::OK).await;
    assert_eq!(register.as_array().unwrap().len(), 1);

    // Register-wide events are audited without a user id.
    let entries = state.audit.entries().await.unwrap();
    assert!(entries.iter().any(|e| e.user_id.is_none()));
}

#[tokio::test]
async fn marking_reported_and_unknown_ids() {
    let (app, _) = test_app();

    let response = send(
        &app,
        internal(
            "POST",
            "/api/internal/breaches",
            Some(json!({
                "description": "Stale access grant on a shared mailbox",
                "severity": "low",
            })),
        ),
    )
    .await;
    let breach = expect_json(response, StatusCode::CREATED).await;
    let id = breach["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        internal("POST", &format!("/api/internal/breaches/{id}/reported"), None),
    )
    .await;
    let updated = expect_json(response, StatusCode::OK).await;
    assert_eq!(updated["reported_to_authority"], json!(true));

    let response = send(
        &app,
        internal(
            "POST",
            &format!("/api/internal/breaches/{}/reported", Uuid::now_v7()),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_description_is_rejected() {
    let (app, _) = test_app();

    let response = send(
        &app,
        internal(
            "POST",
            "/api/internal/breaches",
            Some(json!({"description": "", "severity": "low"})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
