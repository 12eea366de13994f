//! Consent endpoint tests: banner submission, per-category updates, the
//! cookie mirror and privacy policy acceptance.

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use uuid::Uuid;

use helpers::{authed, expect_json, send, test_app};

#[tokio::test]
async fn consent_routes_require_a_bearer_token() {
    let (app, _) = test_app();

    let response = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/api/me/consents")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/api/me/consents")
            .header(header::AUTHORIZATION, "Bearer not.a.token")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn banner_submission_sets_the_consent_cookie() {
    let (app, _) = test_app();
    let user_id = Uuid::now_v7();

    let response = send(
        &app,
        authed(
            "POST",
            "/api/me/consents",
            user_id,
            Some(json!({
                "analytics": true,
                "marketing": false,
                "functional": true,
                "third_party": false,
            })),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("gdpr_consent="));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("Max-Age=2592000"), "30 days: {cookie}");
    assert!(!cookie.contains("HttpOnly"), "mirror must be script-readable");

    let summary = helpers::body_json(response).await;
    assert_eq!(summary["essential"], json!(true));
    assert_eq!(summary["analytics"], json!(true));
    assert_eq!(summary["marketing"], json!(false));
}

#[tokio::test]
async fn banner_submission_records_every_category() {
    let (app, _) = test_app();
    let user_id = Uuid::now_v7();

    send(
        &app,
        authed(
            "POST",
            "/api/me/consents",
            user_id,
            Some(json!({
                "analytics": false,
                "marketing": false,
                "functional": false,
                "third_party": false,
            })),
        ),
    )
    .await;

    let response = send(&app, authed("GET", "/api/me/consents", user_id, None)).await;
    let records = expect_json(response, StatusCode::OK).await;
    assert_eq!(records.as_array().unwrap().len(), 5);

    // Reject-all still grants essential.
    let response = send(
        &app,
        authed("GET", "/api/me/consents/essential", user_id, None),
    )
    .await;
    let status = expect_json(response, StatusCode::OK).await;
    assert_eq!(status["valid"], json!(true));

    let response = send(
        &app,
        authed("GET", "/api/me/consents/analytics", user_id, None),
    )
    .await;
    let status = expect_json(response, StatusCode::OK).await;
    assert_eq!(status["valid"], json!(false));
}

#[tokio::test]
async fn single_category_update_supersedes_prior_record() {
    let (app, _) = test_app();
    let user_id = Uuid::now_v7();

    let response = send(
        &app,
        authed(
            "PUT",
            "/api/me/consents/marketing",
            user_id,
            Some(json!({"granted": true})),
        ),
    )
    .await;
    let record = expect_json(response, StatusCode::OK).await;
    assert_eq!(record["granted"], json!(true));
    assert_eq!(record["lawful_basis"], json!("consent"));

    let response = send(
        &app,
        authed(
            "PUT",
            "/api/me/consents/marketing",
            user_id,
            Some(json!({"granted": false})),
        ),
    )
    .await;
    expect_json(response, StatusCode::OK).await;

    let response = send(&app, authed("GET", "/api/me/consents", user_id, None)).await;
    let records = expect_json(response, StatusCode::OK).await;
    assert_eq!(records.as_array().unwrap().len(), 1, "superseded, not appended");
    assert_eq!(records[0]["granted"], json!(false));
}

#[tokio::test]
async fn essential_revocation_is_coerced_to_granted() {
    let (app, _) = test_app();
    let user_id = Uuid::now_v7();

    let response = send(
        &app,
        authed(
            "PUT",
            "/api/me/consents/essential",
            user_id,
            Some(json!({"granted": false})),
        ),
    )
    .await;
    let record = expect_json(response, StatusCode::OK).await;
    assert_eq!(record["granted"], json!(true));
    assert_eq!(record["lawful_basis"], json!("contract"));
}

#[tokio::test]
async fn privacy_policy_acceptance_roundtrip() {
    let (app, _) = test_app();
    let user_id = Uuid::now_v7();

    let response = send(&app, authed("GET", "/api/me/privacy-policy", user_id, None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        authed(
            "POST",
            "/api/me/privacy-policy",
            user_id,
            Some(json!({"version": "2026-01"})),
        ),
    )
    .await;
    let acceptance = expect_json(response, StatusCode::CREATED).await;
    assert_eq!(acceptance["version"], json!("2026-01"));

    let response = send(&app, authed("GET", "/api/me/privacy-policy", user_id, None)).await;
    let acceptance = expect_json(response, StatusCode::OK).await;
    assert_eq!(acceptance["version"], json!("2026-01"));
}

#[tokio::test]
async fn empty_policy_version_is_rejected() {
    let (app, _) = test_app();

    let response = send(
        &app,
        authed(
            "POST",
            "/api/me/privacy-policy",
            Uuid::now_v7(),
            Some(json!({"version": ""})),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
