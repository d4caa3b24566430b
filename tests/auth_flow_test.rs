//! Registration, login, and token handling through the HTTP surface.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn register_login_me_round_trip() {
    let app = TestApp::new().await;

    let token = app.register_and_login("alice@example.com").await;

    let response = app
        .request(Method::GET, "/api/auth/me", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["full_name"], "Test User");
    assert_eq!(body["is_active"], true);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;
    app.register_and_login("bob@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "bob@example.com", "password": "wrong-password" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_is_conflict() {
    let app = TestApp::new().await;
    app.register_and_login("carol@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(json!({ "email": "carol@example.com", "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_registration_email_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/auth/register",
            Some(json!({ "email": "not-an-email", "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = TestApp::new().await;

    for uri in ["/api/auth/me", "/api/clients", "/api/invoices", "/api/payments"] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{uri} should require authentication"
        );
    }
}

#[tokio::test]
async fn malformed_tokens_are_rejected() {
    let app = TestApp::new().await;

    for token in ["", "garbage", "eyJhbGciOiJIUzI1NiJ9.e30"] {
        let response = app
            .request(Method::GET, "/api/auth/me", None, Some(token))
            .await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "token {token:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
}
