//! Client directory CRUD and ownership scoping.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;

async fn create_client(app: &TestApp, token: &str, name: &str) -> i64 {
    let response = app
        .request(
            Method::POST,
            "/api/clients",
            Some(json!({
                "name": name,
                "email": format!("{}@client.example.com", name.to_lowercase()),
                "city": "Springfield",
                "country": "US",
            })),
            Some(token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    body["id"].as_i64().expect("client id")
}

#[tokio::test]
async fn client_crud_lifecycle() {
    let app = TestApp::new().await;
    let token = app.register_and_login("owner@example.com").await;

    let id = create_client(&app, &token, "Acme").await;

    let response = app
        .request(Method::GET, &format!("/api/clients/{id}"), None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["name"], "Acme");
    assert_eq!(body["is_active"], true);

    let response = app
        .request(
            Method::PUT,
            &format!("/api/clients/{id}"),
            Some(json!({ "phone": "+1-555-0100", "is_active": false })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["phone"], "+1-555-0100");
    assert_eq!(body["is_active"], false);
    // untouched fields survive the partial update
    assert_eq!(body["name"], "Acme");
    assert_eq!(body["city"], "Springfield");

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/clients/{id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::GET, &format!("/api/clients/{id}"), None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_never_crosses_user_boundaries() {
    let app = TestApp::new().await;
    let token_a = app.register_and_login("usera@example.com").await;
    let token_b = app.register_and_login("userb@example.com").await;

    create_client(&app, &token_a, "OnlyA").await;

    let response = app
        .request(Method::GET, "/api/clients", None, Some(&token_b))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body.as_array().expect("array").len(), 0);

    let response = app
        .request(Method::GET, "/api/clients", None, Some(&token_a))
        .await;
    let body = response_json(response).await;
    assert_eq!(body.as_array().expect("array").len(), 1);
    assert_eq!(body[0]["name"], "OnlyA");
}

#[tokio::test]
async fn single_entity_paths_enforce_ownership() {
    let app = TestApp::new().await;
    let token_a = app.register_and_login("scopea@example.com").await;
    let token_b = app.register_and_login("scopeb@example.com").await;

    let id = create_client(&app, &token_a, "Scoped").await;

    let get = app
        .request(Method::GET, &format!("/api/clients/{id}"), None, Some(&token_b))
        .await;
    assert_eq!(get.status(), StatusCode::NOT_FOUND);

    let update = app
        .request(
            Method::PUT,
            &format!("/api/clients/{id}"),
            Some(json!({ "name": "Hijacked" })),
            Some(&token_b),
        )
        .await;
    assert_eq!(update.status(), StatusCode::NOT_FOUND);

    let delete = app
        .request(
            Method::DELETE,
            &format!("/api/clients/{id}"),
            None,
            Some(&token_b),
        )
        .await;
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);

    // still intact for its owner
    let get = app
        .request(Method::GET, &format!("/api/clients/{id}"), None, Some(&token_a))
        .await;
    assert_eq!(get.status(), StatusCode::OK);
}

#[tokio::test]
async fn list_pagination_applies_skip_and_limit() {
    let app = TestApp::new().await;
    let token = app.register_and_login("pager@example.com").await;

    for i in 0..5 {
        create_client(&app, &token, &format!("Client{i}")).await;
    }

    let response = app
        .request(
            Method::GET,
            "/api/clients?skip=2&limit=2",
            None,
            Some(&token),
        )
        .await;
    let body = response_json(response).await;
    let page = body.as_array().expect("array");
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["name"], "Client2");
    assert_eq!(page[1]["name"], "Client3");
}

#[tokio::test]
async fn invalid_client_email_is_rejected() {
    let app = TestApp::new().await;
    let token = app.register_and_login("strict@example.com").await;

    let response = app
        .request(
            Method::POST,
            "/api/clients",
            Some(json!({ "name": "Bad Email Inc", "email": "nope" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
