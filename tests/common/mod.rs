use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use invoicing_api::{build_router, config::AppConfig, db, AppState};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

/// Helper harness backed by an in-memory SQLite database. A single pooled
/// connection keeps the database alive for the lifetime of the harness.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "test_secret_key_for_testing_purposes_only".to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = build_router(state.clone());

        Self { router, state }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    /// Register a fresh user and return a bearer token for it.
    pub async fn register_and_login(&self, email: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/auth/register",
                Some(serde_json::json!({
                    "email": email,
                    "password": "password123",
                    "full_name": "Test User",
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "registration failed");

        let response = self
            .request(
                Method::POST,
                "/api/auth/login",
                Some(serde_json::json!({
                    "email": email,
                    "password": "password123",
                })),
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login failed");

        let body = response_json(response).await;
        body["access_token"]
            .as_str()
            .expect("access_token in login response")
            .to_string()
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body bytes")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json response")
}

/// Read a monetary field regardless of whether it was serialized as a JSON
/// string or number. Decimal equality ignores trailing zeros.
pub fn decimal_field(value: &Value, field: &str) -> Decimal {
    let raw = &value[field];
    let text = raw
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string());
    text.parse()
        .unwrap_or_else(|_| panic!("field {field} is not a decimal: {raw}"))
}
