//! Invoice lifecycle: creation with derived totals, scoping, partial update
//! semantics, and cascading delete.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_field, response_json, TestApp};
use invoicing_api::entities::{invoice, invoice_item};
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::{json, Value};

async fn create_client(app: &TestApp, token: &str) -> i64 {
    let response = app
        .request(
            Method::POST,
            "/api/clients",
            Some(json!({ "name": "Acme", "email": "billing@acme.example.com" })),
            Some(token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await["id"].as_i64().expect("id")
}

async fn create_invoice(app: &TestApp, token: &str, client_id: i64) -> Value {
    let response = app
        .request(
            Method::POST,
            "/api/invoices",
            Some(json!({
                "client_id": client_id,
                "due_date": "2026-09-06",
                "tax_rate": 10,
                "discount_amount": 0,
                "items": [
                    { "description": "Consulting", "quantity": 2, "unit_price": 25.00 },
                    { "description": "Materials", "quantity": 1, "unit_price": 10.00 },
                ],
            })),
            Some(token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await
}

#[tokio::test]
async fn end_to_end_invoice_and_payment_flow() {
    let app = TestApp::new().await;
    let token = app.register_and_login("flow@example.com").await;
    let client_id = create_client(&app, &token).await;

    let invoice = create_invoice(&app, &token, client_id).await;
    assert_eq!(decimal_field(&invoice, "subtotal"), dec!(60.00));
    assert_eq!(decimal_field(&invoice, "tax_amount"), dec!(6.00));
    assert_eq!(decimal_field(&invoice, "total"), dec!(66.00));
    assert_eq!(invoice["status"], "draft");
    assert_eq!(invoice["items"].as_array().expect("items").len(), 2);
    assert_eq!(decimal_field(&invoice["items"][0], "amount"), dec!(50.00));
    assert_eq!(decimal_field(&invoice["items"][1], "amount"), dec!(10.00));

    let invoice_id = invoice["id"].as_i64().expect("invoice id");

    let response = app
        .request(
            Method::POST,
            "/api/payments",
            Some(json!({
                "invoice_id": invoice_id,
                "amount": 66.00,
                "payment_method": "bank_transfer",
                "reference_number": "WIRE-001",
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::GET,
            &format!("/api/payments?invoice_id={invoice_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let payments = response_json(response).await;
    let rows = payments.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(decimal_field(&rows[0], "amount"), dec!(66.00));
    assert_eq!(rows[0]["payment_method"], "bank_transfer");
}

#[tokio::test]
async fn invoice_numbers_are_unique_and_prefixed() {
    let app = TestApp::new().await;
    let token = app.register_and_login("numbers@example.com").await;
    let client_id = create_client(&app, &token).await;

    let first = create_invoice(&app, &token, client_id).await;
    let second = create_invoice(&app, &token, client_id).await;

    let n1 = first["invoice_number"].as_str().expect("number");
    let n2 = second["invoice_number"].as_str().expect("number");
    assert!(n1.starts_with("INV-"));
    assert!(n2.starts_with("INV-"));
    assert_ne!(n1, n2);
}

#[tokio::test]
async fn creating_invoice_for_unowned_client_persists_nothing() {
    let app = TestApp::new().await;
    let token_a = app.register_and_login("invowner@example.com").await;
    let token_b = app.register_and_login("intruder@example.com").await;
    let client_id = create_client(&app, &token_a).await;

    let response = app
        .request(
            Method::POST,
            "/api/invoices",
            Some(json!({
                "client_id": client_id,
                "due_date": "2026-09-06",
                "items": [{ "description": "Nope", "quantity": 1, "unit_price": 1.00 }],
            })),
            Some(&token_b),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let invoices = invoice::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count invoices");
    let items = invoice_item::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count items");
    assert_eq!(invoices, 0, "no invoice row may be persisted");
    assert_eq!(items, 0, "no item row may be persisted");
}

#[tokio::test]
async fn partial_status_update_leaves_totals_untouched() {
    let app = TestApp::new().await;
    let token = app.register_and_login("partial@example.com").await;
    let client_id = create_client(&app, &token).await;
    let invoice = create_invoice(&app, &token, client_id).await;
    let invoice_id = invoice["id"].as_i64().expect("id");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/invoices/{invoice_id}"),
            Some(json!({ "status": "sent" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;

    assert_eq!(updated["status"], "sent");
    assert_eq!(decimal_field(&updated, "subtotal"), dec!(60.00));
    assert_eq!(decimal_field(&updated, "tax_rate"), dec!(10));
    assert_eq!(decimal_field(&updated, "tax_amount"), dec!(6.00));
    assert_eq!(decimal_field(&updated, "discount_amount"), dec!(0));
    assert_eq!(decimal_field(&updated, "total"), dec!(66.00));
    assert_eq!(updated["invoice_number"], invoice["invoice_number"]);
    assert_eq!(updated["due_date"], invoice["due_date"]);
    assert_eq!(updated["items"].as_array().expect("items").len(), 2);
}

#[tokio::test]
async fn changing_tax_rate_rederives_totals_from_subtotal() {
    let app = TestApp::new().await;
    let token = app.register_and_login("rederive@example.com").await;
    let client_id = create_client(&app, &token).await;
    let invoice = create_invoice(&app, &token, client_id).await;
    let invoice_id = invoice["id"].as_i64().expect("id");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/invoices/{invoice_id}"),
            Some(json!({ "tax_rate": 8.25, "discount_amount": 5.00 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;

    // 60.00 * 8.25% = 4.95; 60.00 + 4.95 - 5.00 = 59.95
    assert_eq!(decimal_field(&updated, "subtotal"), dec!(60.00));
    assert_eq!(decimal_field(&updated, "tax_amount"), dec!(4.95));
    assert_eq!(decimal_field(&updated, "total"), dec!(59.95));
}

#[tokio::test]
async fn deleting_invoice_leaves_no_orphaned_items() {
    let app = TestApp::new().await;
    let token = app.register_and_login("cascade@example.com").await;
    let client_id = create_client(&app, &token).await;
    let invoice = create_invoice(&app, &token, client_id).await;
    let invoice_id = invoice["id"].as_i64().expect("id");

    let before = invoice_item::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count items");
    assert_eq!(before, 2);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/invoices/{invoice_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let after = invoice_item::Entity::find()
        .count(&*app.state.db)
        .await
        .expect("count items");
    assert_eq!(after, 0, "orphaned item rows remain after invoice delete");

    let response = app
        .request(
            Method::GET,
            &format!("/api/invoices/{invoice_id}"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invoice_reads_are_owner_scoped() {
    let app = TestApp::new().await;
    let token_a = app.register_and_login("reader@example.com").await;
    let token_b = app.register_and_login("other@example.com").await;
    let client_id = create_client(&app, &token_a).await;
    let invoice = create_invoice(&app, &token_a, client_id).await;
    let invoice_id = invoice["id"].as_i64().expect("id");

    let response = app
        .request(
            Method::GET,
            &format!("/api/invoices/{invoice_id}"),
            None,
            Some(&token_b),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::GET, "/api/invoices", None, Some(&token_b))
        .await;
    let body = response_json(response).await;
    assert_eq!(body.as_array().expect("array").len(), 0);
}

#[tokio::test]
async fn empty_item_list_is_rejected() {
    let app = TestApp::new().await;
    let token = app.register_and_login("noitems@example.com").await;
    let client_id = create_client(&app, &token).await;

    let response = app
        .request(
            Method::POST,
            "/api/invoices",
            Some(json!({
                "client_id": client_id,
                "due_date": "2026-09-06",
                "items": [],
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn negative_amounts_are_rejected_at_the_boundary() {
    let app = TestApp::new().await;
    let token = app.register_and_login("negative@example.com").await;
    let client_id = create_client(&app, &token).await;

    let negative_quantity = app
        .request(
            Method::POST,
            "/api/invoices",
            Some(json!({
                "client_id": client_id,
                "due_date": "2026-09-06",
                "items": [{ "description": "Bad", "quantity": -1, "unit_price": 10.00 }],
            })),
            Some(&token),
        )
        .await;
    assert_eq!(negative_quantity.status(), StatusCode::BAD_REQUEST);

    let negative_discount = app
        .request(
            Method::POST,
            "/api/invoices",
            Some(json!({
                "client_id": client_id,
                "due_date": "2026-09-06",
                "discount_amount": -5.00,
                "items": [{ "description": "Ok", "quantity": 1, "unit_price": 10.00 }],
            })),
            Some(&token),
        )
        .await;
    assert_eq!(negative_discount.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_status_value_is_rejected() {
    let app = TestApp::new().await;
    let token = app.register_and_login("badstatus@example.com").await;
    let client_id = create_client(&app, &token).await;
    let invoice = create_invoice(&app, &token, client_id).await;
    let invoice_id = invoice["id"].as_i64().expect("id");

    let response = app
        .request(
            Method::PUT,
            &format!("/api/invoices/{invoice_id}"),
            Some(json!({ "status": "archived" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
