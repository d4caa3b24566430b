use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use super::common::PaginationParams;
use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::payments::{CreatePaymentRequest, PaymentResponse, UpdatePaymentRequest};

#[derive(Debug, Deserialize, IntoParams)]
pub struct PaymentFilterParams {
    /// Restrict the listing to one invoice
    pub invoice_id: Option<i32>,
}

/// Record a payment against an invoice
#[utoipa::path(
    post,
    path = "/api/payments",
    request_body = CreatePaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Invoice not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn create_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    let payment = state
        .services
        .payments
        .create_payment(user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// List payments, optionally filtered by invoice
#[utoipa::path(
    get,
    path = "/api/payments",
    params(PaginationParams, PaymentFilterParams),
    responses(
        (status = 200, description = "Payments", body = [PaymentResponse]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn list_payments(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<PaymentFilterParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let payments = state
        .services
        .payments
        .list_payments(
            user.user_id,
            filter.invoice_id,
            pagination.skip,
            pagination.limit,
        )
        .await?;
    Ok(Json(payments))
}

/// Get one payment by id
#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    params(("id" = i32, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment", body = PaymentResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn get_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let payment = state
        .services
        .payments
        .get_payment(user.user_id, id)
        .await?;
    Ok(Json(payment))
}

/// Partially update a payment
#[utoipa::path(
    put,
    path = "/api/payments/{id}",
    params(("id" = i32, Path, description = "Payment id")),
    request_body = UpdatePaymentRequest,
    responses(
        (status = 200, description = "Payment updated", body = PaymentResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn update_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    let payment = state
        .services
        .payments
        .update_payment(user.user_id, id, request)
        .await?;
    Ok(Json(payment))
}

/// Delete a payment
#[utoipa::path(
    delete,
    path = "/api/payments/{id}",
    params(("id" = i32, Path, description = "Payment id")),
    responses(
        (status = 204, description = "Payment deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn delete_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .payments
        .delete_payment(user.user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_payment))
        .route("/", get(list_payments))
        .route("/:id", get(get_payment))
        .route("/:id", put(update_payment))
        .route("/:id", delete(delete_payment))
}
