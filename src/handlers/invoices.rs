use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use validator::Validate;

use super::common::PaginationParams;
use crate::auth::AuthUser;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::invoices::{CreateInvoiceRequest, InvoiceResponse, UpdateInvoiceRequest};

/// Create an invoice with its line items
#[utoipa::path(
    post,
    path = "/api/invoices",
    request_body = CreateInvoiceRequest,
    responses(
        (status = 201, description = "Invoice created", body = InvoiceResponse),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Client not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Invoice number conflict", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn create_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    for item in &request.items {
        item.validate()?;
    }
    let invoice = state
        .services
        .invoices
        .create_invoice(user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// List the requesting user's invoices, items included
#[utoipa::path(
    get,
    path = "/api/invoices",
    params(PaginationParams),
    responses(
        (status = 200, description = "Invoices", body = [InvoiceResponse]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn list_invoices(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let invoices = state
        .services
        .invoices
        .list_invoices(user.user_id, pagination.skip, pagination.limit)
        .await?;
    Ok(Json(invoices))
}

/// Get one invoice by id, items included
#[utoipa::path(
    get,
    path = "/api/invoices/{id}",
    params(("id" = i32, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice", body = InvoiceResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn get_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    let invoice = state
        .services
        .invoices
        .get_invoice(user.user_id, id)
        .await?;
    Ok(Json(invoice))
}

/// Partially update an invoice
#[utoipa::path(
    put,
    path = "/api/invoices/{id}",
    params(("id" = i32, Path, description = "Invoice id")),
    request_body = UpdateInvoiceRequest,
    responses(
        (status = 200, description = "Invoice updated", body = InvoiceResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn update_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateInvoiceRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    request.validate()?;
    let invoice = state
        .services
        .invoices
        .update_invoice(user.user_id, id, request)
        .await?;
    Ok(Json(invoice))
}

/// Delete an invoice and all of its items
#[utoipa::path(
    delete,
    path = "/api/invoices/{id}",
    params(("id" = i32, Path, description = "Invoice id")),
    responses(
        (status = 204, description = "Invoice deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Invoices"
)]
pub async fn delete_invoice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .invoices
        .delete_invoice(user.user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn invoice_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_invoice))
        .route("/", get(list_invoices))
        .route("/:id", get(get_invoice))
        .route("/:id", put(update_invoice))
        .route("/:id", delete(delete_invoice))
}
