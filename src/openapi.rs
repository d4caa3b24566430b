use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Invoicing API",
        version = "0.1.0",
        description = "Multi-tenant invoicing backend: clients, invoices with line items, and payments. All resource endpoints require a bearer token and are scoped to the authenticated user."
    ),
    tags(
        (name = "Auth", description = "Registration, login, and current-user lookup"),
        (name = "Clients", description = "Client directory endpoints"),
        (name = "Invoices", description = "Invoice lifecycle endpoints"),
        (name = "Payments", description = "Payment ledger endpoints")
    ),
    paths(
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::me,
        crate::handlers::clients::create_client,
        crate::handlers::clients::list_clients,
        crate::handlers::clients::get_client,
        crate::handlers::clients::update_client,
        crate::handlers::clients::delete_client,
        crate::handlers::invoices::create_invoice,
        crate::handlers::invoices::list_invoices,
        crate::handlers::invoices::get_invoice,
        crate::handlers::invoices::update_invoice,
        crate::handlers::invoices::delete_invoice,
        crate::handlers::payments::create_payment,
        crate::handlers::payments::list_payments,
        crate::handlers::payments::get_payment,
        crate::handlers::payments::update_payment,
        crate::handlers::payments::delete_payment,
    ),
    components(
        schemas(
            crate::services::users::RegisterRequest,
            crate::services::users::LoginRequest,
            crate::services::users::TokenResponse,
            crate::services::users::UserResponse,
            crate::services::clients::CreateClientRequest,
            crate::services::clients::UpdateClientRequest,
            crate::services::clients::ClientResponse,
            crate::services::invoices::InvoiceItemInput,
            crate::services::invoices::CreateInvoiceRequest,
            crate::services::invoices::UpdateInvoiceRequest,
            crate::services::invoices::InvoiceItemResponse,
            crate::services::invoices::InvoiceResponse,
            crate::services::payments::CreatePaymentRequest,
            crate::services::payments::UpdatePaymentRequest,
            crate::services::payments::PaymentResponse,
            crate::entities::InvoiceStatus,
            crate::entities::PaymentMethod,
            crate::errors::ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
