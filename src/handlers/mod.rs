pub mod auth;
pub mod clients;
pub mod common;
pub mod invoices;
pub mod payments;

use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::clients::ClientService;
use crate::services::invoices::{InvoiceNumberGenerator, InvoiceService};
use crate::services::payments::PaymentService;
use crate::services::users::UserService;

/// Services layer that encapsulates business logic used by HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub clients: Arc<ClientService>,
    pub invoices: Arc<InvoiceService>,
    pub payments: Arc<PaymentService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, auth: Arc<AuthService>, config: &AppConfig) -> Self {
        let number_generator = Arc::new(InvoiceNumberGenerator::new(
            config.invoice_number_prefix.clone(),
        ));
        Self {
            users: Arc::new(UserService::new(db.clone(), auth)),
            clients: Arc::new(ClientService::new(db.clone())),
            invoices: Arc::new(InvoiceService::new(db.clone(), number_generator)),
            payments: Arc::new(PaymentService::new(db)),
        }
    }
}
