pub mod client;
pub mod invoice;
pub mod invoice_item;
pub mod payment;
pub mod user;

pub use invoice::InvoiceStatus;
pub use payment::PaymentMethod;
