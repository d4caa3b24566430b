use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, LoaderTrait, ModelTrait, QueryFilter,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{client, invoice, invoice_item, InvoiceStatus};
use crate::errors::ServiceError;
use crate::services::validate_non_negative;

/// Invoice-number uniqueness collisions from concurrent processes are retried
/// this many times before surfacing a conflict.
const NUMBER_RETRY_ATTEMPTS: u32 = 3;

/// Produces invoice numbers of the form `INV-20260807131500-0001`. The
/// timestamp is second-granular; the monotonic sequence suffix keeps numbers
/// unique within a process even when the clock does not advance. Collisions
/// across processes surface as database uniqueness violations and are
/// retried by the creation flow.
pub struct InvoiceNumberGenerator {
    prefix: String,
    sequence: AtomicU64,
}

impl InvoiceNumberGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            sequence: AtomicU64::new(1),
        }
    }

    pub fn next(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}-{}-{:04}",
            self.prefix,
            Utc::now().format("%Y%m%d%H%M%S"),
            seq
        )
    }
}

/// Round a monetary value to 2 decimal places, half away from zero.
fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Amount of a single line: `quantity * unit_price`, rounded to cents.
pub fn line_amount(quantity: Decimal, unit_price: Decimal) -> Decimal {
    round_money(quantity * unit_price)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total: Decimal,
}

/// Pure totals derivation over already-derived line amounts. Performs no
/// validation; the DTO boundary rejects negative inputs before they get here.
pub fn compute_totals(
    item_amounts: &[Decimal],
    tax_rate: Decimal,
    discount_amount: Decimal,
) -> InvoiceTotals {
    let subtotal: Decimal = item_amounts.iter().copied().sum();
    totals_from_subtotal(subtotal, tax_rate, discount_amount)
}

/// Totals derivation from a known subtotal. Used by update when the tax rate
/// or discount changes and the stored subtotal is still authoritative.
pub fn totals_from_subtotal(
    subtotal: Decimal,
    tax_rate: Decimal,
    discount_amount: Decimal,
) -> InvoiceTotals {
    let tax_amount = round_money(subtotal * tax_rate / Decimal::ONE_HUNDRED);
    InvoiceTotals {
        subtotal,
        tax_amount,
        total: subtotal + tax_amount - discount_amount,
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct InvoiceItemInput {
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: String,
    #[validate(custom = "validate_non_negative")]
    pub quantity: Decimal,
    #[validate(custom = "validate_non_negative")]
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceRequest {
    pub client_id: i32,
    pub due_date: NaiveDate,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub tax_rate: Decimal,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    pub discount_amount: Decimal,
    pub notes: Option<String>,
    pub terms: Option<String>,
    #[validate(length(min = 1, message = "invoice must contain at least one item"))]
    pub items: Vec<InvoiceItemInput>,
}

/// Partial update: absent fields are left untouched. Changing the tax rate or
/// discount re-derives tax_amount and total from the stored subtotal.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateInvoiceRequest {
    pub client_id: Option<i32>,
    pub status: Option<InvoiceStatus>,
    pub due_date: Option<NaiveDate>,
    #[validate(custom = "validate_non_negative")]
    pub tax_rate: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub discount_amount: Option<Decimal>,
    pub notes: Option<String>,
    pub terms: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceItemResponse {
    pub id: i32,
    pub invoice_id: i32,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<invoice_item::Model> for InvoiceItemResponse {
    fn from(model: invoice_item::Model) -> Self {
        Self {
            id: model.id,
            invoice_id: model.invoice_id,
            description: model.description,
            quantity: model.quantity,
            unit_price: model.unit_price,
            amount: model.amount,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceResponse {
    pub id: i32,
    pub user_id: i32,
    pub client_id: i32,
    pub invoice_number: String,
    pub status: InvoiceStatus,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<InvoiceItemResponse>,
}

impl InvoiceResponse {
    fn from_parts(invoice: invoice::Model, items: Vec<invoice_item::Model>) -> Self {
        Self {
            id: invoice.id,
            user_id: invoice.user_id,
            client_id: invoice.client_id,
            invoice_number: invoice.invoice_number,
            status: invoice.status,
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            subtotal: invoice.subtotal,
            tax_rate: invoice.tax_rate,
            tax_amount: invoice.tax_amount,
            discount_amount: invoice.discount_amount,
            total: invoice.total,
            notes: invoice.notes,
            terms: invoice.terms,
            created_at: invoice.created_at,
            updated_at: invoice.updated_at,
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// The invoice engine: creation with derived totals, owner-scoped reads,
/// partial updates, and cascading deletes. Invoice + items writes share one
/// transaction; there is no partial-persistence window.
#[derive(Clone)]
pub struct InvoiceService {
    db: Arc<DbPool>,
    number_generator: Arc<InvoiceNumberGenerator>,
}

impl InvoiceService {
    pub fn new(db: Arc<DbPool>, number_generator: Arc<InvoiceNumberGenerator>) -> Self {
        Self {
            db,
            number_generator,
        }
    }

    #[instrument(skip(self, request), fields(client_id = request.client_id))]
    pub async fn create_invoice(
        &self,
        user_id: i32,
        request: CreateInvoiceRequest,
    ) -> Result<InvoiceResponse, ServiceError> {
        self.verify_client_ownership(user_id, request.client_id)
            .await?;

        let amounts: Vec<Decimal> = request
            .items
            .iter()
            .map(|item| line_amount(item.quantity, item.unit_price))
            .collect();
        let totals = compute_totals(&amounts, request.tax_rate, request.discount_amount);

        for attempt in 0..NUMBER_RETRY_ATTEMPTS {
            let invoice_number = self.number_generator.next();
            match self
                .insert_invoice_with_items(user_id, &request, &amounts, &totals, &invoice_number)
                .await
            {
                Ok(response) => {
                    info!(
                        invoice_id = response.id,
                        invoice_number = %response.invoice_number,
                        user_id,
                        "invoice created"
                    );
                    return Ok(response);
                }
                Err(e) if is_unique_violation(&e) => {
                    warn!(
                        %invoice_number,
                        attempt,
                        "invoice number collision, regenerating"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::Conflict(
            "Invoice number collision persisted after retries".into(),
        ))
    }

    /// Insert the invoice and all of its items in one transaction.
    async fn insert_invoice_with_items(
        &self,
        user_id: i32,
        request: &CreateInvoiceRequest,
        amounts: &[Decimal],
        totals: &InvoiceTotals,
        invoice_number: &str,
    ) -> Result<InvoiceResponse, DbErr> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let invoice = invoice::ActiveModel {
            user_id: Set(user_id),
            client_id: Set(request.client_id),
            invoice_number: Set(invoice_number.to_string()),
            status: Set(InvoiceStatus::Draft),
            issue_date: Set(now.date_naive()),
            due_date: Set(request.due_date),
            subtotal: Set(totals.subtotal),
            tax_rate: Set(request.tax_rate),
            tax_amount: Set(totals.tax_amount),
            discount_amount: Set(request.discount_amount),
            total: Set(totals.total),
            notes: Set(request.notes.clone()),
            terms: Set(request.terms.clone()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(request.items.len());
        for (input, amount) in request.items.iter().zip(amounts) {
            let item = invoice_item::ActiveModel {
                invoice_id: Set(invoice.id),
                description: Set(input.description.clone()),
                quantity: Set(input.quantity),
                unit_price: Set(input.unit_price),
                amount: Set(*amount),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            items.push(item);
        }

        txn.commit().await?;
        Ok(InvoiceResponse::from_parts(invoice, items))
    }

    #[instrument(skip(self))]
    pub async fn list_invoices(
        &self,
        user_id: i32,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<InvoiceResponse>, ServiceError> {
        let invoices = invoice::Entity::find()
            .filter(invoice::Column::UserId.eq(user_id))
            .offset(skip)
            .limit(limit)
            .all(&*self.db)
            .await?;

        let items = invoices
            .load_many(invoice_item::Entity, &*self.db)
            .await?;

        Ok(invoices
            .into_iter()
            .zip(items)
            .map(|(invoice, items)| InvoiceResponse::from_parts(invoice, items))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_invoice(
        &self,
        user_id: i32,
        invoice_id: i32,
    ) -> Result<InvoiceResponse, ServiceError> {
        let invoice = self.find_owned(user_id, invoice_id).await?;
        let items = invoice
            .find_related(invoice_item::Entity)
            .all(&*self.db)
            .await?;
        Ok(InvoiceResponse::from_parts(invoice, items))
    }

    #[instrument(skip(self, request))]
    pub async fn update_invoice(
        &self,
        user_id: i32,
        invoice_id: i32,
        request: UpdateInvoiceRequest,
    ) -> Result<InvoiceResponse, ServiceError> {
        let existing = self.find_owned(user_id, invoice_id).await?;

        if let Some(client_id) = request.client_id {
            self.verify_client_ownership(user_id, client_id).await?;
        }

        // Re-derive dependent totals when the rate or discount moves; the
        // stored subtotal stays authoritative since items have no edit path.
        let rate_or_discount_changed =
            request.tax_rate.is_some() || request.discount_amount.is_some();
        let tax_rate = request.tax_rate.unwrap_or(existing.tax_rate);
        let discount_amount = request.discount_amount.unwrap_or(existing.discount_amount);
        let totals = totals_from_subtotal(existing.subtotal, tax_rate, discount_amount);

        let mut active: invoice::ActiveModel = existing.into();
        if let Some(client_id) = request.client_id {
            active.client_id = Set(client_id);
        }
        if let Some(status) = request.status {
            active.status = Set(status);
        }
        if let Some(due_date) = request.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(terms) = request.terms {
            active.terms = Set(Some(terms));
        }
        if rate_or_discount_changed {
            active.tax_rate = Set(tax_rate);
            active.discount_amount = Set(discount_amount);
            active.tax_amount = Set(totals.tax_amount);
            active.total = Set(totals.total);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        let items = updated
            .find_related(invoice_item::Entity)
            .all(&*self.db)
            .await?;
        Ok(InvoiceResponse::from_parts(updated, items))
    }

    /// Removes the invoice and all of its items in one transaction, items
    /// first. No orphaned items can remain.
    #[instrument(skip(self))]
    pub async fn delete_invoice(&self, user_id: i32, invoice_id: i32) -> Result<(), ServiceError> {
        let existing = self.find_owned(user_id, invoice_id).await?;

        let txn = self.db.begin().await?;
        invoice_item::Entity::delete_many()
            .filter(invoice_item::Column::InvoiceId.eq(existing.id))
            .exec(&txn)
            .await?;
        invoice::Entity::delete_by_id(existing.id).exec(&txn).await?;
        txn.commit().await?;

        info!(invoice_id, user_id, "invoice deleted");
        Ok(())
    }

    async fn find_owned(
        &self,
        user_id: i32,
        invoice_id: i32,
    ) -> Result<invoice::Model, ServiceError> {
        invoice::Entity::find()
            .filter(invoice::Column::Id.eq(invoice_id))
            .filter(invoice::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Invoice not found".into()))
    }

    async fn verify_client_ownership(
        &self,
        user_id: i32,
        client_id: i32,
    ) -> Result<(), ServiceError> {
        client::Entity::find()
            .filter(client::Column::Id.eq(client_id))
            .filter(client::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Client not found".into()))?;
        Ok(())
    }
}
