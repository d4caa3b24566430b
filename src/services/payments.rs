use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, ModelTrait, QueryFilter, QuerySelect,
    RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{invoice, payment, PaymentMethod};
use crate::errors::ServiceError;
use crate::services::validate_non_negative;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePaymentRequest {
    pub invoice_id: i32,
    #[validate(custom = "validate_non_negative")]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePaymentRequest {
    #[validate(custom = "validate_non_negative")]
    pub amount: Option<Decimal>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_date: Option<DateTime<Utc>>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub invoice_id: i32,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            invoice_id: model.invoice_id,
            amount: model.amount,
            payment_method: model.payment_method,
            payment_date: model.payment_date,
            reference_number: model.reference_number,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Payment ledger CRUD, scoped through the owning invoice's user. Payments
/// never feed back into invoice status or totals.
#[derive(Clone)]
pub struct PaymentService {
    db: Arc<DbPool>,
}

impl PaymentService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(invoice_id = request.invoice_id))]
    pub async fn create_payment(
        &self,
        user_id: i32,
        request: CreatePaymentRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        invoice::Entity::find()
            .filter(invoice::Column::Id.eq(request.invoice_id))
            .filter(invoice::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Invoice not found".into()))?;

        let now = Utc::now();
        let created = payment::ActiveModel {
            invoice_id: Set(request.invoice_id),
            amount: Set(request.amount),
            payment_method: Set(request.payment_method),
            payment_date: Set(now),
            reference_number: Set(request.reference_number),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(payment_id = created.id, user_id, "payment recorded");
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn list_payments(
        &self,
        user_id: i32,
        invoice_id: Option<i32>,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<PaymentResponse>, ServiceError> {
        let mut query = payment::Entity::find()
            .join(JoinType::InnerJoin, payment::Relation::Invoice.def())
            .filter(invoice::Column::UserId.eq(user_id));

        if let Some(invoice_id) = invoice_id {
            query = query.filter(payment::Column::InvoiceId.eq(invoice_id));
        }

        let payments = query.offset(skip).limit(limit).all(&*self.db).await?;
        Ok(payments.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_payment(
        &self,
        user_id: i32,
        payment_id: i32,
    ) -> Result<PaymentResponse, ServiceError> {
        Ok(self.find_owned(user_id, payment_id).await?.into())
    }

    #[instrument(skip(self, request))]
    pub async fn update_payment(
        &self,
        user_id: i32,
        payment_id: i32,
        request: UpdatePaymentRequest,
    ) -> Result<PaymentResponse, ServiceError> {
        let existing = self.find_owned(user_id, payment_id).await?;

        let mut active: payment::ActiveModel = existing.into();
        if let Some(amount) = request.amount {
            active.amount = Set(amount);
        }
        if let Some(payment_method) = request.payment_method {
            active.payment_method = Set(payment_method);
        }
        if let Some(payment_date) = request.payment_date {
            active.payment_date = Set(payment_date);
        }
        if let Some(reference_number) = request.reference_number {
            active.reference_number = Set(Some(reference_number));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_payment(&self, user_id: i32, payment_id: i32) -> Result<(), ServiceError> {
        let existing = self.find_owned(user_id, payment_id).await?;
        existing.delete(&*self.db).await?;
        info!(payment_id, user_id, "payment deleted");
        Ok(())
    }

    async fn find_owned(
        &self,
        user_id: i32,
        payment_id: i32,
    ) -> Result<payment::Model, ServiceError> {
        payment::Entity::find()
            .filter(payment::Column::Id.eq(payment_id))
            .join(JoinType::InnerJoin, payment::Relation::Invoice.def())
            .filter(invoice::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Payment not found".into()))
    }
}
