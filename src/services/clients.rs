use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::client;
use crate::errors::ServiceError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub tax_id: Option<String>,
    pub notes: Option<String>,
}

/// Partial update: absent fields are left untouched.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "email must be a valid address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub tax_id: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClientResponse {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub tax_id: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<client::Model> for ClientResponse {
    fn from(model: client::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            address: model.address,
            city: model.city,
            state: model.state,
            postal_code: model.postal_code,
            country: model.country,
            tax_id: model.tax_id,
            notes: model.notes,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Owner-scoped CRUD over the client directory. Every path filters by the
/// requesting user's id; a client belonging to someone else is
/// indistinguishable from a missing one.
#[derive(Clone)]
pub struct ClientService {
    db: Arc<DbPool>,
}

impl ClientService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request))]
    pub async fn create_client(
        &self,
        user_id: i32,
        request: CreateClientRequest,
    ) -> Result<ClientResponse, ServiceError> {
        let now = Utc::now();
        let created = client::ActiveModel {
            user_id: Set(user_id),
            name: Set(request.name),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            city: Set(request.city),
            state: Set(request.state),
            postal_code: Set(request.postal_code),
            country: Set(request.country),
            tax_id: Set(request.tax_id),
            notes: Set(request.notes),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(client_id = created.id, user_id, "client created");
        Ok(created.into())
    }

    #[instrument(skip(self))]
    pub async fn list_clients(
        &self,
        user_id: i32,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<ClientResponse>, ServiceError> {
        let clients = client::Entity::find()
            .filter(client::Column::UserId.eq(user_id))
            .offset(skip)
            .limit(limit)
            .all(&*self.db)
            .await?;

        Ok(clients.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_client(
        &self,
        user_id: i32,
        client_id: i32,
    ) -> Result<ClientResponse, ServiceError> {
        Ok(self.find_owned(user_id, client_id).await?.into())
    }

    #[instrument(skip(self, request))]
    pub async fn update_client(
        &self,
        user_id: i32,
        client_id: i32,
        request: UpdateClientRequest,
    ) -> Result<ClientResponse, ServiceError> {
        let existing = self.find_owned(user_id, client_id).await?;

        let mut active: client::ActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(email) = request.email {
            active.email = Set(email);
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(address) = request.address {
            active.address = Set(Some(address));
        }
        if let Some(city) = request.city {
            active.city = Set(Some(city));
        }
        if let Some(state) = request.state {
            active.state = Set(Some(state));
        }
        if let Some(postal_code) = request.postal_code {
            active.postal_code = Set(Some(postal_code));
        }
        if let Some(country) = request.country {
            active.country = Set(Some(country));
        }
        if let Some(tax_id) = request.tax_id {
            active.tax_id = Set(Some(tax_id));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn delete_client(&self, user_id: i32, client_id: i32) -> Result<(), ServiceError> {
        let existing = self.find_owned(user_id, client_id).await?;
        existing.delete(&*self.db).await?;
        info!(client_id, user_id, "client deleted");
        Ok(())
    }

    async fn find_owned(&self, user_id: i32, client_id: i32) -> Result<client::Model, ServiceError> {
        client::Entity::find()
            .filter(client::Column::Id.eq(client_id))
            .filter(client::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Client not found".into()))
    }
}
