//! Authentication for the invoicing API.
//!
//! JWT bearer tokens (HS256) carry the user id; passwords are stored as
//! argon2 hashes. The [`AuthUser`] extractor resolves a request's credential
//! to an active user or fails with `Unauthorized`.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user;
use crate::errors::ServiceError;
use crate::AppState;

/// Claim structure for JWT tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Unique identifier for this token
    pub jti: String,
    /// Issued at time
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

/// Issues and validates tokens, hashes and verifies passwords.
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl AuthService {
    pub fn new(jwt_secret: &str, expiration_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            expiration_secs,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ServiceError::InternalError(format!("password hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    pub fn verify_password(&self, password: &str, hashed: &str) -> Result<bool, ServiceError> {
        let parsed = PasswordHash::new(hashed)
            .map_err(|e| ServiceError::InternalError(format!("stored hash is malformed: {e}")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Issue an access token for the given user id.
    pub fn issue_token(&self, user_id: i32) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.expiration_secs,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::InternalError(format!("token encoding failed: {e}")))
    }

    /// Validate a token's signature and expiry, returning its claims.
    pub fn decode_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| ServiceError::Unauthorized("Could not validate credentials".into()))
    }
}

/// The authenticated principal, extracted from the bearer token and verified
/// against the user table.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ServiceError::Unauthorized("Missing bearer token".into()))?;

        let claims = state.auth.decode_token(token)?;
        let user_id: i32 = claims
            .sub
            .parse()
            .map_err(|_| ServiceError::Unauthorized("Could not validate credentials".into()))?;

        let user = user::Entity::find_by_id(user_id)
            .one(&*state.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("Could not validate credentials".into()))?;

        if !user.is_active {
            return Err(ServiceError::Unauthorized("Inactive user".into()));
        }

        Ok(AuthUser {
            user_id: user.id,
            email: user.email,
        })
    }
}
