use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Create, edit and delete slots and their metadata.
    EditSlots,
    /// Change site settings.
    ManageOptions,
}

impl Role {
    pub fn can(&self, capability: Capability) -> bool {
        match (self, capability) {
            (Role::Administrator, _) => true,
            (Role::Editor, Capability::EditSlots) => true,
            (Role::Editor, Capability::ManageOptions) => false,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
#[allow(dead_code)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT token
    pub token: String,
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

/// Payload of a short-lived action nonce.
#[derive(Debug, Serialize, Deserialize)]
pub struct NonceClaims {
    pub action: String,
    /// Set when the nonce was minted for a signed-in user.
    pub uid: Option<Uuid>,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NonceResponse {
    pub action: String,
    pub nonce: String,
}
