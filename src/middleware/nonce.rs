//! Short-lived action nonces for form posts and AJAX calls.
//!
//! A nonce is a signed token naming one action and, optionally, the user it
//! was issued to. It verifies only for that action (and that user).

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::models::user::NonceClaims;

/// Nonces stay valid for a day.
pub const NONCE_LIFETIME_SECS: usize = 24 * 3600;

pub fn create_nonce(
    action: &str,
    user_id: Option<Uuid>,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = NonceClaims {
        action: action.to_string(),
        uid: user_id,
        exp: now + NONCE_LIFETIME_SECS,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// True when `nonce` was issued for `action` (and for `user_id`, if it names a user).
pub fn verify_nonce(nonce: &str, action: &str, user_id: Option<Uuid>, secret: &str) -> bool {
    let Ok(data) = decode::<NonceClaims>(
        nonce,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    ) else {
        return false;
    };
    let claims = data.claims;
    claims.action == action && (claims.uid.is_none() || claims.uid == user_id)
}
