use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use sqlx::SqlitePool;

use super::{err, ApiError};
use crate::config::Config;
use crate::db::{self, StoreError};
use crate::middleware::auth::create_token;
use crate::models::user::{AuthResponse, LoginRequest, Role};
use crate::AppState;

use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to hash admin password: {0}")]
    Hash(password_hash::Error),
}

/// Seed the first administrator from `ADMIN_EMAIL`/`ADMIN_PASSWORD` when no
/// users exist yet. Returns whether an account was created.
pub async fn ensure_admin(pool: &SqlitePool, config: &Config) -> Result<bool, BootstrapError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(false);
    };
    if db::users::count(pool).await? > 0 {
        return Ok(false);
    }
    let hash = hash_password(password).map_err(BootstrapError::Hash)?;
    let email = email.trim().to_lowercase();
    db::users::insert(pool, &email, &hash, Role::Administrator).await?;
    tracing::info!("Created administrator account {email}");
    Ok(true)
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ApiError),
    ),
    tag = "Auth"
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ApiError>)> {
    let email = req.email.trim().to_lowercase();

    let user = db::users::find_by_email(&state.db, &email)
        .await
        .map_err(super::db_err)?
        .ok_or_else(|| err(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| err(StatusCode::INTERNAL_SERVER_ERROR, "Invalid stored hash"))?;

    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| err(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    let token = create_token(user.id, user.role, &state.config.jwt_secret)
        .map_err(|_| err(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create token"))?;

    Ok(Json(AuthResponse {
        token,
        user_id: user.id,
        role: user.role,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn seeds_admin_once() {
        let pool = test_pool().await;
        let config = Config {
            admin_email: Some(" Admin@Example.com ".into()),
            admin_password: Some("correct horse".into()),
            ..Config::default()
        };
        assert!(ensure_admin(&pool, &config).await.unwrap());
        assert!(!ensure_admin(&pool, &config).await.unwrap());

        let user = db::users::find_by_email(&pool, "admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role, Role::Administrator);
        let parsed = PasswordHash::new(&user.password_hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"correct horse", &parsed)
            .is_ok());
    }

    #[tokio::test]
    async fn no_credentials_no_admin() {
        let pool = test_pool().await;
        assert!(!ensure_admin(&pool, &Config::default()).await.unwrap());
        assert_eq!(db::users::count(&pool).await.unwrap(), 0);
    }
}
