pub mod admin;
pub mod ajax;
pub mod auth;
pub mod pages;
pub mod rest;

use axum::{http::StatusCode, Json, Router};

use crate::db::StoreError;
use crate::AppState;

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ApiError {
    error: String,
}

pub(crate) fn err(status: StatusCode, msg: &str) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: msg.to_string(),
        }),
    )
}

/// Log a store failure and turn it into a 500.
pub(crate) fn db_err(e: StoreError) -> (StatusCode, Json<ApiError>) {
    tracing::error!("Database error: {e}");
    err(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/admin", admin::router())
        .merge(rest::router())
        .merge(pages::router())
        .merge(ajax::router())
        .with_state(state)
}
