pub mod cache;
pub mod config;
pub mod db;
pub mod events;
pub mod listing;
pub mod meta_box;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod shortcode;
pub mod template;
pub mod themes;

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use cache::SlotsCache;
use config::Config;
use events::Dispatcher;
use template::registry::TemplateRegistry;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    /// Query cache for grid and detail lookups.
    pub cache: Arc<SlotsCache>,
    /// Slot change notifications; the cache is registered on construction.
    pub events: Arc<Dispatcher>,
    pub templates: Arc<TemplateRegistry>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config, templates: TemplateRegistry) -> Self {
        let cache = Arc::new(SlotsCache::new(config.cache_enabled, config.cache_expiration));
        if cache.is_enabled() {
            tracing::info!("Query cache enabled ({}s)", config.cache_expiration.as_secs());
        }
        let dispatcher = Arc::new(Dispatcher::new());
        events::register_cache_invalidation(&dispatcher, cache.clone());
        Self {
            db,
            config: Arc::new(config),
            cache,
            events: dispatcher,
            templates: Arc::new(templates),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::auth::login,
        routes::admin::list_slots,
        routes::admin::create_slot,
        routes::admin::get_slot,
        routes::admin::update_slot,
        routes::admin::delete_slot,
        routes::admin::backfill_ids,
        routes::admin::meta_box,
        routes::admin::list_templates,
        routes::admin::save_meta,
        routes::admin::get_settings,
        routes::admin::put_settings,
        routes::admin::mint_nonce,
        routes::rest::list_slots,
        routes::rest::get_slot,
        routes::pages::grid,
        routes::pages::detail,
        routes::pages::render,
        routes::pages::slot_page,
        routes::pages::stylesheet,
        routes::ajax::ajax,
    ),
    components(schemas(
        routes::ApiError,
        models::user::LoginRequest,
        models::user::AuthResponse,
        models::user::Role,
        models::user::NonceResponse,
        models::slot::SlotStatus,
        models::slot::SlotMetaInput,
        models::slot::CreateSlotRequest,
        models::slot::UpdateSlotRequest,
        models::slot::SlotSummary,
        models::slot::SlotResource,
        models::settings::Settings,
        template::registry::TemplateInfo,
        routes::rest::SlotListResponse,
        routes::rest::SlotItemResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Administrator login"),
        (name = "Admin", description = "Slot editing, metadata and settings"),
        (name = "Slots", description = "Public read-only slot listing"),
        (name = "Shortcodes", description = "Rendered grid and detail HTML")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                ),
            ),
        );
    }
}

fn cors_layer(cors_origins: &str) -> CorsLayer {
    if cors_origins.is_empty() || cors_origins == "*" {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = cors_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::AUTHORIZATION, axum::http::header::CONTENT_TYPE])
        .allow_credentials(true)
}

/// Full application: routes, API docs, CORS and request tracing.
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    routes::api_router(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
