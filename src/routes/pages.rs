//! HTML surfaces: shortcode endpoints, content rendering and slot pages.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};

use crate::db;
use crate::listing::{self, SLOT_NOT_FOUND};
use crate::shortcode::{Attrs, DetailAtts};
use crate::template::escape::{esc_html, esc_url};
use crate::themes::theme_css;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shortcodes/slots_grid", get(grid))
        .route("/shortcodes/slot_detail", get(detail))
        .route("/render", post(render))
        .route("/slot/{slug}", get(slot_page))
        .route("/slots/theme.css", get(stylesheet))
}

/// Shortcode attribute names are case-insensitive.
fn lowercase_keys(attrs: Attrs) -> Attrs {
    attrs
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect()
}

#[utoipa::path(
    get,
    path = "/shortcodes/slots_grid",
    params(
        ("limit" = Option<u32>, Query, description = "1–100"),
        ("sort" = Option<String>, Query, description = "recent or random"),
        ("show_filters" = Option<bool>, Query),
        ("show_pagination" = Option<bool>, Query),
        ("class" = Option<String>, Query),
    ),
    responses((status = 200, description = "Grid markup", body = String, content_type = "text/html")),
    tag = "Shortcodes"
)]
pub(crate) async fn grid(State(state): State<AppState>, Query(attrs): Query<Attrs>) -> Html<String> {
    Html(listing::grid_shortcode(&state, &lowercase_keys(attrs)).await)
}

#[utoipa::path(
    get,
    path = "/shortcodes/slot_detail",
    params(
        ("id" = Option<String>, Query, description = "Slot id or numeric id"),
        ("template" = Option<String>, Query, description = "Template key"),
        ("class" = Option<String>, Query),
    ),
    responses((status = 200, description = "Detail markup", body = String, content_type = "text/html")),
    tag = "Shortcodes"
)]
pub(crate) async fn detail(State(state): State<AppState>, Query(attrs): Query<Attrs>) -> Html<String> {
    Html(listing::detail_shortcode(&state, &lowercase_keys(attrs)).await)
}

#[utoipa::path(
    post,
    path = "/render",
    request_body(content = String, content_type = "text/plain"),
    responses((status = 200, description = "Text with shortcodes expanded", body = String, content_type = "text/html")),
    tag = "Shortcodes"
)]
pub(crate) async fn render(State(state): State<AppState>, body: String) -> Html<String> {
    Html(listing::expand(&state, &body).await)
}

fn page(title: &str, stylesheet: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<link rel=\"stylesheet\" href=\"{}\">\n</head>\n<body>\n{body}</body>\n</html>\n",
        esc_html(title),
        esc_url(stylesheet)
    )
}

#[utoipa::path(
    get,
    path = "/slot/{slug}",
    params(("slug" = String, Path, description = "Slot slug")),
    responses(
        (status = 200, description = "Slot page", body = String, content_type = "text/html"),
        (status = 404, description = "No published slot with that slug", body = String, content_type = "text/html"),
    ),
    tag = "Shortcodes"
)]
pub(crate) async fn slot_page(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let stylesheet = format!("{}/slots/theme.css", state.config.site_url);
    let loaded = async {
        let slot = db::slots::find_published_by_slug(&state.db, &slug).await?;
        let settings = db::settings::load(&state.db).await?;
        Ok::<_, db::StoreError>((slot, settings))
    }
    .await;

    match loaded {
        Ok((Some(slot), settings)) => {
            let body = listing::render_detail(&state, &slot, &settings, &DetailAtts::from_attrs(&Attrs::new()));
            Html(page(&slot.title, &stylesheet, &body)).into_response()
        }
        Ok((None, _)) => (
            StatusCode::NOT_FOUND,
            Html(page("Slot not found", &stylesheet, SLOT_NOT_FOUND)),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Slot page {slug} failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/slots/theme.css",
    responses((status = 200, description = "Custom theme stylesheet; empty for the default theme", body = String, content_type = "text/css")),
    tag = "Shortcodes"
)]
pub(crate) async fn stylesheet(State(state): State<AppState>) -> Response {
    match db::settings::load(&state.db).await {
        Ok(settings) => (
            [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
            theme_css(&settings),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Theme stylesheet failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
