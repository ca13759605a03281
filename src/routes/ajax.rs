//! Nonce-protected AJAX endpoint used by the grid's "load more" button and
//! its sort/limit controls.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::db::{self, StoreError};
use crate::listing::{self, has_more, Sort, GRID_NONCE_ACTION};
use crate::middleware::nonce::verify_nonce;
use crate::shortcode::{parse_limit, GridAtts};
use crate::template::RenderContext;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/ajax", post(ajax))
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct AjaxForm {
    #[serde(default)]
    pub action: String,
    pub nonce: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    LoadMore,
    LoadGrid,
}

impl Action {
    fn parse(action: &str) -> Option<Self> {
        match action {
            "load_more_slots" => Some(Action::LoadMore),
            "load_slots_grid" => Some(Action::LoadGrid),
            _ => None,
        }
    }
}

fn page_param(raw: Option<&str>) -> u32 {
    raw.and_then(|p| p.trim().parse::<u32>().ok())
        .unwrap_or(1)
        .max(1)
}

#[utoipa::path(
    post,
    path = "/ajax",
    responses(
        (status = 200, description = "{success, data: {html, has_more}}"),
        (status = 400, description = "Unknown action, body `0`"),
        (status = 403, description = "Bad nonce, body `-1`"),
    ),
    tag = "Shortcodes"
)]
pub(crate) async fn ajax(State(state): State<AppState>, Form(form): Form<AjaxForm>) -> Response {
    let Some(action) = Action::parse(form.action.trim()) else {
        return (StatusCode::BAD_REQUEST, "0").into_response();
    };
    let nonce_ok = form
        .nonce
        .as_deref()
        .is_some_and(|n| verify_nonce(n, GRID_NONCE_ACTION, None, &state.config.jwt_secret));
    if !nonce_ok {
        return (StatusCode::FORBIDDEN, "-1").into_response();
    }

    let page = page_param(form.page.as_deref());
    let limit = parse_limit(form.limit.as_deref(), state.config.default_limit);
    let sort = form
        .sort
        .as_deref()
        .map(Sort::parse)
        .unwrap_or(state.config.default_sort);

    let loaded = async {
        let settings = db::settings::load(&state.db).await?;
        let slots = listing::grid_slots(&state.db, &state.cache, sort, limit, page).await?;
        Ok::<_, StoreError>((settings, slots))
    }
    .await;
    let (settings, slots) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("AJAX {:?} failed: {e}", action);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false })),
            )
                .into_response();
        }
    };

    let ctx = RenderContext::from_config(&state.config);
    let html = match action {
        Action::LoadMore => listing::render_cards(&slots, &settings, &ctx),
        Action::LoadGrid => {
            let atts = GridAtts {
                limit,
                sort,
                class: String::new(),
                show_filters: false,
                show_pagination: state.config.enable_pagination,
            };
            listing::render_grid(&atts, &slots, &settings, &ctx, &listing::grid_nonce(&state))
        }
    };

    Json(json!({
        "success": true,
        "data": {
            "html": html,
            "has_more": has_more(slots.len(), limit),
        },
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions() {
        assert_eq!(Action::parse("load_more_slots"), Some(Action::LoadMore));
        assert_eq!(Action::parse("load_slots_grid"), Some(Action::LoadGrid));
        assert_eq!(Action::parse("delete_everything"), None);
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(page_param(None), 1);
        assert_eq!(page_param(Some("0")), 1);
        assert_eq!(page_param(Some("x")), 1);
        assert_eq!(page_param(Some(" 3 ")), 3);
    }
}
