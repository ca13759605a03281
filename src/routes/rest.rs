//! Read-only public JSON API under `/slots/v1`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::db;
use crate::models::slot::{Direction, OrderBy, SlotFilter, SlotResource};
use crate::template::escape::sanitize_text_field;
use crate::AppState;

type RestResult<T> = Result<Json<T>, (StatusCode, Json<serde_json::Value>)>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/slots/v1/slots", get(list_slots))
        .route("/slots/v1/slots/{id}", get(get_slot))
}

/// Raw query parameters; validated by [`RestQuery::to_filter`].
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RestQuery {
    /// Exact slot id, e.g. `SLOT000001`
    pub slot_id: Option<String>,
    /// Substring of the provider name
    pub provider: Option<String>,
    /// 0–5
    pub min_rating: Option<String>,
    /// 0–5
    pub max_rating: Option<String>,
    /// date, title, rating, provider or rtp
    pub orderby: Option<String>,
    /// ASC or DESC
    pub order: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotListResponse {
    pub success: bool,
    pub data: Vec<SlotResource>,
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SlotItemResponse {
    pub success: bool,
    pub data: SlotResource,
}

fn rest_err(status: StatusCode, code: &str, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        status,
        Json(json!({
            "code": code,
            "message": message,
            "data": { "status": status.as_u16() },
        })),
    )
}

fn invalid_param(name: &str) -> (StatusCode, Json<serde_json::Value>) {
    rest_err(
        StatusCode::BAD_REQUEST,
        "rest_invalid_param",
        &format!("Invalid parameter(s): {name}"),
    )
}

fn server_err(e: db::StoreError) -> (StatusCode, Json<serde_json::Value>) {
    tracing::error!("REST query failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Database error" })),
    )
}

fn text_param(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(sanitize_text_field)
        .filter(|s| !s.is_empty())
}

fn rating_param(
    raw: &Option<String>,
    name: &str,
    default: f64,
) -> Result<f64, (StatusCode, Json<serde_json::Value>)> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) => v
            .parse::<f64>()
            .ok()
            .filter(|r| (0.0..=5.0).contains(r))
            .ok_or_else(|| invalid_param(name)),
    }
}

impl RestQuery {
    pub fn to_filter(&self) -> Result<SlotFilter, (StatusCode, Json<serde_json::Value>)> {
        let order_by = match self.orderby.as_deref().map(str::trim) {
            None | Some("") => OrderBy::default(),
            Some("date") => OrderBy::Date,
            Some("title") => OrderBy::Title,
            Some("rating") => OrderBy::Rating,
            Some("provider") => OrderBy::Provider,
            Some("rtp") => OrderBy::Rtp,
            Some(_) => return Err(invalid_param("orderby")),
        };
        let direction = match self.order.as_deref().map(str::trim) {
            None | Some("") => Direction::default(),
            Some(o) if o.eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(o) if o.eq_ignore_ascii_case("desc") => Direction::Desc,
            Some(_) => return Err(invalid_param("order")),
        };

        Ok(SlotFilter {
            slot_id: text_param(&self.slot_id),
            provider: text_param(&self.provider),
            min_rating: rating_param(&self.min_rating, "min_rating", 0.0)?,
            max_rating: rating_param(&self.max_rating, "max_rating", 5.0)?,
            order_by,
            direction,
        })
    }
}

#[utoipa::path(
    get,
    path = "/slots/v1/slots",
    operation_id = "rest_list_slots",
    params(RestQuery),
    responses(
        (status = 200, description = "Published slots matching the filters", body = SlotListResponse),
        (status = 400, description = "rest_invalid_param"),
    ),
    tag = "Slots"
)]
pub(crate) async fn list_slots(
    State(state): State<AppState>,
    Query(query): Query<RestQuery>,
) -> RestResult<SlotListResponse> {
    let filter = query.to_filter()?;
    let slots = db::slots::query(&state.db, &filter)
        .await
        .map_err(server_err)?;

    let data: Vec<SlotResource> = slots
        .into_iter()
        .map(|s| SlotResource::from_slot(s, &state.config.site_url))
        .collect();
    Ok(Json(SlotListResponse {
        success: true,
        total: data.len(),
        data,
    }))
}

#[utoipa::path(
    get,
    path = "/slots/v1/slots/{id}",
    operation_id = "rest_get_slot",
    params(("id" = i64, Path, description = "Slot id")),
    responses(
        (status = 200, description = "One published slot", body = SlotItemResponse),
        (status = 404, description = "slot_not_found"),
    ),
    tag = "Slots"
)]
pub(crate) async fn get_slot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> RestResult<SlotItemResponse> {
    let id: i64 = id.trim().parse().map_err(|_| invalid_param("id"))?;
    let slot = db::slots::get(&state.db, id)
        .await
        .map_err(server_err)?
        .filter(|s| s.is_published())
        .ok_or_else(|| rest_err(StatusCode::NOT_FOUND, "slot_not_found", "Slot not found"))?;

    Ok(Json(SlotItemResponse {
        success: true,
        data: SlotResource::from_slot(slot, &state.config.site_url),
    }))
}
