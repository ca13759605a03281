use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Form, Json, Router,
};

use super::{db_err, err, ApiError};
use crate::db;
use crate::events::SlotEvent;
use crate::listing::GRID_NONCE_ACTION;
use crate::meta_box::{render_meta_box, META_BOX_ACTION};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::nonce::{create_nonce, verify_nonce};
use crate::models::settings::Settings;
use crate::models::slot::{
    CreateSlotRequest, MetaBoxForm, NewSlot, SlotChanges, SlotSummary, UpdateSlotRequest,
};
use crate::models::user::{Capability, NonceResponse};
use crate::template::card::DEFAULT_CARD_MARKUP;
use crate::template::detail::DEFAULT_DETAIL_MARKUP;
use crate::template::registry::TemplateInfo;
use crate::AppState;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/slots", get(list_slots).post(create_slot))
        .route("/slots/backfill-ids", post(backfill_ids))
        .route(
            "/slots/{id}",
            get(get_slot).put(update_slot).delete(delete_slot),
        )
        .route("/slots/{id}/meta-box", get(meta_box))
        .route("/slots/{id}/meta", post(save_meta))
        .route("/templates", get(list_templates))
        .route("/settings", get(get_settings).put(put_settings))
        .route("/nonce/{action}", get(mint_nonce))
}

fn require(auth: &AuthUser, capability: Capability) -> ApiResult<()> {
    if auth.can(capability) {
        Ok(())
    } else {
        Err(err(StatusCode::FORBIDDEN, "Insufficient permissions"))
    }
}

fn not_found() -> (StatusCode, Json<ApiError>) {
    err(StatusCode::NOT_FOUND, "Slot not found")
}

#[utoipa::path(
    get,
    path = "/api/admin/slots",
    responses(
        (status = 200, description = "All slots, newest first", body = Vec<SlotSummary>),
        (status = 403, description = "Missing edit_slots capability", body = ApiError),
    ),
    security(("bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn list_slots(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<SlotSummary>>> {
    require(&auth, Capability::EditSlots)?;
    let slots = db::slots::list(&state.db).await.map_err(db_err)?;
    Ok(Json(slots.into_iter().map(SlotSummary::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/admin/slots",
    request_body = CreateSlotRequest,
    responses(
        (status = 201, description = "Slot created", body = SlotSummary),
        (status = 400, description = "Missing title", body = ApiError),
    ),
    security(("bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn create_slot(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateSlotRequest>,
) -> ApiResult<(StatusCode, Json<SlotSummary>)> {
    require(&auth, Capability::EditSlots)?;
    let new = NewSlot::from(req);
    if new.title.is_empty() {
        return Err(err(StatusCode::BAD_REQUEST, "Title is required"));
    }

    let slot = db::slots::insert(&state.db, &new).await.map_err(db_err)?;
    state.events.dispatch(SlotEvent::Created { id: slot.id });
    Ok((StatusCode::CREATED, Json(slot.into())))
}

#[utoipa::path(
    get,
    path = "/api/admin/slots/{id}",
    params(("id" = i64, Path, description = "Slot id")),
    responses(
        (status = 200, description = "Slot", body = SlotSummary),
        (status = 404, description = "Slot not found", body = ApiError),
    ),
    security(("bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn get_slot(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<SlotSummary>> {
    require(&auth, Capability::EditSlots)?;
    let slot = db::slots::get(&state.db, id)
        .await
        .map_err(db_err)?
        .ok_or_else(not_found)?;
    Ok(Json(slot.into()))
}

#[utoipa::path(
    put,
    path = "/api/admin/slots/{id}",
    params(("id" = i64, Path, description = "Slot id")),
    request_body = UpdateSlotRequest,
    responses(
        (status = 200, description = "Slot updated", body = SlotSummary),
        (status = 404, description = "Slot not found", body = ApiError),
    ),
    security(("bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn update_slot(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateSlotRequest>,
) -> ApiResult<Json<SlotSummary>> {
    require(&auth, Capability::EditSlots)?;
    let changes = SlotChanges::from(req);
    let slot = db::slots::update(&state.db, id, &changes)
        .await
        .map_err(db_err)?
        .ok_or_else(not_found)?;
    state.events.dispatch(SlotEvent::Updated { id });
    Ok(Json(slot.into()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/slots/{id}",
    params(("id" = i64, Path, description = "Slot id")),
    responses(
        (status = 204, description = "Slot deleted"),
        (status = 404, description = "Slot not found", body = ApiError),
    ),
    security(("bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn delete_slot(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require(&auth, Capability::EditSlots)?;
    if !db::slots::delete(&state.db, id).await.map_err(db_err)? {
        return Err(not_found());
    }
    state.events.dispatch(SlotEvent::Deleted { id });
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/admin/slots/backfill-ids",
    responses(
        (status = 200, description = "Number of slots that received an id"),
    ),
    security(("bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn backfill_ids(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    require(&auth, Capability::EditSlots)?;
    let assigned = db::slots::backfill_slot_ids(&state.db)
        .await
        .map_err(db_err)?;
    if assigned > 0 {
        state.cache.clear_all();
    }
    Ok(Json(serde_json::json!({ "assigned": assigned })))
}

#[utoipa::path(
    get,
    path = "/api/admin/slots/{id}/meta-box",
    params(("id" = i64, Path, description = "Slot id")),
    responses(
        (status = 200, description = "Slot details form", body = String, content_type = "text/html"),
        (status = 404, description = "Slot not found", body = ApiError),
    ),
    security(("bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn meta_box(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Html<String>> {
    require(&auth, Capability::EditSlots)?;
    let slot = db::slots::get(&state.db, id)
        .await
        .map_err(db_err)?
        .ok_or_else(not_found)?;
    let nonce = create_nonce(META_BOX_ACTION, Some(auth.user_id), &state.config.jwt_secret)
        .map_err(|_| err(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create nonce"))?;
    let action = format!("/api/admin/slots/{id}/meta");
    Ok(Html(render_meta_box(&slot, &nonce, &action)))
}

/// Persist the metadata form. A missing or invalid nonce, or a caller
/// without `edit_slots`, writes nothing and still answers 204.
#[utoipa::path(
    post,
    path = "/api/admin/slots/{id}/meta",
    params(("id" = i64, Path, description = "Slot id")),
    responses(
        (status = 204, description = "Saved, or silently ignored"),
        (status = 404, description = "Slot not found", body = ApiError),
    ),
    tag = "Admin"
)]
pub(crate) async fn save_meta(
    State(state): State<AppState>,
    MaybeAuthUser(auth): MaybeAuthUser,
    Path(id): Path<i64>,
    Form(form): Form<MetaBoxForm>,
) -> ApiResult<StatusCode> {
    let Some(auth) = auth.filter(|a| a.can(Capability::EditSlots)) else {
        tracing::debug!("Ignoring meta save for slot {id}: not permitted");
        return Ok(StatusCode::NO_CONTENT);
    };
    let nonce_ok = form.slots_meta_box_nonce.as_deref().is_some_and(|n| {
        verify_nonce(n, META_BOX_ACTION, Some(auth.user_id), &state.config.jwt_secret)
    });
    if !nonce_ok {
        tracing::debug!("Ignoring meta save for slot {id}: bad nonce");
        return Ok(StatusCode::NO_CONTENT);
    }

    let update = form.to_update();
    if !db::slots::update_meta(&state.db, id, &update)
        .await
        .map_err(db_err)?
    {
        return Err(not_found());
    }
    state.events.dispatch(SlotEvent::MetaChanged { id });
    Ok(StatusCode::NO_CONTENT)
}

/// Detail layouts an editor can pick with the `template` attribute.
#[utoipa::path(
    get,
    path = "/api/admin/templates",
    responses(
        (status = 200, description = "Registered detail layouts, ordered by key", body = Vec<TemplateInfo>),
        (status = 403, description = "Missing edit_slots capability", body = ApiError),
    ),
    security(("bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn list_templates(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<TemplateInfo>>> {
    require(&auth, Capability::EditSlots)?;
    Ok(Json(state.templates.list()))
}

#[utoipa::path(
    get,
    path = "/api/admin/settings",
    responses(
        (status = 200, description = "Current settings; empty template fields hold the built-in markup", body = Settings),
        (status = 403, description = "Missing manage_options capability", body = ApiError),
    ),
    security(("bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn get_settings(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Settings>> {
    require(&auth, Capability::ManageOptions)?;
    let mut settings = db::settings::load(&state.db).await.map_err(db_err)?;
    // editor starts from the built-in markup
    if settings.slot_card_template.trim().is_empty() {
        settings.slot_card_template = DEFAULT_CARD_MARKUP.to_string();
    }
    if settings.slot_editor_markup.trim().is_empty() {
        settings.slot_editor_markup = DEFAULT_DETAIL_MARKUP.to_string();
    }
    Ok(Json(settings))
}

#[utoipa::path(
    put,
    path = "/api/admin/settings",
    request_body = Settings,
    responses(
        (status = 200, description = "Settings saved", body = Settings),
        (status = 400, description = "Invalid setting", body = ApiError),
        (status = 403, description = "Missing manage_options capability", body = ApiError),
    ),
    security(("bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn put_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(settings): Json<Settings>,
) -> ApiResult<Json<Settings>> {
    require(&auth, Capability::ManageOptions)?;
    settings
        .validate()
        .map_err(|e| err(StatusCode::BAD_REQUEST, &e.to_string()))?;
    db::settings::save(&state.db, &settings)
        .await
        .map_err(db_err)?;
    tracing::info!("Settings updated by {}", auth.user_id);
    Ok(Json(settings))
}

/// Mint a nonce for `action`. The public grid nonce is not tied to a user
/// because it is verified on anonymous AJAX calls.
#[utoipa::path(
    get,
    path = "/api/admin/nonce/{action}",
    params(("action" = String, Path, description = "Action name")),
    responses(
        (status = 200, description = "Nonce", body = NonceResponse),
    ),
    security(("bearer" = [])),
    tag = "Admin"
)]
pub(crate) async fn mint_nonce(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(action): Path<String>,
) -> ApiResult<Json<NonceResponse>> {
    let user = (action != GRID_NONCE_ACTION).then_some(auth.user_id);
    let nonce = create_nonce(&action, user, &state.config.jwt_secret)
        .map_err(|_| err(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create nonce"))?;
    Ok(Json(NonceResponse { action, nonce }))
}
