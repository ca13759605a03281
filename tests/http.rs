use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use slots_server::{
    build_app,
    config::Config,
    db,
    middleware::{auth::create_token, nonce::create_nonce},
    models::{
        slot::{NewSlot, SlotStatus},
        user::Role,
    },
    routes::auth::hash_password,
    template::registry::TemplateRegistry,
    AppState,
};

const SECRET: &str = "integration-secret";

async fn state_with(config: Config) -> AppState {
    let pool = db::connect_memory().await.unwrap();
    db::migrate(&pool).await.unwrap();
    AppState::new(pool, config, TemplateRegistry::default())
}

async fn state() -> AppState {
    state_with(Config {
        jwt_secret: SECRET.into(),
        ..Config::default()
    })
    .await
}

async fn seed(state: &AppState, title: &str, rating: f64, provider: &str) -> i64 {
    let mut new = NewSlot::titled(title);
    new.meta.star_rating = Some(Some(rating));
    new.meta.provider_name = Some(Some(provider.to_string()));
    db::slots::insert(&state.db, &new).await.unwrap().id
}

async fn token_for(state: &AppState, email: &str, role: Role) -> String {
    let hash = hash_password("password123").unwrap();
    let id = db::users::insert(&state.db, email, &hash, role).await.unwrap();
    create_token(id, role, SECRET).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn json_req(method: &str, uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ── REST ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rest_lists_published_slots_with_filters() {
    let state = state().await;
    seed(&state, "Starburst", 4.0, "NetEnt").await;
    seed(&state, "Book of Dead", 4.5, "Play'n GO").await;
    let draft = seed(&state, "Unreleased", 5.0, "NetEnt").await;
    db::slots::update(
        &state.db,
        draft,
        &slots_server::models::slot::SlotChanges {
            status: Some(SlotStatus::Draft),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let (status, body) = send(build_app(state.clone()), get("/slots/v1/slots")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["total"], 2);

    let (_, body) = send(
        build_app(state.clone()),
        get("/slots/v1/slots?provider=netent&orderby=rating&order=asc"),
    )
    .await;
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["data"][0]["title"], "Starburst");
    assert_eq!(json["data"][0]["slot_id"], "SLOT000001");
    assert_eq!(json["data"][0]["meta"]["star_rating"], 4.0);
}

#[tokio::test]
async fn rest_rejects_bad_params() {
    let state = state().await;
    let (status, body) = send(build_app(state), get("/slots/v1/slots?min_rating=9")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["code"], "rest_invalid_param");
}

#[tokio::test]
async fn rest_single_slot_and_not_found() {
    let state = state().await;
    let id = seed(&state, "Starburst", 4.0, "NetEnt").await;

    let (status, body) = send(build_app(state.clone()), get(&format!("/slots/v1/slots/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["data"]["id"], id);
    assert!(json["data"]["links"]["self"]
        .as_str()
        .unwrap()
        .ends_with(&format!("/slots/v1/slots/{id}")));

    let (status, body) = send(build_app(state), get("/slots/v1/slots/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["code"], "slot_not_found");
    assert_eq!(json["message"], "Slot not found");
    assert_eq!(json["data"]["status"], 404);
}

// ── AJAX ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ajax_requires_grid_nonce() {
    let state = state().await;
    let (status, body) = send(
        build_app(state.clone()),
        form("/ajax", "action=load_more_slots&nonce=bogus&page=2".into()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, "-1");

    let other = create_nonce("slots_meta_box", None, SECRET).unwrap();
    let (status, _) = send(
        build_app(state),
        form("/ajax", format!("action=load_more_slots&nonce={other}")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn ajax_unknown_action() {
    let state = state().await;
    let (status, body) = send(build_app(state), form("/ajax", "action=nope".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "0");
}

#[tokio::test]
async fn ajax_loads_next_page() {
    let state = state().await;
    for title in ["One", "Two", "Three"] {
        seed(&state, title, 3.0, "NetEnt").await;
    }
    let nonce = create_nonce("slots_nonce", None, SECRET).unwrap();

    let (status, body) = send(
        build_app(state.clone()),
        form("/ajax", format!("action=load_more_slots&nonce={nonce}&page=2&limit=2&sort=recent")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["has_more"], false);
    let html = json["data"]["html"].as_str().unwrap();
    assert_eq!(html.matches("class=\"slot-card\"").count(), 1);

    let (_, body) = send(
        build_app(state),
        form("/ajax", format!("action=load_slots_grid&nonce={nonce}&limit=2")),
    )
    .await;
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["data"]["has_more"], true);
    assert!(json["data"]["html"].as_str().unwrap().contains("slots-container"));
}

// ── Shortcodes and pages ─────────────────────────────────────────────────────

#[tokio::test]
async fn detail_shortcode_missing_slot() {
    let state = state().await;
    let (status, body) = send(build_app(state), get("/shortcodes/slot_detail?id=SLOT999999")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<div class=\"slots-error\">Slot not found.</div>");
}

#[tokio::test]
async fn render_expands_known_shortcodes_only() {
    let state = state().await;
    let id = seed(&state, "Starburst", 4.0, "NetEnt").await;
    sqlx::query("UPDATE slots SET rtp = 96.1 WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await
        .unwrap();

    let render = |content: &'static str| {
        Request::builder()
            .method("POST")
            .uri("/render")
            .body(Body::from(content))
            .unwrap()
    };
    let (status, body) = send(
        build_app(state.clone()),
        render("Intro [slot_detail id=\"SLOT000001\" show_rtp=false] [gallery ids=1]"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("Intro "));
    assert!(body.contains("Starburst"));
    assert!(body.contains("NetEnt"));
    assert!(!body.contains("slot-detail-rtp"));
    assert!(body.ends_with(" [gallery ids=1]"));

    let (_, body) = send(build_app(state), render("[slot_detail id=\"SLOT000001\"]")).await;
    assert!(body.contains("slot-detail-rtp"));
    assert!(body.contains("96.1%"));
}

#[tokio::test]
async fn slot_page_by_slug() {
    let state = state().await;
    seed(&state, "Book of Dead", 4.5, "Play'n GO").await;

    let (status, body) = send(build_app(state.clone()), get("/slot/book-of-dead")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<title>Book of Dead</title>"));

    let (status, body) = send(build_app(state), get("/slot/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Slot not found."));
}

#[tokio::test]
async fn theme_css_uses_settings() {
    let state = state().await;
    let settings = slots_server::models::settings::Settings {
        custom_theme_css: ".slot-card{color:{{primary_color}}}".into(),
        primary_color: "#112233".into(),
        ..Default::default()
    };
    db::settings::save(&state.db, &settings).await.unwrap();

    let resp = build_app(state).oneshot(get("/slots/theme.css")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/css"));
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b".slot-card{color:#112233}");
}

// ── Admin ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_returns_role_token() {
    let state = state().await;
    let hash = hash_password("password123").unwrap();
    db::users::insert(&state.db, "admin@example.com", &hash, Role::Administrator)
        .await
        .unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email":"Admin@example.com","password":"password123"}"#))
        .unwrap();
    let (status, body) = send(build_app(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["role"], "administrator");
    assert!(json["token"].as_str().is_some());

    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email":"admin@example.com","password":"wrong"}"#))
        .unwrap();
    let (status, _) = send(build_app(state), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_lists_detail_templates() {
    let state = state().await;
    let (status, _) = send(build_app(state.clone()), get("/api/admin/templates")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let editor = token_for(&state, "ed@example.com", Role::Editor).await;
    let req = Request::builder()
        .uri("/api/admin/templates")
        .header(header::AUTHORIZATION, format!("Bearer {editor}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(build_app(state), req).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            { "key": "default", "name": "Default" },
            { "key": "editor", "name": "Custom Editor" },
        ])
    );
}

#[tokio::test]
async fn admin_requires_token_and_capability() {
    let state = state().await;
    let (status, _) = send(build_app(state.clone()), get("/api/admin/slots")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let editor = token_for(&state, "ed@example.com", Role::Editor).await;
    let (status, _) = send(
        build_app(state.clone()),
        json_req("PUT", "/api/admin/settings", &editor, serde_json::json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = token_for(&state, "admin@example.com", Role::Administrator).await;
    let (status, body) = send(
        build_app(state.clone()),
        json_req("PUT", "/api/admin/settings", &admin, serde_json::json!({ "primary_color": "blue" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("primary_color"));

    let (status, body) = send(
        build_app(state),
        json_req("PUT", "/api/admin/settings", &admin, serde_json::json!({ "border_radius": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["border_radius"], 4);
}

#[tokio::test]
async fn admin_slot_lifecycle() {
    let state = state().await;
    let editor = token_for(&state, "ed@example.com", Role::Editor).await;

    let (status, body) = send(
        build_app(state.clone()),
        json_req(
            "POST",
            "/api/admin/slots",
            &editor,
            serde_json::json!({ "title": "Starburst", "star_rating": 4.5, "rtp": 96.09 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["slot_id"], "SLOT000001");
    assert_eq!(created["star_rating"], 4.5);
    let id = created["id"].as_i64().unwrap();

    let (status, body) = send(
        build_app(state.clone()),
        json_req("PUT", &format!("/api/admin/slots/{id}"), &editor, serde_json::json!({ "title": "Starburst XXXtreme" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(updated["title"], "Starburst XXXtreme");
    assert_eq!(updated["slot_id"], "SLOT000001");

    let (status, _) = send(
        build_app(state.clone()),
        json_req("POST", "/api/admin/slots", &editor, serde_json::json!({ "title": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let delete = |uri: String| {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {editor}"))
            .body(Body::empty())
            .unwrap()
    };
    let (status, _) = send(build_app(state.clone()), delete(format!("/api/admin/slots/{id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(build_app(state), delete(format!("/api/admin/slots/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn meta_save_checks_nonce_silently() {
    let state = state().await;
    let id = seed(&state, "Starburst", 4.0, "NetEnt").await;
    let editor = token_for(&state, "ed@example.com", Role::Editor).await;
    let save = |body: String| {
        Request::builder()
            .method("POST")
            .uri(format!("/api/admin/slots/{id}/meta"))
            .header(header::AUTHORIZATION, format!("Bearer {editor}"))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    };

    let (status, _) = send(
        build_app(state.clone()),
        save("slots_meta_box_nonce=forged&slots_star_rating=2".into()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let slot = db::slots::get(&state.db, id).await.unwrap().unwrap();
    assert_eq!(slot.star_rating, Some(4.0));

    // nonce from the meta box form itself
    let req = Request::builder()
        .uri(format!("/api/admin/slots/{id}/meta-box"))
        .header(header::AUTHORIZATION, format!("Bearer {editor}"))
        .body(Body::empty())
        .unwrap();
    let (status, html) = send(build_app(state.clone()), req).await;
    assert_eq!(status, StatusCode::OK);
    let marker = "name=\"slots_meta_box_nonce\" value=\"";
    let start = html.find(marker).unwrap() + marker.len();
    let nonce = &html[start..start + html[start..].find('"').unwrap()];

    let (status, _) = send(
        build_app(state.clone()),
        save(format!(
            "slots_meta_box_nonce={nonce}&slots_star_rating=3.5&slots_provider_name=Pragmatic&slots_rtp=150"
        )),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let slot = db::slots::get(&state.db, id).await.unwrap().unwrap();
    assert_eq!(slot.star_rating, Some(3.5));
    assert_eq!(slot.provider_name.as_deref(), Some("Pragmatic"));
    assert_eq!(slot.rtp, None);
}

#[tokio::test]
async fn meta_change_invalidates_grid_cache() {
    let state = state_with(Config {
        jwt_secret: SECRET.into(),
        cache_enabled: true,
        cache_expiration: Duration::from_secs(600),
        ..Config::default()
    })
    .await;
    let id = seed(&state, "Starburst", 4.0, "NetEnt").await;

    let (_, first) = send(build_app(state.clone()), get("/shortcodes/slots_grid")).await;
    assert!(first.contains("NetEnt"));
    assert!(!state.cache.is_empty());

    let editor = token_for(&state, "ed@example.com", Role::Editor).await;
    let nonce = create_nonce(
        "slots_meta_box",
        Some(slots_server::middleware::auth::validate_token(&editor, SECRET).unwrap().sub),
        SECRET,
    )
    .unwrap();
    let req = Request::builder()
        .method("POST")
        .uri(format!("/api/admin/slots/{id}/meta"))
        .header(header::AUTHORIZATION, format!("Bearer {editor}"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("slots_meta_box_nonce={nonce}&slots_provider_name=Quickspin")))
        .unwrap();
    let (status, _) = send(build_app(state.clone()), req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(state.cache.is_empty());

    let (_, second) = send(build_app(state), get("/shortcodes/slots_grid")).await;
    assert!(second.contains("Quickspin"));
}
