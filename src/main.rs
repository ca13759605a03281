use slots_server::{build_app, config, db, routes, template::registry::TemplateRegistry, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("slots_server=debug,tower_http=debug")),
        )
        .init();

    let config = config::Config::from_env().expect("Invalid configuration");

    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    db::migrate(&pool).await.expect("Failed to run migrations");

    let assigned = db::slots::backfill_slot_ids(&pool)
        .await
        .expect("Failed to backfill slot ids");
    if assigned > 0 {
        tracing::info!("Assigned slot ids to {assigned} existing slots");
    }

    routes::auth::ensure_admin(&pool, &config)
        .await
        .expect("Failed to create administrator");

    let templates = match &config.template_dir {
        Some(dir) => TemplateRegistry::load_dir(dir).unwrap_or_else(|e| {
            tracing::warn!("Could not read templates from {}: {e}", dir.display());
            TemplateRegistry::default()
        }),
        None => TemplateRegistry::default(),
    };

    let listen_addr = config.listen_addr.clone();
    let app = build_app(AppState::new(pool, config, templates));

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on {}", listen_addr);
    tracing::info!("Swagger UI at http://{}/docs/", listen_addr);
    axum::serve(listener, app).await.expect("Server error");
}
