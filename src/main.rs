use templog_api::{app, auth::TokenVerifier, config, database, state::AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, FIREBASE_PROJECT_ID, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("starting Templog API in {:?} mode", config.environment);

    let pool = database::connect(&config.database.url, config.database.max_connections)
        .await
        .unwrap_or_else(|e| panic!("failed to open database {}: {}", config.database.url, e));
    database::migrate(&pool)
        .await
        .unwrap_or_else(|e| panic!("failed to apply schema: {}", e));

    let verifier = TokenVerifier::from_config(&config.auth);
    let app = app(AppState::new(pool, verifier));

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Templog API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
