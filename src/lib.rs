use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod classify;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod middleware;
pub mod ownership;
pub mod plan;
pub mod state;

use state::AppState;

/// Build the full application router.
///
/// Three tiers: public (banner, health), claims-gated (registration), and
/// user-gated (everything else under /api).
pub fn app(app_state: AppState) -> Router {
    use handlers::{auth as auth_handlers, checkpoints, locations, records, users};

    let register_routes = Router::new()
        .route("/api/auth/register", post(auth_handlers::register))
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::require_claims,
        ));

    let protected_routes = Router::new()
        .route("/api/users/me", get(users::me_get).put(users::me_put))
        .route(
            "/api/locations",
            get(locations::location_list).post(locations::location_create),
        )
        .route(
            "/api/locations/:id",
            axum::routing::put(locations::location_update).delete(locations::location_delete),
        )
        .route(
            "/api/locations/:id/checkpoints",
            get(locations::location_checkpoints),
        )
        .route("/api/checkpoints", post(checkpoints::checkpoint_create))
        .route(
            "/api/checkpoints/:id",
            axum::routing::put(checkpoints::checkpoint_update)
                .delete(checkpoints::checkpoint_delete),
        )
        .route(
            "/api/records",
            get(records::record_list).post(records::record_create),
        )
        .route("/api/records/daily/:date", get(records::record_daily))
        .route("/api/records/bulk", post(records::record_bulk))
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::require_user,
        ));

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .merge(register_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Templog API",
            "version": version,
            "description": "Temperature-check logging backend for food-service locations",
            "endpoints": {
                "health": "/api/health (public)",
                "register": "/api/auth/register (token required)",
                "users": "/api/users/me (protected)",
                "locations": "/api/locations[/:id] (protected)",
                "checkpoints": "/api/checkpoints[/:id] (protected)",
                "records": "/api/records[/daily/:date|/bulk] (protected)",
            }
        }
    }))
}

async fn health(State(app_state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match sqlx::query("SELECT 1").execute(&app_state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
