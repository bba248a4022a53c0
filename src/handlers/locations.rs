//! Location routes, including the per-location checkpoint listing.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::{Checkpoint, Location};
use crate::error::ApiError;
use crate::ids;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::ownership;
use crate::plan;
use crate::state::AppState;

/// GET /api/locations - active locations, newest first.
pub async fn location_list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Value> {
    let locations = sqlx::query_as::<_, Location>(
        "SELECT * FROM locations WHERE user_id = ? AND is_active = 1 ORDER BY created_at DESC",
    )
    .bind(&current.id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(json!({ "locations": locations })))
}

#[derive(Debug, Deserialize)]
pub struct CreateLocationRequest {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// POST /api/locations - create, subject to the plan's location quota.
pub async fn location_create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateLocationRequest>,
) -> ApiResult<Value> {
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::validation("name is required"))?;

    plan::check_location_quota(&state.pool, &current.id, current.plan).await?;

    let id = ids::location_id();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO locations (id, user_id, name, address, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&current.id)
    .bind(name)
    .bind(&body.address)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let location = fetch_location(&state, &id).await?;
    Ok(ApiResponse::created(json!({ "location": location })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// PUT /api/locations/:id - partial update of an owned location.
pub async fn location_update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateLocationRequest>,
) -> ApiResult<Value> {
    let location = ownership::location_owned(&state.pool, &id, &current.id)
        .await?
        .ok_or_else(location_not_found)?;

    let name = body.name.filter(|n| !n.trim().is_empty()).unwrap_or(location.name);
    let address = body.address.or(location.address);

    sqlx::query("UPDATE locations SET name = ?, address = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(&address)
        .bind(Utc::now())
        .bind(&id)
        .execute(&state.pool)
        .await?;

    let location = fetch_location(&state, &id).await?;
    Ok(ApiResponse::success(json!({ "location": location })))
}

/// DELETE /api/locations/:id - soft delete (flips the active flag).
pub async fn location_delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    ownership::location_owned(&state.pool, &id, &current.id)
        .await?
        .ok_or_else(location_not_found)?;

    sqlx::query("UPDATE locations SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(&id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::success(json!({ "message": "Location deleted successfully" })))
}

/// GET /api/locations/:id/checkpoints - active checkpoints of an owned
/// location, in display order.
pub async fn location_checkpoints(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    ownership::location_owned(&state.pool, &id, &current.id)
        .await?
        .ok_or_else(location_not_found)?;

    let checkpoints = sqlx::query_as::<_, Checkpoint>(
        r#"
        SELECT * FROM checkpoints
        WHERE location_id = ? AND is_active = 1
        ORDER BY sort_order, created_at
        "#,
    )
    .bind(&id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(json!({ "checkpoints": checkpoints })))
}

async fn fetch_location(state: &AppState, id: &str) -> Result<Location, ApiError> {
    sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(location_not_found)
}

fn location_not_found() -> ApiError {
    // Foreign-tenant and nonexistent ids produce the same response.
    ApiError::not_found("Location not found")
}
