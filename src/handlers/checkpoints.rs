//! Checkpoint routes. Ownership is always proven through the parent
//! location before any write.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::{Checkpoint, CheckpointType};
use crate::error::ApiError;
use crate::ids;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::ownership;
use crate::plan;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCheckpointRequest {
    pub location_id: Option<String>,
    pub name: Option<String>,
    pub checkpoint_type: Option<String>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub sort_order: Option<i64>,
}

/// POST /api/checkpoints - create under an owned location, subject to the
/// plan's account-wide checkpoint quota.
pub async fn checkpoint_create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<CreateCheckpointRequest>,
) -> ApiResult<Value> {
    let location_id = body
        .location_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("location_id is required"))?;
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::validation("name is required"))?;
    let checkpoint_type = body
        .checkpoint_type
        .as_deref()
        .ok_or_else(|| ApiError::validation("checkpoint_type is required"))?
        .parse::<CheckpointType>()
        .map_err(|_| {
            ApiError::validation(
                "checkpoint_type must be one of refrigerator, freezer, cooking_area, other",
            )
        })?;

    ownership::location_owned(&state.pool, location_id, &current.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Location not found"))?;

    plan::check_checkpoint_quota(&state.pool, &current.id, current.plan).await?;

    let id = ids::checkpoint_id();
    let now = Utc::now();
    sqlx::query(
        r#"
        INSERT INTO checkpoints (id, location_id, name, checkpoint_type, min_temp, max_temp, sort_order, is_active, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(location_id)
    .bind(name)
    .bind(checkpoint_type)
    .bind(body.min_temp)
    .bind(body.max_temp)
    .bind(body.sort_order.unwrap_or(0))
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let checkpoint = fetch_checkpoint(&state, &id).await?;
    Ok(ApiResponse::created(json!({ "checkpoint": checkpoint })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCheckpointRequest {
    pub name: Option<String>,
    pub checkpoint_type: Option<String>,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub sort_order: Option<i64>,
}

/// PUT /api/checkpoints/:id - partial update of an owned checkpoint.
pub async fn checkpoint_update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCheckpointRequest>,
) -> ApiResult<Value> {
    let checkpoint = ownership::checkpoint_owned(&state.pool, &id, &current.id)
        .await?
        .ok_or_else(checkpoint_not_found)?;

    let checkpoint_type = match body.checkpoint_type.as_deref() {
        None => checkpoint.checkpoint_type,
        Some(s) => s.parse::<CheckpointType>().map_err(|_| {
            ApiError::validation(
                "checkpoint_type must be one of refrigerator, freezer, cooking_area, other",
            )
        })?,
    };
    let name = body.name.filter(|n| !n.trim().is_empty()).unwrap_or(checkpoint.name);
    let min_temp = body.min_temp.or(checkpoint.min_temp);
    let max_temp = body.max_temp.or(checkpoint.max_temp);
    let sort_order = body.sort_order.unwrap_or(checkpoint.sort_order);

    sqlx::query(
        r#"
        UPDATE checkpoints
        SET name = ?, checkpoint_type = ?, min_temp = ?, max_temp = ?, sort_order = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&name)
    .bind(checkpoint_type)
    .bind(min_temp)
    .bind(max_temp)
    .bind(sort_order)
    .bind(Utc::now())
    .bind(&id)
    .execute(&state.pool)
    .await?;

    let checkpoint = fetch_checkpoint(&state, &id).await?;
    Ok(ApiResponse::success(json!({ "checkpoint": checkpoint })))
}

/// DELETE /api/checkpoints/:id - soft delete. Frees up checkpoint quota;
/// historical records stay readable.
pub async fn checkpoint_delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    ownership::checkpoint_owned(&state.pool, &id, &current.id)
        .await?
        .ok_or_else(checkpoint_not_found)?;

    sqlx::query("UPDATE checkpoints SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(&id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::success(json!({ "message": "Checkpoint deleted successfully" })))
}

async fn fetch_checkpoint(state: &AppState, id: &str) -> Result<Checkpoint, ApiError> {
    sqlx::query_as::<_, Checkpoint>("SELECT * FROM checkpoints WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(checkpoint_not_found)
}

fn checkpoint_not_found() -> ApiError {
    ApiError::not_found("Checkpoint not found")
}
