//! Current-user profile routes.

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::models::{Location, User};
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::plan;
use crate::state::AppState;

use super::auth::parse_business_type;

/// GET /api/users/me - profile, active locations, and resolved plan limits.
pub async fn me_get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Value> {
    let user = fetch_user(&state, &current.id).await?;

    let locations = sqlx::query_as::<_, Location>(
        "SELECT * FROM locations WHERE user_id = ? AND is_active = 1 ORDER BY created_at ASC",
    )
    .bind(&current.id)
    .fetch_all(&state.pool)
    .await?;

    let plan_limits = plan::limits_for(user.plan);

    Ok(ApiResponse::success(json!({
        "user": user,
        "locations": locations,
        "plan_limits": plan_limits,
    })))
}

/// Typed partial update: a field left out of the request body stays
/// untouched. No dynamic column-list assembly.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub business_name: Option<String>,
    pub business_type: Option<String>,
}

/// PUT /api/users/me - partial profile update.
pub async fn me_put(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<UpdateUserRequest>,
) -> ApiResult<Value> {
    if body.display_name.is_none() && body.business_name.is_none() && body.business_type.is_none()
    {
        return Err(ApiError::validation_reason(
            "At least one field must be specified",
            "NO_FIELDS_SPECIFIED",
        ));
    }

    let business_type = parse_business_type(body.business_type.as_deref())?;

    let user = fetch_user(&state, &current.id).await?;
    let display_name = body.display_name.or(user.display_name);
    let business_name = body.business_name.or(user.business_name);
    let business_type = business_type.or(user.business_type);

    sqlx::query(
        r#"
        UPDATE users
        SET display_name = ?, business_name = ?, business_type = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&display_name)
    .bind(&business_name)
    .bind(business_type)
    .bind(Utc::now())
    .bind(&current.id)
    .execute(&state.pool)
    .await?;

    let user = fetch_user(&state, &current.id).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

async fn fetch_user(state: &AppState, user_id: &str) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}
