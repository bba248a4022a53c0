//! Registration: the only route gated on verified claims alone.

use axum::{extract::State, Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::VerifiedClaims;
use crate::database::models::{BusinessType, CheckpointType, User};
use crate::error::ApiError;
use crate::ids;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Checkpoints seeded for every new account: name, type, band, sort order.
const DEFAULT_CHECKPOINTS: &[(&str, CheckpointType, f64, f64)] = &[
    ("Refrigerator A", CheckpointType::Refrigerator, 0.0, 10.0),
    ("Freezer", CheckpointType::Freezer, -25.0, -15.0),
    ("Cooking Area", CheckpointType::CookingArea, 15.0, 25.0),
];

const DEFAULT_LOCATION_NAME: &str = "Main Store";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub business_name: Option<String>,
    pub business_type: Option<String>,
}

/// POST /api/auth/register
///
/// Creates the User plus a default Location and three default Checkpoints
/// in one transaction. The subject is taken from the verified token claims,
/// never from the request body.
pub async fn register(
    State(state): State<AppState>,
    Extension(claims): Extension<VerifiedClaims>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<Value> {
    let email = body
        .email
        .as_deref()
        .filter(|e| e.contains('@'))
        .ok_or_else(|| ApiError::validation("A valid email address is required"))?;

    let business_type = parse_business_type(body.business_type.as_deref())?;

    let existing: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE firebase_uid = ?")
        .bind(&claims.subject)
        .fetch_optional(&state.pool)
        .await?;
    if existing.is_some() {
        return Err(ApiError::authentication_reason(
            "This account is already registered",
            "ALREADY_REGISTERED",
        ));
    }

    let now = Utc::now();
    let user_id = ids::user_id();
    let location_id = ids::location_id();
    let location_name = body
        .business_name
        .clone()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCATION_NAME.to_string());

    let mut tx = state.pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO users (id, firebase_uid, email, display_name, business_name, business_type, plan, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 'free', ?, ?)
        "#,
    )
    .bind(&user_id)
    .bind(&claims.subject)
    .bind(email)
    .bind(&body.display_name)
    .bind(&body.business_name)
    .bind(business_type)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO locations (id, user_id, name, address, is_active, created_at, updated_at)
        VALUES (?, ?, ?, NULL, 1, ?, ?)
        "#,
    )
    .bind(&location_id)
    .bind(&user_id)
    .bind(&location_name)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let mut checkpoints = Vec::with_capacity(DEFAULT_CHECKPOINTS.len());
    for (index, (name, checkpoint_type, min_temp, max_temp)) in
        DEFAULT_CHECKPOINTS.iter().enumerate()
    {
        let checkpoint_id = ids::checkpoint_id();
        sqlx::query(
            r#"
            INSERT INTO checkpoints (id, location_id, name, checkpoint_type, min_temp, max_temp, sort_order, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&checkpoint_id)
        .bind(&location_id)
        .bind(name)
        .bind(checkpoint_type)
        .bind(min_temp)
        .bind(max_temp)
        .bind(index as i64 + 1)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        checkpoints.push(json!({
            "id": checkpoint_id,
            "name": name,
            "type": checkpoint_type,
        }));
    }

    tx.commit().await?;
    tracing::info!("registered user {} for subject {}", user_id, claims.subject);

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&user_id)
        .fetch_one(&state.pool)
        .await?;

    Ok(ApiResponse::created(json!({
        "user": user,
        "location": { "id": location_id, "name": location_name },
        "checkpoints": checkpoints,
    })))
}

pub(crate) fn parse_business_type(
    value: Option<&str>,
) -> Result<Option<BusinessType>, ApiError> {
    match value {
        None => Ok(None),
        Some(s) => s
            .parse::<BusinessType>()
            .map(Some)
            .map_err(|_| {
                ApiError::validation(
                    "business_type must be one of restaurant, factory, cafeteria, other",
                )
            }),
    }
}
