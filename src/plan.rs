//! Plan policy engine: the static per-tier limits table and the live-count
//! quota checks applied at write time.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::database::models::PlanTier;
use crate::error::ApiError;

/// Sentinel for "no limit" on a numeric quota.
pub const UNLIMITED: i64 = -1;

/// Per-tier limits returned verbatim to clients in `plan_limits`.
///
/// The checkpoint quota is enforced account-wide (the count joins every
/// active checkpoint the user owns), but the wire field keeps its historical
/// `max_checkpoints_per_location` name for client compatibility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlanLimits {
    pub max_locations: i64,
    #[serde(rename = "max_checkpoints_per_location")]
    pub max_checkpoints: i64,
    /// Present in the descriptor but not enforced by any record path.
    pub max_records_per_day: i64,
    pub data_retention_days: i64,
    pub export_enabled: bool,
    pub alert_enabled: bool,
}

pub fn limits_for(plan: PlanTier) -> PlanLimits {
    match plan {
        PlanTier::Free => PlanLimits {
            max_locations: 1,
            max_checkpoints: 3,
            max_records_per_day: 2,
            data_retention_days: 365,
            export_enabled: false,
            alert_enabled: false,
        },
        PlanTier::Premium => PlanLimits {
            max_locations: 10,
            max_checkpoints: 20,
            max_records_per_day: UNLIMITED,
            data_retention_days: UNLIMITED,
            export_enabled: true,
            alert_enabled: true,
        },
    }
}

/// Structured quota denial, surfaced as HTTP 403 with a reason code so
/// clients can tell a plan limit from a generic validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDenial {
    LocationLimit,
    CheckpointLimit,
}

impl QuotaDenial {
    pub fn reason(self) -> &'static str {
        match self {
            QuotaDenial::LocationLimit => "LOCATION_LIMIT",
            QuotaDenial::CheckpointLimit => "CHECKPOINT_LIMIT",
        }
    }
}

impl From<QuotaDenial> for ApiError {
    fn from(denial: QuotaDenial) -> Self {
        let message = match denial {
            QuotaDenial::LocationLimit => "Plan limit reached: no more locations can be created",
            QuotaDenial::CheckpointLimit => "Plan limit reached: no more checkpoints can be created",
        };
        ApiError::forbidden_reason(message, denial.reason())
    }
}

fn over(count: i64, limit: i64) -> bool {
    limit != UNLIMITED && count >= limit
}

/// Deny location creation once the account's active location count has
/// reached the tier limit. The count is live, not cached; concurrent writers
/// on one account can transiently exceed the quota, which is accepted for
/// this system's load profile.
pub async fn check_location_quota(
    pool: &SqlitePool,
    user_id: &str,
    plan: PlanTier,
) -> Result<(), ApiError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM locations WHERE user_id = ? AND is_active = 1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    if over(count, limits_for(plan).max_locations) {
        return Err(QuotaDenial::LocationLimit.into());
    }
    Ok(())
}

/// Deny checkpoint creation once the account's active checkpoint count
/// (across all locations) has reached the tier limit.
pub async fn check_checkpoint_quota(
    pool: &SqlitePool,
    user_id: &str,
    plan: PlanTier,
) -> Result<(), ApiError> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM checkpoints c
        INNER JOIN locations l ON c.location_id = l.id
        WHERE l.user_id = ? AND c.is_active = 1
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    if over(count, limits_for(plan).max_checkpoints) {
        return Err(QuotaDenial::CheckpointLimit.into());
    }
    Ok(())
}
