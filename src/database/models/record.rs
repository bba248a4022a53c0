use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::checkpoint::CheckpointType;

/// A single temperature reading. Append-only: there is no update or delete
/// path, and `is_abnormal` is derived at write time and persisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Record {
    pub id: String,
    pub checkpoint_id: String,
    pub temperature: f64,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: Option<String>,
    pub is_abnormal: bool,
    pub abnormal_action: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Record row joined with its checkpoint's display metadata, used by the
/// daily listing.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyRecord {
    pub id: String,
    pub checkpoint_id: String,
    pub temperature: f64,
    pub recorded_at: DateTime<Utc>,
    pub recorded_by: Option<String>,
    pub is_abnormal: bool,
    pub abnormal_action: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub checkpoint_name: String,
    pub checkpoint_type: CheckpointType,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
}
