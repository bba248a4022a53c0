use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of monitored point. Wire spellings are contractual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum CheckpointType {
    Refrigerator,
    Freezer,
    CookingArea,
    Other,
}

impl std::str::FromStr for CheckpointType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "refrigerator" => Ok(CheckpointType::Refrigerator),
            "freezer" => Ok(CheckpointType::Freezer),
            "cooking_area" => Ok(CheckpointType::CookingArea),
            "other" => Ok(CheckpointType::Other),
            _ => Err(()),
        }
    }
}

/// A named monitored point with an optional acceptable temperature band.
/// Band bounds are inclusive; an unset bound never triggers abnormality.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Checkpoint {
    pub id: String,
    pub location_id: String,
    pub name: String,
    pub checkpoint_type: CheckpointType,
    pub min_temp: Option<f64>,
    pub max_temp: Option<f64>,
    pub sort_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
