use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Business category of the account. The wire spellings are part of the
/// external contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BusinessType {
    Restaurant,
    Factory,
    Cafeteria,
    Other,
}

impl std::str::FromStr for BusinessType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "restaurant" => Ok(BusinessType::Restaurant),
            "factory" => Ok(BusinessType::Factory),
            "cafeteria" => Ok(BusinessType::Cafeteria),
            "other" => Ok(BusinessType::Other),
            _ => Err(()),
        }
    }
}

/// Subscription tier governing plan quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Premium,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub firebase_uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub business_name: Option<String>,
    pub business_type: Option<BusinessType>,
    pub plan: PlanTier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
