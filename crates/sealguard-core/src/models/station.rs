//! Gas station domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StationStatus {
    Active,
    Inactive,
    Maintenance,
}

impl StationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationStatus::Active => "ACTIVE",
            StationStatus::Inactive => "INACTIVE",
            StationStatus::Maintenance => "MAINTENANCE",
        }
    }
}

impl std::str::FromStr for StationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(StationStatus::Active),
            "INACTIVE" => Ok(StationStatus::Inactive),
            "MAINTENANCE" => Ok(StationStatus::Maintenance),
            other => Err(format!("unknown station status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasStation {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub status: StationStatus,
    /// User who last modified this station through an admin operation.
    pub last_modified_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStation {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateStation {
    pub name: Option<String>,
    pub location: Option<String>,
    pub status: Option<StationStatus>,
    /// Acting user, recorded as the station's last modifier.
    pub last_modified_by: Option<Uuid>,
}
