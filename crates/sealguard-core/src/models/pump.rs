//! Pump and expected-child-tag domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PumpStatus {
    Locked,
    Open,
    Broken,
}

impl PumpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PumpStatus::Locked => "LOCKED",
            PumpStatus::Open => "OPEN",
            PumpStatus::Broken => "BROKEN",
        }
    }
}

impl std::str::FromStr for PumpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOCKED" => Ok(PumpStatus::Locked),
            "OPEN" => Ok(PumpStatus::Open),
            "BROKEN" => Ok(PumpStatus::Broken),
            other => Err(format!("unknown pump status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pump {
    pub id: Uuid,
    /// Owning station. Immutable after creation.
    pub station_id: Uuid,
    /// Unique per station.
    pub pump_number: u32,
    /// Globally unique across all pumps.
    pub main_rfid_tag: String,
    pub status: PumpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An RFID tag on a removable seal component of a pump.
///
/// Removed tags are deactivated, never hard-deleted, so that
/// historical verification sessions keep their referents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedChildTag {
    pub id: Uuid,
    pub pump_id: Uuid,
    pub tag_id: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateExpectedChildTag {
    pub tag_id: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePump {
    pub station_id: Uuid,
    pub pump_number: u32,
    pub main_rfid_tag: String,
    pub expected_child_tags: Vec<CreateExpectedChildTag>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePump {
    pub pump_number: Option<u32>,
    pub main_rfid_tag: Option<String>,
    pub status: Option<PumpStatus>,
    /// Full replacement of the expected tag set: current active tags
    /// are deactivated and fresh rows created for this list.
    pub expected_child_tags: Option<Vec<CreateExpectedChildTag>>,
}
