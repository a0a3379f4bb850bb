//! Verification session and scanned-tag domain models.
//!
//! A session and its scanned tags are written once, atomically, per
//! verification attempt and never mutated — they form the permanent
//! evidentiary trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationResult {
    Success,
    Failed,
    Error,
}

impl VerificationResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationResult::Success => "SUCCESS",
            VerificationResult::Failed => "FAILED",
            VerificationResult::Error => "ERROR",
        }
    }

    /// Lowercase form used in API responses.
    pub fn as_lowercase_str(&self) -> &'static str {
        match self {
            VerificationResult::Success => "success",
            VerificationResult::Failed => "failed",
            VerificationResult::Error => "error",
        }
    }
}

impl std::str::FromStr for VerificationResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(VerificationResult::Success),
            "FAILED" => Ok(VerificationResult::Failed),
            "ERROR" => Ok(VerificationResult::Error),
            other => Err(format!("unknown verification result: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSession {
    pub id: Uuid,
    pub pump_id: Uuid,
    /// Acting user; nullable for system scans.
    pub user_id: Option<Uuid>,
    pub main_tag_scanned: String,
    pub result: VerificationResult,
    pub missing_tags_count: u32,
    pub unexpected_tags_count: u32,
    pub total_scanned: u32,
    pub result_message: String,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time snapshot of one physically scanned tag.
///
/// `is_expected` is computed at write time against the then-active
/// expected set; it does not track later changes to the expected tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedChildTag {
    pub id: Uuid,
    pub session_id: Uuid,
    pub tag_id: String,
    /// 1-based, preserving the physical scan sequence.
    pub scan_order: u32,
    pub is_expected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScannedChildTag {
    pub tag_id: String,
    pub scan_order: u32,
    pub is_expected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVerificationSession {
    pub pump_id: Uuid,
    pub user_id: Option<Uuid>,
    pub main_tag_scanned: String,
    pub result: VerificationResult,
    pub missing_tags_count: u32,
    pub unexpected_tags_count: u32,
    pub total_scanned: u32,
    pub result_message: String,
    pub scanned_tags: Vec<CreateScannedChildTag>,
}
