//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Implementations live in the
//! database crate; services and handlers depend only on these traits.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::SealguardResult;
use crate::models::{
    audit::{AuditAction, AuditEntityType, AuditLogEntry, CreateAuditLogEntry},
    auth_token::{AuthToken, CreateAuthToken},
    pump::{CreatePump, ExpectedChildTag, Pump, PumpStatus, UpdatePump},
    station::{CreateStation, GasStation, StationStatus, UpdateStation},
    user::{CreateUser, UpdateUser, User},
    verification::{
        CreateVerificationSession, ScannedChildTag, VerificationResult, VerificationSession,
    },
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Query filters for station listings.
#[derive(Debug, Clone, Default)]
pub struct StationFilter {
    pub status: Option<StationStatus>,
    /// Case-insensitive substring match over name and location.
    pub search: Option<String>,
}

/// Query filters for verification session listings.
#[derive(Debug, Clone, Default)]
pub struct VerificationFilter {
    pub result: Option<VerificationResult>,
    pub station_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Query filters for audit log entries.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub user_id: Option<Uuid>,
    pub action: Option<AuditAction>,
    pub entity_type: Option<AuditEntityType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Stations & pumps
// ---------------------------------------------------------------------------

pub trait StationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateStation,
    ) -> impl Future<Output = SealguardResult<GasStation>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SealguardResult<GasStation>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateStation,
    ) -> impl Future<Output = SealguardResult<GasStation>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = SealguardResult<()>> + Send;
    fn list(
        &self,
        filter: &StationFilter,
        pagination: Pagination,
    ) -> impl Future<Output = SealguardResult<PaginatedResult<GasStation>>> + Send;
    fn count(&self) -> impl Future<Output = SealguardResult<u64>> + Send;
    fn count_by_status(
        &self,
        status: StationStatus,
    ) -> impl Future<Output = SealguardResult<u64>> + Send;
}

pub trait PumpRepository: Send + Sync {
    /// Create a pump together with its expected child tags, atomically.
    fn create(&self, input: CreatePump) -> impl Future<Output = SealguardResult<Pump>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SealguardResult<Pump>> + Send;
    fn get_by_main_tag(
        &self,
        main_rfid_tag: &str,
    ) -> impl Future<Output = SealguardResult<Pump>> + Send;
    fn get_by_station_and_number(
        &self,
        station_id: Uuid,
        pump_number: u32,
    ) -> impl Future<Output = SealguardResult<Pump>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdatePump,
    ) -> impl Future<Output = SealguardResult<Pump>> + Send;
    /// Single-field status update. Idempotent.
    fn set_status(
        &self,
        id: Uuid,
        status: PumpStatus,
    ) -> impl Future<Output = SealguardResult<()>> + Send;
    /// Removes the pump and its expected tags. Verification sessions
    /// are left in place (the evidentiary trail outlives the pump).
    fn delete(&self, id: Uuid) -> impl Future<Output = SealguardResult<()>> + Send;
    fn list_by_station(
        &self,
        station_id: Uuid,
    ) -> impl Future<Output = SealguardResult<Vec<Pump>>> + Send;
    /// Expected child tags with `is_active = true`, in creation order.
    fn active_expected_tags(
        &self,
        pump_id: Uuid,
    ) -> impl Future<Output = SealguardResult<Vec<ExpectedChildTag>>> + Send;
    fn count(&self) -> impl Future<Output = SealguardResult<u64>> + Send;
    fn count_by_station(
        &self,
        station_id: Uuid,
    ) -> impl Future<Output = SealguardResult<u64>> + Send;
    fn count_active_expected_tags(
        &self,
        pump_id: Uuid,
    ) -> impl Future<Output = SealguardResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Verification sessions (append-only)
// ---------------------------------------------------------------------------

pub trait VerificationRepository: Send + Sync {
    /// Persist one session plus its scanned tags in a single
    /// transaction. Partial failure rolls the whole write back.
    fn create(
        &self,
        input: CreateVerificationSession,
    ) -> impl Future<Output = SealguardResult<VerificationSession>> + Send;
    fn get_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = SealguardResult<VerificationSession>> + Send;
    /// Scanned tags of a session, ordered by scan order.
    fn scanned_tags(
        &self,
        session_id: Uuid,
    ) -> impl Future<Output = SealguardResult<Vec<ScannedChildTag>>> + Send;
    fn latest_for_pump(
        &self,
        pump_id: Uuid,
    ) -> impl Future<Output = SealguardResult<Option<VerificationSession>>> + Send;
    fn list_for_pump(
        &self,
        pump_id: Uuid,
        filter: &VerificationFilter,
        pagination: Pagination,
    ) -> impl Future<Output = SealguardResult<PaginatedResult<VerificationSession>>> + Send;
    fn list_all(
        &self,
        filter: &VerificationFilter,
        pagination: Pagination,
    ) -> impl Future<Output = SealguardResult<PaginatedResult<VerificationSession>>> + Send;
    /// Count sessions, optionally restricted to a start time and result.
    fn count_since(
        &self,
        since: Option<DateTime<Utc>>,
        result: Option<VerificationResult>,
    ) -> impl Future<Output = SealguardResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Users & tokens
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = SealguardResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = SealguardResult<User>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = SealguardResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = SealguardResult<User>> + Send;
    fn record_login(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> impl Future<Output = SealguardResult<()>> + Send;
}

pub trait AuthTokenRepository: Send + Sync {
    fn create(
        &self,
        input: CreateAuthToken,
    ) -> impl Future<Output = SealguardResult<AuthToken>> + Send;
    /// Mark a user's token as revoked, by token hash.
    fn revoke(
        &self,
        user_id: Uuid,
        token_hash: &str,
    ) -> impl Future<Output = SealguardResult<()>> + Send;
    /// Remove all expired tokens; returns the number removed.
    fn cleanup_expired(&self) -> impl Future<Output = SealguardResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only)
// ---------------------------------------------------------------------------

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit log entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditLogEntry,
    ) -> impl Future<Output = SealguardResult<AuditLogEntry>> + Send;
    fn list(
        &self,
        filter: &AuditLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = SealguardResult<PaginatedResult<AuditLogEntry>>> + Send;
    /// Most recent entries for one entity, newest first.
    fn list_for_entity(
        &self,
        entity_type: AuditEntityType,
        entity_id: &str,
        limit: u64,
    ) -> impl Future<Output = SealguardResult<Vec<AuditLogEntry>>> + Send;
}
