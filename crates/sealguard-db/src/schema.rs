//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation. The verification session,
//! scanned tag, and audit log tables deny UPDATE and DELETE — they
//! are append-only by construction.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Gas stations
-- =======================================================================
DEFINE TABLE station SCHEMAFULL;
DEFINE FIELD name ON TABLE station TYPE string;
DEFINE FIELD location ON TABLE station TYPE string;
DEFINE FIELD status ON TABLE station TYPE string \
    ASSERT $value IN ['ACTIVE', 'INACTIVE', 'MAINTENANCE'];
DEFINE FIELD last_modified_by ON TABLE station TYPE option<string>;
DEFINE FIELD created_at ON TABLE station TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE station TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Pumps
-- =======================================================================
DEFINE TABLE pump SCHEMAFULL;
DEFINE FIELD station_id ON TABLE pump TYPE string;
DEFINE FIELD pump_number ON TABLE pump TYPE int;
DEFINE FIELD main_rfid_tag ON TABLE pump TYPE string;
DEFINE FIELD status ON TABLE pump TYPE string \
    ASSERT $value IN ['LOCKED', 'OPEN', 'BROKEN'];
DEFINE FIELD created_at ON TABLE pump TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE pump TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_pump_station_number ON TABLE pump \
    COLUMNS station_id, pump_number UNIQUE;
DEFINE INDEX idx_pump_main_tag ON TABLE pump \
    COLUMNS main_rfid_tag UNIQUE;

-- =======================================================================
-- Expected child tags (soft-deleted via is_active)
-- =======================================================================
DEFINE TABLE expected_child_tag SCHEMAFULL;
DEFINE FIELD pump_id ON TABLE expected_child_tag TYPE string;
DEFINE FIELD tag_id ON TABLE expected_child_tag TYPE string;
DEFINE FIELD description ON TABLE expected_child_tag \
    TYPE option<string>;
DEFINE FIELD is_active ON TABLE expected_child_tag TYPE bool \
    DEFAULT true;
DEFINE FIELD created_at ON TABLE expected_child_tag TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_expected_tag_pump ON TABLE expected_child_tag \
    COLUMNS pump_id;

-- =======================================================================
-- Verification sessions (append-only)
-- =======================================================================
DEFINE TABLE verification_session SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD pump_id ON TABLE verification_session TYPE string;
DEFINE FIELD user_id ON TABLE verification_session \
    TYPE option<string>;
DEFINE FIELD main_tag_scanned ON TABLE verification_session \
    TYPE string;
DEFINE FIELD result ON TABLE verification_session TYPE string \
    ASSERT $value IN ['SUCCESS', 'FAILED', 'ERROR'];
DEFINE FIELD missing_tags_count ON TABLE verification_session \
    TYPE int;
DEFINE FIELD unexpected_tags_count ON TABLE verification_session \
    TYPE int;
DEFINE FIELD total_scanned ON TABLE verification_session TYPE int;
DEFINE FIELD result_message ON TABLE verification_session TYPE string;
DEFINE FIELD timestamp ON TABLE verification_session TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_session_pump_time ON TABLE verification_session \
    COLUMNS pump_id, timestamp;

-- =======================================================================
-- Scanned child tags (append-only, per session)
-- =======================================================================
DEFINE TABLE scanned_child_tag SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD session_id ON TABLE scanned_child_tag TYPE string;
DEFINE FIELD tag_id ON TABLE scanned_child_tag TYPE string;
DEFINE FIELD scan_order ON TABLE scanned_child_tag TYPE int;
DEFINE FIELD is_expected ON TABLE scanned_child_tag TYPE bool;
DEFINE INDEX idx_scanned_tag_session ON TABLE scanned_child_tag \
    COLUMNS session_id, scan_order;

-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD full_name ON TABLE user TYPE option<string>;
DEFINE FIELD role ON TABLE user TYPE string \
    ASSERT $value IN ['ADMIN', 'SUPER_ADMIN'];
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD last_login ON TABLE user TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_username ON TABLE user \
    COLUMNS username UNIQUE;

-- =======================================================================
-- Issued token ledger
-- =======================================================================
DEFINE TABLE auth_token SCHEMAFULL;
DEFINE FIELD user_id ON TABLE auth_token TYPE string;
DEFINE FIELD token_hash ON TABLE auth_token TYPE string;
DEFINE FIELD revoked ON TABLE auth_token TYPE bool DEFAULT false;
DEFINE FIELD expires_at ON TABLE auth_token TYPE datetime;
DEFINE FIELD created_at ON TABLE auth_token TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_auth_token_hash ON TABLE auth_token \
    COLUMNS user_id, token_hash;

-- =======================================================================
-- Audit log (append-only)
-- =======================================================================
DEFINE TABLE audit_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD user_id ON TABLE audit_log TYPE string;
DEFINE FIELD action ON TABLE audit_log TYPE string \
    ASSERT $value IN ['CREATE', 'UPDATE', 'DELETE'];
DEFINE FIELD entity_type ON TABLE audit_log TYPE string \
    ASSERT $value IN ['STATION', 'PUMP', 'USER', 'VERIFICATION'];
DEFINE FIELD entity_id ON TABLE audit_log TYPE string;
DEFINE FIELD old_values ON TABLE audit_log \
    FLEXIBLE TYPE option<object>;
DEFINE FIELD new_values ON TABLE audit_log \
    FLEXIBLE TYPE option<object>;
DEFINE FIELD ip_address ON TABLE audit_log TYPE option<string>;
DEFINE FIELD created_at ON TABLE audit_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_audit_entity ON TABLE audit_log \
    COLUMNS entity_type, entity_id;
DEFINE INDEX idx_audit_time ON TABLE audit_log COLUMNS created_at;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }
}
