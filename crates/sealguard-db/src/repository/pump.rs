//! SurrealDB implementation of [`PumpRepository`].
//!
//! Pump creation and expected-tag replacement write the pump and its
//! tag rows inside a single transaction. Expected tags are never hard
//! deleted: replacement deactivates the previous active rows.

use chrono::{DateTime, Utc};
use sealguard_core::error::SealguardResult;
use sealguard_core::models::pump::{
    CreateExpectedChildTag, CreatePump, ExpectedChildTag, Pump, PumpStatus, UpdatePump,
};
use sealguard_core::repository::PumpRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PumpRow {
    station_id: String,
    pump_number: u32,
    main_rfid_tag: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PumpRowWithId {
    record_id: String,
    station_id: String,
    pump_number: u32,
    main_rfid_tag: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PumpRow {
    fn into_pump(self, id: Uuid) -> Result<Pump, DbError> {
        let station_id = Uuid::parse_str(&self.station_id)
            .map_err(|e| DbError::Decode(format!("invalid station UUID: {e}")))?;
        Ok(Pump {
            id,
            station_id,
            pump_number: self.pump_number,
            main_rfid_tag: self.main_rfid_tag,
            status: self.status.parse::<PumpStatus>().map_err(DbError::Decode)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PumpRowWithId {
    fn try_into_pump(self) -> Result<Pump, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let station_id = Uuid::parse_str(&self.station_id)
            .map_err(|e| DbError::Decode(format!("invalid station UUID: {e}")))?;
        Ok(Pump {
            id,
            station_id,
            pump_number: self.pump_number,
            main_rfid_tag: self.main_rfid_tag,
            status: self.status.parse::<PumpStatus>().map_err(DbError::Decode)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct for expected child tags.
#[derive(Debug, SurrealValue)]
struct ExpectedTagRowWithId {
    record_id: String,
    pump_id: String,
    tag_id: String,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl ExpectedTagRowWithId {
    fn try_into_tag(self) -> Result<ExpectedChildTag, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let pump_id = Uuid::parse_str(&self.pump_id)
            .map_err(|e| DbError::Decode(format!("invalid pump UUID: {e}")))?;
        Ok(ExpectedChildTag {
            id,
            pump_id,
            tag_id: self.tag_id,
            description: self.description,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Serialize expected-tag inputs for a `FOR $tag IN $tags` loop.
/// Each object carries a fresh record id; `description` is omitted
/// when absent so the field stays NONE.
fn tag_objects(tags: &[CreateExpectedChildTag]) -> serde_json::Value {
    let objects: Vec<serde_json::Value> = tags
        .iter()
        .map(|tag| {
            let mut obj = serde_json::json!({
                "id": Uuid::new_v4().to_string(),
                "tag_id": tag.tag_id,
            });
            if let Some(description) = &tag.description {
                obj["description"] = serde_json::Value::String(description.clone());
            }
            obj
        })
        .collect();
    serde_json::Value::Array(objects)
}

/// SurrealDB implementation of the Pump repository.
#[derive(Clone)]
pub struct SurrealPumpRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPumpRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PumpRepository for SurrealPumpRepository<C> {
    async fn create(&self, input: CreatePump) -> SealguardResult<Pump> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE type::record('pump', $id) SET \
                 station_id = $station_id, \
                 pump_number = $pump_number, \
                 main_rfid_tag = $main_rfid_tag, \
                 status = $status; \
                 FOR $tag IN $tags { \
                     CREATE type::record('expected_child_tag', $tag.id) SET \
                     pump_id = $id, \
                     tag_id = $tag.tag_id, \
                     description = $tag.description, \
                     is_active = true; \
                 }; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .bind(("station_id", input.station_id.to_string()))
            .bind(("pump_number", input.pump_number))
            .bind(("main_rfid_tag", input.main_rfid_tag))
            .bind(("status", PumpStatus::Locked.as_str()))
            .bind(("tags", tag_objects(&input.expected_child_tags)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_query_error("pump", e))?;

        let rows: Vec<PumpRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "pump".into(),
            id: id_str,
        })?;

        Ok(row.into_pump(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> SealguardResult<Pump> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('pump', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PumpRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "pump".into(),
            id: id_str,
        })?;

        Ok(row.into_pump(id)?)
    }

    async fn get_by_main_tag(&self, main_rfid_tag: &str) -> SealguardResult<Pump> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM pump \
                 WHERE main_rfid_tag = $main_rfid_tag",
            )
            .bind(("main_rfid_tag", main_rfid_tag.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PumpRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "pump".into(),
            id: format!("main_rfid_tag={main_rfid_tag}"),
        })?;

        Ok(row.try_into_pump()?)
    }

    async fn get_by_station_and_number(
        &self,
        station_id: Uuid,
        pump_number: u32,
    ) -> SealguardResult<Pump> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM pump \
                 WHERE station_id = $station_id \
                 AND pump_number = $pump_number",
            )
            .bind(("station_id", station_id.to_string()))
            .bind(("pump_number", pump_number))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PumpRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "pump".into(),
            id: format!("station={station_id} pump_number={pump_number}"),
        })?;

        Ok(row.try_into_pump()?)
    }

    async fn update(&self, id: Uuid, input: UpdatePump) -> SealguardResult<Pump> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.pump_number.is_some() {
            sets.push("pump_number = $pump_number");
        }
        if input.main_rfid_tag.is_some() {
            sets.push("main_rfid_tag = $main_rfid_tag");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let update_stmt = format!(
            "UPDATE type::record('pump', $id) SET {}",
            sets.join(", ")
        );

        // Replacing the expected tag set deactivates the current active
        // rows and creates fresh ones, all in the same transaction as
        // the pump update.
        let query = if input.expected_child_tags.is_some() {
            format!(
                "BEGIN TRANSACTION; \
                 {update_stmt}; \
                 UPDATE expected_child_tag SET is_active = false \
                 WHERE pump_id = $id AND is_active = true; \
                 FOR $tag IN $tags {{ \
                     CREATE type::record('expected_child_tag', $tag.id) SET \
                     pump_id = $id, \
                     tag_id = $tag.tag_id, \
                     description = $tag.description, \
                     is_active = true; \
                 }}; \
                 COMMIT TRANSACTION;"
            )
        } else {
            update_stmt
        };

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(pump_number) = input.pump_number {
            builder = builder.bind(("pump_number", pump_number));
        }
        if let Some(main_rfid_tag) = input.main_rfid_tag {
            builder = builder.bind(("main_rfid_tag", main_rfid_tag));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str()));
        }
        if let Some(tags) = &input.expected_child_tags {
            builder = builder.bind(("tags", tag_objects(tags)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_query_error("pump", e))?;

        let rows: Vec<PumpRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "pump".into(),
            id: id_str,
        })?;

        Ok(row.into_pump(id)?)
    }

    async fn set_status(&self, id: Uuid, status: PumpStatus) -> SealguardResult<()> {
        self.db
            .query(
                "UPDATE type::record('pump', $id) SET \
                 status = $status, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("status", status.as_str()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_query_error("pump", e))?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> SealguardResult<()> {
        // Verification sessions are deliberately left in place.
        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE type::record('pump', $id); \
                 DELETE expected_child_tag WHERE pump_id = $id; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_by_station(&self, station_id: Uuid) -> SealguardResult<Vec<Pump>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM pump \
                 WHERE station_id = $station_id \
                 ORDER BY pump_number ASC",
            )
            .bind(("station_id", station_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PumpRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_pump())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn active_expected_tags(&self, pump_id: Uuid) -> SealguardResult<Vec<ExpectedChildTag>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM expected_child_tag \
                 WHERE pump_id = $pump_id AND is_active = true \
                 ORDER BY created_at ASC, tag_id ASC",
            )
            .bind(("pump_id", pump_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ExpectedTagRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_tag())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn count(&self) -> SealguardResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM pump GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_by_station(&self, station_id: Uuid) -> SealguardResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM pump \
                 WHERE station_id = $station_id GROUP ALL",
            )
            .bind(("station_id", station_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_active_expected_tags(&self, pump_id: Uuid) -> SealguardResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM expected_child_tag \
                 WHERE pump_id = $pump_id AND is_active = true GROUP ALL",
            )
            .bind(("pump_id", pump_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
