//! SurrealDB implementation of [`StationRepository`].

use chrono::{DateTime, Utc};
use sealguard_core::error::SealguardResult;
use sealguard_core::models::station::{CreateStation, GasStation, StationStatus, UpdateStation};
use sealguard_core::repository::{PaginatedResult, Pagination, StationFilter, StationRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct StationRow {
    name: String,
    location: String,
    status: String,
    last_modified_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct StationRowWithId {
    record_id: String,
    name: String,
    location: String,
    status: String,
    last_modified_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_modifier(raw: Option<String>) -> Result<Option<Uuid>, DbError> {
    raw.map(|s| {
        Uuid::parse_str(&s).map_err(|e| DbError::Decode(format!("invalid modifier UUID: {e}")))
    })
    .transpose()
}

impl StationRow {
    fn into_station(self, id: Uuid) -> Result<GasStation, DbError> {
        Ok(GasStation {
            id,
            name: self.name,
            location: self.location,
            status: self.status.parse::<StationStatus>().map_err(DbError::Decode)?,
            last_modified_by: parse_modifier(self.last_modified_by)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl StationRowWithId {
    fn try_into_station(self) -> Result<GasStation, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        Ok(GasStation {
            id,
            name: self.name,
            location: self.location,
            status: self.status.parse::<StationStatus>().map_err(DbError::Decode)?,
            last_modified_by: parse_modifier(self.last_modified_by)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Station repository.
#[derive(Clone)]
pub struct SurrealStationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealStationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

/// Build the WHERE clause for a station filter. Binding of `$status`
/// and `$search` is left to the caller.
fn filter_conditions(filter: &StationFilter) -> Vec<&'static str> {
    let mut conds = Vec::new();
    if filter.status.is_some() {
        conds.push("status = $status");
    }
    if filter.search.is_some() {
        conds.push(
            "(string::contains(string::lowercase(name), $search) \
             OR string::contains(string::lowercase(location), $search))",
        );
    }
    conds
}

impl<C: Connection> StationRepository for SurrealStationRepository<C> {
    async fn create(&self, input: CreateStation) -> SealguardResult<GasStation> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('station', $id) SET \
                 name = $name, location = $location, \
                 status = $status, last_modified_by = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("location", input.location))
            .bind(("status", StationStatus::Active.as_str()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_query_error("station", e))?;

        let rows: Vec<StationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "station".into(),
            id: id_str,
        })?;

        Ok(row.into_station(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> SealguardResult<GasStation> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('station', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "station".into(),
            id: id_str,
        })?;

        Ok(row.into_station(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateStation) -> SealguardResult<GasStation> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.location.is_some() {
            sets.push("location = $location");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.last_modified_by.is_some() {
            sets.push("last_modified_by = $last_modified_by");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('station', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(location) = input.location {
            builder = builder.bind(("location", location));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str()));
        }
        if let Some(user_id) = input.last_modified_by {
            builder = builder.bind(("last_modified_by", user_id.to_string()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_query_error("station", e))?;

        let rows: Vec<StationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "station".into(),
            id: id_str,
        })?;

        Ok(row.into_station(id)?)
    }

    async fn delete(&self, id: Uuid) -> SealguardResult<()> {
        self.db
            .query("DELETE type::record('station', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        filter: &StationFilter,
        pagination: Pagination,
    ) -> SealguardResult<PaginatedResult<GasStation>> {
        let conds = filter_conditions(filter);
        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", conds.join(" AND "))
        };

        let mut count_query = self
            .db
            .query(format!(
                "SELECT count() AS total FROM station {where_clause}GROUP ALL"
            ));
        if let Some(status) = filter.status {
            count_query = count_query.bind(("status", status.as_str()));
        }
        if let Some(search) = &filter.search {
            count_query = count_query.bind(("search", search.to_lowercase()));
        }
        let mut count_result = count_query.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut list_query = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM station {where_clause}\
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset"
            ))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(status) = filter.status {
            list_query = list_query.bind(("status", status.as_str()));
        }
        if let Some(search) = &filter.search {
            list_query = list_query.bind(("search", search.to_lowercase()));
        }

        let mut result = list_query.await.map_err(DbError::from)?;
        let rows: Vec<StationRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_station())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count(&self) -> SealguardResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM station GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_by_status(&self, status: StationStatus) -> SealguardResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM station \
                 WHERE status = $status GROUP ALL",
            )
            .bind(("status", status.as_str()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
