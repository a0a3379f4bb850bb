//! SurrealDB implementation of [`VerificationRepository`].
//!
//! Sessions and their scanned tags are append-only. The create path
//! writes the session row and every scanned tag row in one
//! transaction so a partial failure never leaves an orphaned session.

use chrono::{DateTime, Utc};
use sealguard_core::error::SealguardResult;
use sealguard_core::models::verification::{
    CreateVerificationSession, ScannedChildTag, VerificationResult, VerificationSession,
};
use sealguard_core::repository::{
    PaginatedResult, Pagination, VerificationFilter, VerificationRepository,
};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct SessionRow {
    pump_id: String,
    user_id: Option<String>,
    main_tag_scanned: String,
    result: String,
    missing_tags_count: u32,
    unexpected_tags_count: u32,
    total_scanned: u32,
    result_message: String,
    timestamp: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    pump_id: String,
    user_id: Option<String>,
    main_tag_scanned: String,
    result: String,
    missing_tags_count: u32,
    unexpected_tags_count: u32,
    total_scanned: u32,
    result_message: String,
    timestamp: DateTime<Utc>,
}

fn parse_user(raw: Option<String>) -> Result<Option<Uuid>, DbError> {
    raw.map(|s| {
        Uuid::parse_str(&s).map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))
    })
    .transpose()
}

impl SessionRow {
    fn into_session(self, id: Uuid) -> Result<VerificationSession, DbError> {
        let pump_id = Uuid::parse_str(&self.pump_id)
            .map_err(|e| DbError::Decode(format!("invalid pump UUID: {e}")))?;
        Ok(VerificationSession {
            id,
            pump_id,
            user_id: parse_user(self.user_id)?,
            main_tag_scanned: self.main_tag_scanned,
            result: self
                .result
                .parse::<VerificationResult>()
                .map_err(DbError::Decode)?,
            missing_tags_count: self.missing_tags_count,
            unexpected_tags_count: self.unexpected_tags_count,
            total_scanned: self.total_scanned,
            result_message: self.result_message,
            timestamp: self.timestamp,
        })
    }
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<VerificationSession, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let pump_id = Uuid::parse_str(&self.pump_id)
            .map_err(|e| DbError::Decode(format!("invalid pump UUID: {e}")))?;
        Ok(VerificationSession {
            id,
            pump_id,
            user_id: parse_user(self.user_id)?,
            main_tag_scanned: self.main_tag_scanned,
            result: self
                .result
                .parse::<VerificationResult>()
                .map_err(DbError::Decode)?,
            missing_tags_count: self.missing_tags_count,
            unexpected_tags_count: self.unexpected_tags_count,
            total_scanned: self.total_scanned,
            result_message: self.result_message,
            timestamp: self.timestamp,
        })
    }
}

/// DB-side row struct for scanned tags.
#[derive(Debug, SurrealValue)]
struct ScannedTagRowWithId {
    record_id: String,
    session_id: String,
    tag_id: String,
    scan_order: u32,
    is_expected: bool,
}

impl ScannedTagRowWithId {
    fn try_into_tag(self) -> Result<ScannedChildTag, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let session_id = Uuid::parse_str(&self.session_id)
            .map_err(|e| DbError::Decode(format!("invalid session UUID: {e}")))?;
        Ok(ScannedChildTag {
            id,
            session_id,
            tag_id: self.tag_id,
            scan_order: self.scan_order,
            is_expected: self.is_expected,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Verification repository.
#[derive(Clone)]
pub struct SurrealVerificationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealVerificationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

/// Build the WHERE conditions shared by the session list queries.
/// Binding is left to the caller.
fn filter_conditions(filter: &VerificationFilter, conds: &mut Vec<&'static str>) {
    if filter.result.is_some() {
        conds.push("result = $result");
    }
    if filter.station_id.is_some() {
        conds.push(
            "pump_id IN (SELECT VALUE meta::id(id) FROM pump \
             WHERE station_id = $filter_station_id)",
        );
    }
    if filter.from.is_some() {
        conds.push("timestamp >= $from");
    }
    if filter.to.is_some() {
        conds.push("timestamp <= $to");
    }
}

impl<C: Connection> SurrealVerificationRepository<C> {
    /// Run the count + page queries for a WHERE clause whose binds are
    /// applied by `bind_filter` on each query.
    async fn paged_sessions(
        &self,
        where_clause: &str,
        filter: &VerificationFilter,
        pump_id: Option<&str>,
        pagination: Pagination,
    ) -> Result<PaginatedResult<VerificationSession>, DbError> {
        let mut count_query = self.db.query(format!(
            "SELECT count() AS total FROM verification_session \
             {where_clause} GROUP ALL"
        ));
        count_query = bind_filter(count_query, filter, pump_id);
        let mut count_result = count_query.await?;
        let count_rows: Vec<CountRow> = count_result.take(0)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut list_query = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM verification_session \
                 {where_clause} \
                 ORDER BY timestamp DESC \
                 LIMIT $limit START $offset"
            ))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        list_query = bind_filter(list_query, filter, pump_id);

        let mut result = list_query.await?;
        let rows: Vec<SessionRowWithId> = result.take(0)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_session())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

fn bind_filter<'a, C: Connection>(
    mut query: surrealdb::method::Query<'a, C>,
    filter: &VerificationFilter,
    pump_id: Option<&str>,
) -> surrealdb::method::Query<'a, C> {
    if let Some(pump_id) = pump_id {
        query = query.bind(("pump_id", pump_id.to_string()));
    }
    if let Some(result) = filter.result {
        query = query.bind(("result", result.as_str()));
    }
    if let Some(station_id) = filter.station_id {
        query = query.bind(("filter_station_id", station_id.to_string()));
    }
    if let Some(from) = filter.from {
        query = query.bind(("from", from));
    }
    if let Some(to) = filter.to {
        query = query.bind(("to", to));
    }
    query
}

impl<C: Connection> VerificationRepository for SurrealVerificationRepository<C> {
    async fn create(&self, input: CreateVerificationSession) -> SealguardResult<VerificationSession> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let tags: Vec<serde_json::Value> = input
            .scanned_tags
            .iter()
            .map(|tag| {
                serde_json::json!({
                    "id": Uuid::new_v4().to_string(),
                    "tag_id": tag.tag_id,
                    "scan_order": tag.scan_order,
                    "is_expected": tag.is_expected,
                })
            })
            .collect();

        let result = self
            .db
            .query(
                "BEGIN TRANSACTION; \
                 CREATE type::record('verification_session', $id) SET \
                 pump_id = $pump_id, \
                 user_id = $user_id, \
                 main_tag_scanned = $main_tag_scanned, \
                 result = $result, \
                 missing_tags_count = $missing_tags_count, \
                 unexpected_tags_count = $unexpected_tags_count, \
                 total_scanned = $total_scanned, \
                 result_message = $result_message; \
                 FOR $tag IN $tags { \
                     CREATE type::record('scanned_child_tag', $tag.id) SET \
                     session_id = $id, \
                     tag_id = $tag.tag_id, \
                     scan_order = $tag.scan_order, \
                     is_expected = $tag.is_expected; \
                 }; \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .bind(("pump_id", input.pump_id.to_string()))
            .bind(("user_id", input.user_id.map(|u| u.to_string())))
            .bind(("main_tag_scanned", input.main_tag_scanned))
            .bind(("result", input.result.as_str()))
            .bind(("missing_tags_count", input.missing_tags_count))
            .bind(("unexpected_tags_count", input.unexpected_tags_count))
            .bind(("total_scanned", input.total_scanned))
            .bind(("result_message", input.result_message))
            .bind(("tags", serde_json::Value::Array(tags)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_query_error("verification_session", e))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "verification_session".into(),
            id: id_str,
        })?;

        Ok(row.into_session(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> SealguardResult<VerificationSession> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('verification_session', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "verification_session".into(),
            id: id_str,
        })?;

        Ok(row.into_session(id)?)
    }

    async fn scanned_tags(&self, session_id: Uuid) -> SealguardResult<Vec<ScannedChildTag>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM scanned_child_tag \
                 WHERE session_id = $session_id \
                 ORDER BY scan_order ASC",
            )
            .bind(("session_id", session_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ScannedTagRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_tag())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn latest_for_pump(&self, pump_id: Uuid) -> SealguardResult<Option<VerificationSession>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM verification_session \
                 WHERE pump_id = $pump_id \
                 ORDER BY timestamp DESC LIMIT 1",
            )
            .bind(("pump_id", pump_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .next()
            .map(|row| row.try_into_session())
            .transpose()?)
    }

    async fn list_for_pump(
        &self,
        pump_id: Uuid,
        filter: &VerificationFilter,
        pagination: Pagination,
    ) -> SealguardResult<PaginatedResult<VerificationSession>> {
        let mut conds = vec!["pump_id = $pump_id"];
        filter_conditions(filter, &mut conds);
        let where_clause = format!("WHERE {}", conds.join(" AND "));

        let pump_id_str = pump_id.to_string();
        Ok(self
            .paged_sessions(&where_clause, filter, Some(&pump_id_str), pagination)
            .await?)
    }

    async fn list_all(
        &self,
        filter: &VerificationFilter,
        pagination: Pagination,
    ) -> SealguardResult<PaginatedResult<VerificationSession>> {
        let mut conds = Vec::new();
        filter_conditions(filter, &mut conds);
        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conds.join(" AND "))
        };

        Ok(self
            .paged_sessions(&where_clause, filter, None, pagination)
            .await?)
    }

    async fn count_since(
        &self,
        since: Option<DateTime<Utc>>,
        result: Option<VerificationResult>,
    ) -> SealguardResult<u64> {
        let mut conds = Vec::new();
        if since.is_some() {
            conds.push("timestamp >= $since");
        }
        if result.is_some() {
            conds.push("result = $result");
        }
        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", conds.join(" AND "))
        };

        let mut query = self.db.query(format!(
            "SELECT count() AS total FROM verification_session \
             {where_clause}GROUP ALL"
        ));
        if let Some(since) = since {
            query = query.bind(("since", since));
        }
        if let Some(result) = result {
            query = query.bind(("result", result.as_str()));
        }

        let mut response = query.await.map_err(DbError::from)?;
        let rows: Vec<CountRow> = response.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
