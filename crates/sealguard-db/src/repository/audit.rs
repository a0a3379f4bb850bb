//! SurrealDB implementation of [`AuditLogRepository`].

use chrono::{DateTime, Utc};
use sealguard_core::error::SealguardResult;
use sealguard_core::models::audit::{
    AuditAction, AuditEntityType, AuditLogEntry, CreateAuditLogEntry,
};
use sealguard_core::repository::{
    AuditLogFilter, AuditLogRepository, PaginatedResult, Pagination,
};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct AuditRow {
    user_id: String,
    action: String,
    entity_type: String,
    entity_id: String,
    old_values: Option<serde_json::Value>,
    new_values: Option<serde_json::Value>,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    user_id: String,
    action: String,
    entity_type: String,
    entity_id: String,
    old_values: Option<serde_json::Value>,
    new_values: Option<serde_json::Value>,
    ip_address: Option<String>,
    created_at: DateTime<Utc>,
}

impl AuditRow {
    fn into_entry(self, id: Uuid) -> Result<AuditLogEntry, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?;
        Ok(AuditLogEntry {
            id,
            user_id,
            action: self.action.parse::<AuditAction>().map_err(DbError::Decode)?,
            entity_type: self
                .entity_type
                .parse::<AuditEntityType>()
                .map_err(DbError::Decode)?,
            entity_id: self.entity_id,
            old_values: self.old_values,
            new_values: self.new_values,
            ip_address: self.ip_address,
            created_at: self.created_at,
        })
    }
}

impl AuditRowWithId {
    fn try_into_entry(self) -> Result<AuditLogEntry, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?;
        Ok(AuditLogEntry {
            id,
            user_id,
            action: self.action.parse::<AuditAction>().map_err(DbError::Decode)?,
            entity_type: self
                .entity_type
                .parse::<AuditEntityType>()
                .map_err(DbError::Decode)?,
            entity_id: self.entity_id,
            old_values: self.old_values,
            new_values: self.new_values,
            ip_address: self.ip_address,
            created_at: self.created_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the append-only audit log.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

/// Build the WHERE clause for an audit filter. Binding is left to the
/// caller.
fn filter_conditions(filter: &AuditLogFilter) -> Vec<&'static str> {
    let mut conds = Vec::new();
    if filter.user_id.is_some() {
        conds.push("user_id = $user_id");
    }
    if filter.action.is_some() {
        conds.push("action = $action");
    }
    if filter.entity_type.is_some() {
        conds.push("entity_type = $entity_type");
    }
    if filter.from.is_some() {
        conds.push("created_at >= $from");
    }
    if filter.to.is_some() {
        conds.push("created_at <= $to");
    }
    conds
}

fn bind_filter<'a, C: Connection>(
    mut query: surrealdb::method::Query<'a, C>,
    filter: &AuditLogFilter,
) -> surrealdb::method::Query<'a, C> {
    if let Some(user_id) = filter.user_id {
        query = query.bind(("user_id", user_id.to_string()));
    }
    if let Some(action) = filter.action {
        query = query.bind(("action", action.as_str()));
    }
    if let Some(entity_type) = filter.entity_type {
        query = query.bind(("entity_type", entity_type.as_str()));
    }
    if let Some(from) = filter.from {
        query = query.bind(("from", from));
    }
    if let Some(to) = filter.to {
        query = query.bind(("to", to));
    }
    query
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, input: CreateAuditLogEntry) -> SealguardResult<AuditLogEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 user_id = $user_id, \
                 action = $action, \
                 entity_type = $entity_type, \
                 entity_id = $entity_id, \
                 old_values = $old_values, \
                 new_values = $new_values, \
                 ip_address = $ip_address",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("action", input.action.as_str()))
            .bind(("entity_type", input.entity_type.as_str()))
            .bind(("entity_id", input.entity_id))
            .bind(("old_values", input.old_values))
            .bind(("new_values", input.new_values))
            .bind(("ip_address", input.ip_address))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_query_error("audit_log", e))?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "audit_log".into(),
            id: id_str,
        })?;

        Ok(row.into_entry(id)?)
    }

    async fn list(
        &self,
        filter: &AuditLogFilter,
        pagination: Pagination,
    ) -> SealguardResult<PaginatedResult<AuditLogEntry>> {
        let conds = filter_conditions(filter);
        let where_clause = if conds.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", conds.join(" AND "))
        };

        let count_query = self.db.query(format!(
            "SELECT count() AS total FROM audit_log {where_clause}GROUP ALL"
        ));
        let mut count_result = bind_filter(count_query, filter)
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let list_query = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM audit_log {where_clause}\
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset"
            ))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));

        let mut result = bind_filter(list_query, filter)
            .await
            .map_err(DbError::from)?;
        let rows: Vec<AuditRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_for_entity(
        &self,
        entity_type: AuditEntityType,
        entity_id: &str,
        limit: u64,
    ) -> SealguardResult<Vec<AuditLogEntry>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM audit_log \
                 WHERE entity_type = $entity_type AND entity_id = $entity_id \
                 ORDER BY created_at DESC \
                 LIMIT $limit",
            )
            .bind(("entity_type", entity_type.as_str()))
            .bind(("entity_id", entity_id.to_string()))
            .bind(("limit", limit))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AuditRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
