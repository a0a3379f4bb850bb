//! Database-specific error types and conversions.

use sealguard_core::error::SealguardError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Row decode failed: {0}")]
    Decode(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {entity}: {message}")]
    Duplicate { entity: String, message: String },
}

impl DbError {
    /// Classify a statement-level error: unique-index violations become
    /// [`DbError::Duplicate`] so constraint races surface as
    /// DUPLICATE_RESOURCE instead of leaking raw storage errors.
    pub fn from_query_error(entity: &str, err: surrealdb::Error) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
                message,
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for SealguardError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SealguardError::NotFound { entity, id },
            DbError::Duplicate { entity, message } => SealguardError::Duplicate { entity, message },
            other => SealguardError::Database(other.to_string()),
        }
    }
}
