//! SurrealDB implementation of [`AuthTokenRepository`].

use chrono::{DateTime, Utc};
use sealguard_core::error::SealguardResult;
use sealguard_core::models::auth_token::{AuthToken, CreateAuthToken};
use sealguard_core::repository::AuthTokenRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TokenRow {
    user_id: String,
    token_hash: String,
    revoked: bool,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TokenRow {
    fn into_token(self, id: Uuid) -> Result<AuthToken, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?;
        Ok(AuthToken {
            id,
            user_id,
            token_hash: self.token_hash,
            revoked: self.revoked,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the issued-token ledger.
#[derive(Clone)]
pub struct SurrealAuthTokenRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuthTokenRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuthTokenRepository for SurrealAuthTokenRepository<C> {
    async fn create(&self, input: CreateAuthToken) -> SealguardResult<AuthToken> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('auth_token', $id) SET \
                 user_id = $user_id, \
                 token_hash = $token_hash, \
                 revoked = false, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_query_error("auth_token", e))?;

        let rows: Vec<TokenRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "auth_token".into(),
            id: id_str,
        })?;

        Ok(row.into_token(id)?)
    }

    async fn revoke(&self, user_id: Uuid, token_hash: &str) -> SealguardResult<()> {
        self.db
            .query(
                "UPDATE auth_token SET revoked = true \
                 WHERE user_id = $user_id AND token_hash = $token_hash",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> SealguardResult<u64> {
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM auth_token \
                 WHERE expires_at <= time::now() GROUP ALL",
            )
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE auth_token WHERE expires_at <= time::now()")
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}
