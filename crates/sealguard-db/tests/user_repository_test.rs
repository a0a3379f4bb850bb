//! Integration tests for the User and AuthToken repository
//! implementations using in-memory SurrealDB.

use chrono::{Duration, Utc};
use sealguard_core::models::auth_token::CreateAuthToken;
use sealguard_core::models::user::{CreateUser, UpdateUser, UserRole};
use sealguard_core::repository::{AuthTokenRepository, UserRepository};
use sealguard_db::repository::{SurrealAuthTokenRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    sealguard_db::run_migrations(&db).await.unwrap();
    db
}

fn create_input(username: &str) -> CreateUser {
    CreateUser {
        username: username.into(),
        password: "operator-pass-1".into(),
        full_name: Some("Test Operator".into()),
        role: UserRole::Admin,
    }
}

#[tokio::test]
async fn create_hashes_password_and_defaults_active() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(create_input("carol")).await.unwrap();

    assert_eq!(user.username, "carol");
    assert_eq!(user.role, UserRole::Admin);
    assert!(user.is_active);
    assert!(user.last_login.is_none());
    // Argon2id PHC string, never the raw password.
    assert!(user.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    repo.create(create_input("dave")).await.unwrap();
    assert!(repo.create(create_input("dave")).await.is_err());
}

#[tokio::test]
async fn get_by_username_and_record_login() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(create_input("erin")).await.unwrap();

    let now = Utc::now();
    repo.record_login(user.id, now).await.unwrap();

    let fetched = repo.get_by_username("erin").await.unwrap();
    assert_eq!(fetched.id, user.id);
    let last_login = fetched.last_login.expect("last_login should be set");
    assert!((last_login - now).num_seconds().abs() < 2);
}

#[tokio::test]
async fn update_can_deactivate() {
    let db = setup().await;
    let repo = SurrealUserRepository::new(db);

    let user = repo.create(create_input("frank")).await.unwrap();

    let updated = repo
        .update(
            user.id,
            UpdateUser {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(!updated.is_active);
    assert_eq!(updated.username, "frank");
}

#[tokio::test]
async fn token_ledger_roundtrip() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let tokens = SurrealAuthTokenRepository::new(db);

    let user = users.create(create_input("grace")).await.unwrap();

    let token = tokens
        .create(CreateAuthToken {
            user_id: user.id,
            token_hash: "abc123".into(),
            expires_at: Utc::now() + Duration::hours(24),
        })
        .await
        .unwrap();

    assert_eq!(token.user_id, user.id);
    assert!(!token.revoked);

    tokens.revoke(user.id, "abc123").await.unwrap();
}

#[tokio::test]
async fn cleanup_removes_only_expired_tokens() {
    let db = setup().await;
    let users = SurrealUserRepository::new(db.clone());
    let tokens = SurrealAuthTokenRepository::new(db);

    let user = users.create(create_input("heidi")).await.unwrap();

    tokens
        .create(CreateAuthToken {
            user_id: user.id,
            token_hash: "expired".into(),
            expires_at: Utc::now() - Duration::hours(1),
        })
        .await
        .unwrap();
    tokens
        .create(CreateAuthToken {
            user_id: user.id,
            token_hash: "fresh".into(),
            expires_at: Utc::now() + Duration::hours(1),
        })
        .await
        .unwrap();

    let removed = tokens.cleanup_expired().await.unwrap();
    assert_eq!(removed, 1);
}
