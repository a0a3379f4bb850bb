//! Integration tests for the append-only audit log repository using
//! in-memory SurrealDB.

use sealguard_core::models::audit::{AuditAction, AuditEntityType, CreateAuditLogEntry};
use sealguard_core::repository::{AuditLogFilter, AuditLogRepository, Pagination};
use sealguard_db::repository::SurrealAuditLogRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> SurrealAuditLogRepository<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    sealguard_db::run_migrations(&db).await.unwrap();
    SurrealAuditLogRepository::new(db)
}

fn entry(
    user_id: Uuid,
    action: AuditAction,
    entity_type: AuditEntityType,
    entity_id: &str,
) -> CreateAuditLogEntry {
    CreateAuditLogEntry {
        user_id,
        action,
        entity_type,
        entity_id: entity_id.into(),
        old_values: None,
        new_values: Some(serde_json::json!({ "name": "value" })),
        ip_address: Some("10.0.0.1".into()),
    }
}

#[tokio::test]
async fn append_and_read_back() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();

    let appended = repo
        .append(entry(
            user_id,
            AuditAction::Create,
            AuditEntityType::Station,
            "station-1",
        ))
        .await
        .unwrap();

    assert_eq!(appended.user_id, user_id);
    assert_eq!(appended.action, AuditAction::Create);
    assert_eq!(appended.entity_type, AuditEntityType::Station);
    assert_eq!(
        appended.new_values,
        Some(serde_json::json!({ "name": "value" }))
    );
    assert!(appended.old_values.is_none());
}

#[tokio::test]
async fn list_filters_by_action_and_user() {
    let repo = setup().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    repo.append(entry(
        alice,
        AuditAction::Create,
        AuditEntityType::Station,
        "s1",
    ))
    .await
    .unwrap();
    repo.append(entry(
        alice,
        AuditAction::Update,
        AuditEntityType::Station,
        "s1",
    ))
    .await
    .unwrap();
    repo.append(entry(bob, AuditAction::Delete, AuditEntityType::Pump, "p1"))
        .await
        .unwrap();

    let updates = repo
        .list(
            &AuditLogFilter {
                action: Some(AuditAction::Update),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(updates.total, 1);

    let by_bob = repo
        .list(
            &AuditLogFilter {
                user_id: Some(bob),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_bob.total, 1);
    assert_eq!(by_bob.items[0].entity_type, AuditEntityType::Pump);
}

#[tokio::test]
async fn list_for_entity_returns_newest_first_with_limit() {
    let repo = setup().await;
    let user_id = Uuid::new_v4();

    for _ in 0..3 {
        repo.append(entry(
            user_id,
            AuditAction::Update,
            AuditEntityType::Station,
            "s1",
        ))
        .await
        .unwrap();
    }
    repo.append(entry(
        user_id,
        AuditAction::Update,
        AuditEntityType::Station,
        "other",
    ))
    .await
    .unwrap();

    let logs = repo
        .list_for_entity(AuditEntityType::Station, "s1", 2)
        .await
        .unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|log| log.entity_id == "s1"));
    assert!(logs[0].created_at >= logs[1].created_at);
}
