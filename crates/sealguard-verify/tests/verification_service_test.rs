//! Integration tests for the verification engine using in-memory
//! SurrealDB.

use sealguard_core::error::SealguardError;
use sealguard_core::models::pump::{
    CreateExpectedChildTag, CreatePump, PumpStatus, UpdatePump,
};
use sealguard_core::models::station::CreateStation;
use sealguard_core::models::verification::VerificationResult;
use sealguard_core::repository::{
    Pagination, PumpRepository, StationRepository, VerificationFilter, VerificationRepository,
};
use sealguard_db::repository::{
    SurrealPumpRepository, SurrealStationRepository, SurrealVerificationRepository,
};
use sealguard_verify::service::{VerificationService, VerifyInput};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

fn expected(tags: &[&str]) -> Vec<CreateExpectedChildTag> {
    tags.iter()
        .map(|tag| CreateExpectedChildTag {
            tag_id: tag.to_string(),
            description: None,
        })
        .collect()
}

fn scanned(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|tag| tag.to_string()).collect()
}

/// Spin up in-memory DB, run migrations, create one station and one
/// LOCKED pump with expected tags A, B, C.
async fn setup() -> (
    VerificationService<SurrealPumpRepository<Db>, SurrealVerificationRepository<Db>>,
    SurrealPumpRepository<Db>,
    SurrealVerificationRepository<Db>,
    Uuid, // pump_id
) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    sealguard_db::run_migrations(&db).await.unwrap();

    let station_repo = SurrealStationRepository::new(db.clone());
    let station = station_repo
        .create(CreateStation {
            name: "North Station".into(),
            location: "Ring Road 12".into(),
        })
        .await
        .unwrap();

    let pump_repo = SurrealPumpRepository::new(db.clone());
    let pump = pump_repo
        .create(CreatePump {
            station_id: station.id,
            pump_number: 1,
            main_rfid_tag: "MAIN-001".into(),
            expected_child_tags: expected(&["A", "B", "C"]),
        })
        .await
        .unwrap();

    let verification_repo = SurrealVerificationRepository::new(db.clone());
    let service = VerificationService::new(pump_repo.clone(), verification_repo.clone());

    (service, pump_repo, verification_repo, pump.id)
}

fn verify_input(main_tag: &str, tags: &[&str]) -> VerifyInput {
    VerifyInput {
        main_tag_scanned: main_tag.into(),
        scanned_child_tags: scanned(tags),
    }
}

#[tokio::test]
async fn complete_scan_succeeds_and_leaves_status_alone() {
    let (service, pump_repo, _, pump_id) = setup().await;

    let outcome = service
        .verify(pump_id, None, verify_input("MAIN-001", &["A", "B", "C"]))
        .await
        .unwrap();

    assert_eq!(outcome.session.result, VerificationResult::Success);
    assert!(outcome.missing_tags.is_empty());
    assert!(outcome.unexpected_tags.is_empty());
    assert_eq!(outcome.expected_count, 3);
    assert_eq!(outcome.session.total_scanned, 3);
    assert_eq!(outcome.pump_status, PumpStatus::Locked);

    let pump = pump_repo.get_by_id(pump_id).await.unwrap();
    assert_eq!(pump.status, PumpStatus::Locked);
}

#[tokio::test]
async fn missing_tag_fails_and_trips_the_alarm() {
    let (service, pump_repo, _, pump_id) = setup().await;

    let outcome = service
        .verify(pump_id, None, verify_input("MAIN-001", &["A", "B"]))
        .await
        .unwrap();

    assert_eq!(outcome.session.result, VerificationResult::Failed);
    assert_eq!(outcome.missing_tags, vec!["C".to_string()]);
    assert!(outcome.unexpected_tags.is_empty());
    assert_eq!(outcome.session.missing_tags_count, 1);
    assert_eq!(outcome.pump_status, PumpStatus::Broken);
    assert_eq!(
        outcome.session.result_message,
        "ALERT: 1 tag(s) missing or broken. Pump may have been tampered with!"
    );

    let pump = pump_repo.get_by_id(pump_id).await.unwrap();
    assert_eq!(pump.status, PumpStatus::Broken);
}

#[tokio::test]
async fn unexpected_tag_fails_without_missing_tags() {
    let (service, _, _, pump_id) = setup().await;

    let outcome = service
        .verify(pump_id, None, verify_input("MAIN-001", &["A", "B", "C", "X"]))
        .await
        .unwrap();

    assert_eq!(outcome.session.result, VerificationResult::Failed);
    assert!(outcome.missing_tags.is_empty());
    assert_eq!(outcome.unexpected_tags, vec!["X".to_string()]);
    assert_eq!(outcome.session.unexpected_tags_count, 1);
    assert_eq!(outcome.session.total_scanned, 4);
}

#[tokio::test]
async fn main_tag_mismatch_writes_nothing() {
    let (service, pump_repo, verification_repo, pump_id) = setup().await;

    let err = service
        .verify(pump_id, None, verify_input("WRONG-TAG", &["A", "B", "C"]))
        .await
        .unwrap_err();

    assert!(matches!(err, SealguardError::MainTagMismatch { .. }));

    // No session row, pump untouched.
    let history = verification_repo
        .list_for_pump(pump_id, &VerificationFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(history.total, 0);

    let pump = pump_repo.get_by_id(pump_id).await.unwrap();
    assert_eq!(pump.status, PumpStatus::Locked);
}

#[tokio::test]
async fn broken_pump_stays_broken_but_sessions_accumulate() {
    let (service, pump_repo, verification_repo, pump_id) = setup().await;

    // First failure trips LOCKED -> BROKEN.
    service
        .verify(pump_id, None, verify_input("MAIN-001", &[]))
        .await
        .unwrap();
    assert_eq!(
        pump_repo.get_by_id(pump_id).await.unwrap().status,
        PumpStatus::Broken
    );

    // Second failure: no transition, but a fresh session is recorded.
    let outcome = service
        .verify(pump_id, None, verify_input("MAIN-001", &["A"]))
        .await
        .unwrap();
    assert_eq!(outcome.pump_status, PumpStatus::Broken);

    let history = verification_repo
        .list_for_pump(pump_id, &VerificationFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(history.total, 2);
}

#[tokio::test]
async fn success_does_not_restore_a_broken_pump() {
    let (service, pump_repo, _, pump_id) = setup().await;

    service
        .verify(pump_id, None, verify_input("MAIN-001", &[]))
        .await
        .unwrap();

    let outcome = service
        .verify(pump_id, None, verify_input("MAIN-001", &["A", "B", "C"]))
        .await
        .unwrap();

    assert_eq!(outcome.session.result, VerificationResult::Success);
    assert_eq!(outcome.pump_status, PumpStatus::Broken);
    assert_eq!(
        pump_repo.get_by_id(pump_id).await.unwrap().status,
        PumpStatus::Broken
    );
}

#[tokio::test]
async fn duplicate_scans_match_once_and_keep_scan_order() {
    let (service, _, verification_repo, pump_id) = setup().await;

    let outcome = service
        .verify(pump_id, None, verify_input("MAIN-001", &["A", "A", "B"]))
        .await
        .unwrap();

    // A matched twice cannot stand in for C.
    assert_eq!(outcome.session.result, VerificationResult::Failed);
    assert_eq!(outcome.missing_tags, vec!["C".to_string()]);
    assert_eq!(outcome.session.total_scanned, 3);

    let tags = verification_repo
        .scanned_tags(outcome.session.id)
        .await
        .unwrap();
    let orders: Vec<u32> = tags.iter().map(|tag| tag.scan_order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert!(tags.iter().all(|tag| tag.is_expected));
}

#[tokio::test]
async fn verification_records_the_acting_user() {
    let (service, _, _, pump_id) = setup().await;
    let user_id = Uuid::new_v4();

    let outcome = service
        .verify(
            pump_id,
            Some(user_id),
            verify_input("MAIN-001", &["A", "B", "C"]),
        )
        .await
        .unwrap();

    assert_eq!(outcome.session.user_id, Some(user_id));
}

#[tokio::test]
async fn detail_replay_recomputes_missing_against_current_expected_set() {
    let (service, pump_repo, _, pump_id) = setup().await;

    let outcome = service
        .verify(pump_id, None, verify_input("MAIN-001", &["A", "B", "C"]))
        .await
        .unwrap();

    // Replace the expected set: D joins, C leaves.
    pump_repo
        .update(
            pump_id,
            UpdatePump {
                expected_child_tags: Some(expected(&["A", "B", "D"])),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let detail = service.session_detail(outcome.session.id).await.unwrap();

    // Missing is current-state-relative: D was never scanned.
    assert_eq!(detail.missing_tags, vec!["D".to_string()]);
    // The scan-time snapshot is untouched: every scanned tag was
    // expected back then, C included.
    assert!(detail.scanned_tags.iter().all(|tag| tag.is_expected));
    assert!(detail.unexpected_tags.is_empty());
    assert_eq!(detail.session.missing_tags_count, 0);
}

#[tokio::test]
async fn empty_scan_against_expected_set_is_all_missing() {
    let (service, _, _, pump_id) = setup().await;

    let outcome = service
        .verify(pump_id, None, verify_input("MAIN-001", &[]))
        .await
        .unwrap();

    assert_eq!(outcome.session.result, VerificationResult::Failed);
    assert_eq!(
        outcome.missing_tags,
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    );
    assert_eq!(outcome.session.total_scanned, 0);
}
