//! Integration tests for the Verification repository implementation
//! using in-memory SurrealDB.

use chrono::{Duration, Utc};
use sealguard_core::models::pump::{CreateExpectedChildTag, CreatePump};
use sealguard_core::models::station::CreateStation;
use sealguard_core::models::verification::{
    CreateScannedChildTag, CreateVerificationSession, VerificationResult,
};
use sealguard_core::repository::{
    Pagination, PumpRepository, StationRepository, VerificationFilter, VerificationRepository,
};
use sealguard_db::repository::{
    SurrealPumpRepository, SurrealStationRepository, SurrealVerificationRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

/// Helper: in-memory DB with one station and one pump.
async fn setup() -> (SurrealVerificationRepository<Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    sealguard_db::run_migrations(&db).await.unwrap();

    let stations = SurrealStationRepository::new(db.clone());
    let station = stations
        .create(CreateStation {
            name: "Test Station".into(),
            location: "Test Road".into(),
        })
        .await
        .unwrap();

    let pumps = SurrealPumpRepository::new(db.clone());
    let pump = pumps
        .create(CreatePump {
            station_id: station.id,
            pump_number: 1,
            main_rfid_tag: "MAIN".into(),
            expected_child_tags: vec![CreateExpectedChildTag {
                tag_id: "T1".into(),
                description: None,
            }],
        })
        .await
        .unwrap();

    (
        SurrealVerificationRepository::new(db),
        pump.id,
        station.id,
    )
}

fn session_input(
    pump_id: Uuid,
    result: VerificationResult,
    scanned: &[(&str, bool)],
) -> CreateVerificationSession {
    CreateVerificationSession {
        pump_id,
        user_id: None,
        main_tag_scanned: "MAIN".into(),
        result,
        missing_tags_count: 0,
        unexpected_tags_count: scanned.iter().filter(|(_, expected)| !expected).count() as u32,
        total_scanned: scanned.len() as u32,
        result_message: "test".into(),
        scanned_tags: scanned
            .iter()
            .enumerate()
            .map(|(index, (tag, expected))| CreateScannedChildTag {
                tag_id: tag.to_string(),
                scan_order: index as u32 + 1,
                is_expected: *expected,
            })
            .collect(),
    }
}

#[tokio::test]
async fn create_persists_session_and_ordered_tags() {
    let (repo, pump_id, _) = setup().await;

    let session = repo
        .create(session_input(
            pump_id,
            VerificationResult::Failed,
            &[("T1", true), ("X", false), ("Y", false)],
        ))
        .await
        .unwrap();

    assert_eq!(session.pump_id, pump_id);
    assert_eq!(session.result, VerificationResult::Failed);
    assert_eq!(session.total_scanned, 3);
    assert_eq!(session.unexpected_tags_count, 2);

    let tags = repo.scanned_tags(session.id).await.unwrap();
    assert_eq!(tags.len(), 3);
    let orders: Vec<u32> = tags.iter().map(|tag| tag.scan_order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert_eq!(tags[0].tag_id, "T1");
    assert!(tags[0].is_expected);
    assert!(!tags[1].is_expected);
}

#[tokio::test]
async fn create_with_empty_scan_has_no_tag_rows() {
    let (repo, pump_id, _) = setup().await;

    let session = repo
        .create(session_input(pump_id, VerificationResult::Failed, &[]))
        .await
        .unwrap();

    assert_eq!(session.total_scanned, 0);
    assert!(repo.scanned_tags(session.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn latest_for_pump_returns_newest_session() {
    let (repo, pump_id, _) = setup().await;

    assert!(repo.latest_for_pump(pump_id).await.unwrap().is_none());

    repo.create(session_input(
        pump_id,
        VerificationResult::Success,
        &[("T1", true)],
    ))
    .await
    .unwrap();
    let second = repo
        .create(session_input(pump_id, VerificationResult::Failed, &[]))
        .await
        .unwrap();

    let latest = repo.latest_for_pump(pump_id).await.unwrap().unwrap();
    assert_eq!(latest.id, second.id);
}

#[tokio::test]
async fn list_for_pump_filters_by_result() {
    let (repo, pump_id, _) = setup().await;

    repo.create(session_input(
        pump_id,
        VerificationResult::Success,
        &[("T1", true)],
    ))
    .await
    .unwrap();
    repo.create(session_input(pump_id, VerificationResult::Failed, &[]))
        .await
        .unwrap();
    repo.create(session_input(pump_id, VerificationResult::Failed, &[]))
        .await
        .unwrap();

    let failed = repo
        .list_for_pump(
            pump_id,
            &VerificationFilter {
                result: Some(VerificationResult::Failed),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(failed.total, 2);
    assert!(
        failed
            .items
            .iter()
            .all(|session| session.result == VerificationResult::Failed)
    );

    let all = repo
        .list_for_pump(pump_id, &VerificationFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 3);
}

#[tokio::test]
async fn list_all_filters_by_station() {
    let (repo, pump_id, station_id) = setup().await;

    repo.create(session_input(
        pump_id,
        VerificationResult::Success,
        &[("T1", true)],
    ))
    .await
    .unwrap();

    let matching = repo
        .list_all(
            &VerificationFilter {
                station_id: Some(station_id),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(matching.total, 1);

    let other_station = repo
        .list_all(
            &VerificationFilter {
                station_id: Some(Uuid::new_v4()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(other_station.total, 0);
}

#[tokio::test]
async fn count_since_respects_result_and_window() {
    let (repo, pump_id, _) = setup().await;

    repo.create(session_input(
        pump_id,
        VerificationResult::Success,
        &[("T1", true)],
    ))
    .await
    .unwrap();
    repo.create(session_input(pump_id, VerificationResult::Failed, &[]))
        .await
        .unwrap();

    assert_eq!(repo.count_since(None, None).await.unwrap(), 2);
    assert_eq!(
        repo.count_since(None, Some(VerificationResult::Failed))
            .await
            .unwrap(),
        1
    );

    let yesterday = Utc::now() - Duration::days(1);
    assert_eq!(repo.count_since(Some(yesterday), None).await.unwrap(), 2);

    let tomorrow = Utc::now() + Duration::days(1);
    assert_eq!(repo.count_since(Some(tomorrow), None).await.unwrap(), 0);
}
