//! Integration tests for the Pump repository implementation using
//! in-memory SurrealDB.

use sealguard_core::models::pump::{
    CreateExpectedChildTag, CreatePump, PumpStatus, UpdatePump,
};
use sealguard_core::models::station::CreateStation;
use sealguard_core::repository::{PumpRepository, StationRepository};
use sealguard_db::repository::{SurrealPumpRepository, SurrealStationRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

fn tags(ids: &[&str]) -> Vec<CreateExpectedChildTag> {
    ids.iter()
        .map(|id| CreateExpectedChildTag {
            tag_id: id.to_string(),
            description: Some(format!("seal {id}")),
        })
        .collect()
}

/// Helper: in-memory DB with migrations and one station.
async fn setup() -> (SurrealPumpRepository<Db>, Uuid) {
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

    (SurrealPumpRepository::new(db), station.id)
}

#[tokio::test]
async fn create_pump_with_expected_tags() {
    let (repo, station_id) = setup().await;

    let pump = repo
        .create(CreatePump {
            station_id,
            pump_number: 1,
            main_rfid_tag: "MAIN-A".into(),
            expected_child_tags: tags(&["T1", "T2"]),
        })
        .await
        .unwrap();

    assert_eq!(pump.station_id, station_id);
    assert_eq!(pump.pump_number, 1);
    assert_eq!(pump.status, PumpStatus::Locked);

    let expected = repo.active_expected_tags(pump.id).await.unwrap();
    let ids: Vec<&str> = expected.iter().map(|tag| tag.tag_id.as_str()).collect();
    assert_eq!(ids, vec!["T1", "T2"]);
    assert!(expected.iter().all(|tag| tag.is_active));
    assert_eq!(expected[0].description.as_deref(), Some("seal T1"));
}

#[tokio::test]
async fn duplicate_main_tag_creates_no_row() {
    let (repo, station_id) = setup().await;

    repo.create(CreatePump {
        station_id,
        pump_number: 1,
        main_rfid_tag: "MAIN-A".into(),
        expected_child_tags: tags(&["T1"]),
    })
    .await
    .unwrap();

    let result = repo
        .create(CreatePump {
            station_id,
            pump_number: 2,
            main_rfid_tag: "MAIN-A".into(),
            expected_child_tags: tags(&["T2"]),
        })
        .await;

    assert!(result.is_err(), "duplicate main tag must be rejected");
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn duplicate_pump_number_within_station_is_rejected() {
    let (repo, station_id) = setup().await;

    repo.create(CreatePump {
        station_id,
        pump_number: 3,
        main_rfid_tag: "MAIN-A".into(),
        expected_child_tags: tags(&["T1"]),
    })
    .await
    .unwrap();

    let result = repo
        .create(CreatePump {
            station_id,
            pump_number: 3,
            main_rfid_tag: "MAIN-B".into(),
            expected_child_tags: tags(&["T2"]),
        })
        .await;

    assert!(result.is_err());
    assert_eq!(repo.count_by_station(station_id).await.unwrap(), 1);
}

#[tokio::test]
async fn lookup_by_main_tag_and_by_station_number() {
    let (repo, station_id) = setup().await;

    let pump = repo
        .create(CreatePump {
            station_id,
            pump_number: 7,
            main_rfid_tag: "MAIN-7".into(),
            expected_child_tags: tags(&["T1"]),
        })
        .await
        .unwrap();

    let by_tag = repo.get_by_main_tag("MAIN-7").await.unwrap();
    assert_eq!(by_tag.id, pump.id);

    let by_number = repo
        .get_by_station_and_number(station_id, 7)
        .await
        .unwrap();
    assert_eq!(by_number.id, pump.id);

    assert!(repo.get_by_main_tag("MISSING").await.is_err());
}

#[tokio::test]
async fn replacing_expected_tags_deactivates_old_rows() {
    let (repo, station_id) = setup().await;

    let pump = repo
        .create(CreatePump {
            station_id,
            pump_number: 1,
            main_rfid_tag: "MAIN-A".into(),
            expected_child_tags: tags(&["T1", "T2"]),
        })
        .await
        .unwrap();

    repo.update(
        pump.id,
        UpdatePump {
            expected_child_tags: Some(tags(&["T2", "T3"])),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let active = repo.active_expected_tags(pump.id).await.unwrap();
    let ids: Vec<&str> = active.iter().map(|tag| tag.tag_id.as_str()).collect();
    assert_eq!(ids, vec!["T2", "T3"]);
    assert_eq!(repo.count_active_expected_tags(pump.id).await.unwrap(), 2);
}

#[tokio::test]
async fn set_status_is_idempotent() {
    let (repo, station_id) = setup().await;

    let pump = repo
        .create(CreatePump {
            station_id,
            pump_number: 1,
            main_rfid_tag: "MAIN-A".into(),
            expected_child_tags: tags(&["T1"]),
        })
        .await
        .unwrap();

    repo.set_status(pump.id, PumpStatus::Broken).await.unwrap();
    repo.set_status(pump.id, PumpStatus::Broken).await.unwrap();

    assert_eq!(
        repo.get_by_id(pump.id).await.unwrap().status,
        PumpStatus::Broken
    );
}

#[tokio::test]
async fn delete_removes_pump_and_its_tags() {
    let (repo, station_id) = setup().await;

    let pump = repo
        .create(CreatePump {
            station_id,
            pump_number: 1,
            main_rfid_tag: "MAIN-A".into(),
            expected_child_tags: tags(&["T1", "T2"]),
        })
        .await
        .unwrap();

    repo.delete(pump.id).await.unwrap();

    assert!(repo.get_by_id(pump.id).await.is_err());
    assert_eq!(repo.count_active_expected_tags(pump.id).await.unwrap(), 0);
}

#[tokio::test]
async fn list_by_station_orders_by_pump_number() {
    let (repo, station_id) = setup().await;

    for (number, tag) in [(3, "M3"), (1, "M1"), (2, "M2")] {
        repo.create(CreatePump {
            station_id,
            pump_number: number,
            main_rfid_tag: tag.into(),
            expected_child_tags: tags(&["T"]),
        })
        .await
        .unwrap();
    }

    let pumps = repo.list_by_station(station_id).await.unwrap();
    let numbers: Vec<u32> = pumps.iter().map(|pump| pump.pump_number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}
