//! Integration tests for the Station repository implementation using
//! in-memory SurrealDB.

use sealguard_core::models::station::{CreateStation, StationStatus, UpdateStation};
use sealguard_core::repository::{Pagination, StationFilter, StationRepository};
use sealguard_db::repository::SurrealStationRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    sealguard_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn create_and_get_station() {
    let db = setup().await;
    let repo = SurrealStationRepository::new(db);

    let station = repo
        .create(CreateStation {
            name: "East Station".into(),
            location: "Harbor Road 4".into(),
        })
        .await
        .unwrap();

    assert_eq!(station.name, "East Station");
    assert_eq!(station.status, StationStatus::Active);
    assert!(station.last_modified_by.is_none());

    let fetched = repo.get_by_id(station.id).await.unwrap();
    assert_eq!(fetched.id, station.id);
    assert_eq!(fetched.location, "Harbor Road 4");
}

#[tokio::test]
async fn update_station_records_modifier() {
    let db = setup().await;
    let repo = SurrealStationRepository::new(db);
    let admin = Uuid::new_v4();

    let station = repo
        .create(CreateStation {
            name: "Before".into(),
            location: "Somewhere".into(),
        })
        .await
        .unwrap();

    let updated = repo
        .update(
            station.id,
            UpdateStation {
                name: Some("After".into()),
                status: Some(StationStatus::Maintenance),
                last_modified_by: Some(admin),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "After");
    assert_eq!(updated.location, "Somewhere"); // unchanged
    assert_eq!(updated.status, StationStatus::Maintenance);
    assert_eq!(updated.last_modified_by, Some(admin));
    assert!(updated.updated_at >= station.updated_at);
}

#[tokio::test]
async fn delete_station() {
    let db = setup().await;
    let repo = SurrealStationRepository::new(db);

    let station = repo
        .create(CreateStation {
            name: "To Delete".into(),
            location: "Nowhere".into(),
        })
        .await
        .unwrap();

    repo.delete(station.id).await.unwrap();

    let result = repo.get_by_id(station.id).await;
    assert!(result.is_err(), "should not find deleted station");
}

#[tokio::test]
async fn list_stations_with_pagination() {
    let db = setup().await;
    let repo = SurrealStationRepository::new(db);

    for i in 0..5 {
        repo.create(CreateStation {
            name: format!("Station {i}"),
            location: format!("Street {i}"),
        })
        .await
        .unwrap();
    }

    let page = repo
        .list(
            &StationFilter::default(),
            Pagination {
                offset: 0,
                limit: 3,
            },
        )
        .await
        .unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 3);

    let rest = repo
        .list(
            &StationFilter::default(),
            Pagination {
                offset: 3,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 2);
}

#[tokio::test]
async fn list_filters_by_status_and_search() {
    let db = setup().await;
    let repo = SurrealStationRepository::new(db);

    let a = repo
        .create(CreateStation {
            name: "Harbor North".into(),
            location: "Pier 1".into(),
        })
        .await
        .unwrap();
    repo.create(CreateStation {
        name: "City Center".into(),
        location: "Main Square".into(),
    })
    .await
    .unwrap();

    repo.update(
        a.id,
        UpdateStation {
            status: Some(StationStatus::Inactive),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let inactive = repo
        .list(
            &StationFilter {
                status: Some(StationStatus::Inactive),
                search: None,
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(inactive.total, 1);
    assert_eq!(inactive.items[0].id, a.id);

    // Search is case-insensitive over name and location.
    let harbor = repo
        .list(
            &StationFilter {
                status: None,
                search: Some("HARBOR".into()),
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(harbor.total, 1);
    assert_eq!(harbor.items[0].id, a.id);
}

#[tokio::test]
async fn counts_by_status() {
    let db = setup().await;
    let repo = SurrealStationRepository::new(db);

    for _ in 0..3 {
        repo.create(CreateStation {
            name: "S".into(),
            location: "L".into(),
        })
        .await
        .unwrap();
    }

    assert_eq!(repo.count().await.unwrap(), 3);
    assert_eq!(
        repo.count_by_status(StationStatus::Active).await.unwrap(),
        3
    );
    assert_eq!(
        repo.count_by_status(StationStatus::Maintenance)
            .await
            .unwrap(),
        0
    );
}
