mod util;

use autovault::commands::{
    self, AttachmentInput, NewDocument, NewExpense, NewFine, NewMedia, NewReminder, NewVehicle,
};
use autovault::remote::LocalBlobStore;
use autovault::store::{Filter, SortOrder, VEHICLE_CHILD_TABLES};
use autovault::Store;

async fn populated_vehicle(store: &Store, owner: &str, blob: &LocalBlobStore) -> String {
    let vehicle = commands::add_vehicle(
        store,
        owner,
        NewVehicle {
            make: "Nissan".into(),
            model: "Patrol".into(),
            year: 2018,
            ..NewVehicle::default()
        },
    )
    .await
    .unwrap();

    commands::add_expense(
        store,
        blob,
        owner,
        NewExpense {
            vehicle_id: vehicle.id.clone(),
            amount: 200.0,
            amount_secondary: None,
            date: "2024-01-05".into(),
            category: "BODY_WORKS".into(),
            description: "dent repair".into(),
        },
        vec![AttachmentInput {
            filename: "invoice.pdf".into(),
            bytes: b"pdf".to_vec(),
        }],
    )
    .await
    .unwrap();

    commands::add_media(
        store,
        blob,
        owner,
        NewMedia {
            vehicle_id: vehicle.id.clone(),
            kind: "image".into(),
            title: "front".into(),
            description: None,
        },
        AttachmentInput {
            filename: "front.jpg".into(),
            bytes: b"jpg".to_vec(),
        },
    )
    .await
    .unwrap();

    commands::add_document(
        store,
        blob,
        owner,
        NewDocument {
            vehicle_id: vehicle.id.clone(),
            expense_id: None,
            title: "registration".into(),
            kind: "registration".into(),
        },
        AttachmentInput {
            filename: "reg.pdf".into(),
            bytes: b"pdf".to_vec(),
        },
    )
    .await
    .unwrap();

    commands::add_reminder(
        store,
        owner,
        NewReminder {
            vehicle_id: vehicle.id.clone(),
            title: "service".into(),
            description: None,
            date: "2024-06-01".into(),
        },
    )
    .await
    .unwrap();

    commands::add_fine(
        store,
        owner,
        NewFine {
            vehicle_id: vehicle.id.clone(),
            amount: 60.0,
            date: "2024-02-14".into(),
            description: "parking".into(),
        },
    )
    .await
    .unwrap();

    vehicle.id
}

#[tokio::test]
async fn deleting_a_vehicle_removes_every_dependent_row() {
    let pool = util::memory_pool().await;
    let owner = util::seed_user(&pool, "owner@example.com", "user").await;
    let store = Store::new(pool);
    let dir = tempfile::tempdir().unwrap();
    let blob = LocalBlobStore::new(dir.path());

    let vehicle_id = populated_vehicle(&store, &owner, &blob).await;

    // 1 expense + 2 documents + 1 media + 1 reminder + 1 fine + the vehicle.
    let outcome = commands::delete_vehicle(&store, &owner, &vehicle_id)
        .await
        .unwrap();
    assert_eq!(outcome.total_deleted, 7);

    for table in VEHICLE_CHILD_TABLES {
        let rows = store
            .query(table, Some(&owner), &Filter::default(), SortOrder::KeyAsc)
            .await
            .unwrap();
        assert!(rows.is_empty(), "{table} still has rows");
    }
    let vehicles = store
        .query("vehicles", Some(&owner), &Filter::default(), SortOrder::KeyAsc)
        .await
        .unwrap();
    assert!(vehicles.is_empty());
}

#[tokio::test]
async fn cascade_leaves_other_vehicles_untouched() {
    let pool = util::memory_pool().await;
    let owner = util::seed_user(&pool, "owner@example.com", "user").await;
    let store = Store::new(pool);
    let dir = tempfile::tempdir().unwrap();
    let blob = LocalBlobStore::new(dir.path());

    let doomed = populated_vehicle(&store, &owner, &blob).await;
    let kept = populated_vehicle(&store, &owner, &blob).await;

    commands::delete_vehicle(&store, &owner, &doomed).await.unwrap();

    let expenses = commands::list_expenses(
        store.pool(),
        &owner,
        &Filter::vehicle(kept.clone()),
        SortOrder::KeyAsc,
    )
    .await
    .unwrap();
    assert_eq!(expenses.len(), 1);
    let reminders = commands::list_reminders(
        store.pool(),
        &owner,
        &Filter::vehicle(kept),
        SortOrder::KeyAsc,
    )
    .await
    .unwrap();
    assert_eq!(reminders.len(), 1);
}

#[tokio::test]
async fn deleting_a_missing_vehicle_reports_not_found() {
    let pool = util::memory_pool().await;
    let owner = util::seed_user(&pool, "owner@example.com", "user").await;
    let store = Store::new(pool);
    let err = commands::delete_vehicle(&store, &owner, "no-such-id")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND/VEHICLE");
}

#[tokio::test]
async fn admin_deletes_user_and_everything_they_own() {
    let pool = util::memory_pool().await;
    let admin = util::seed_user(&pool, "admin@example.com", "admin").await;
    let owner = util::seed_user(&pool, "owner@example.com", "user").await;
    let store = Store::new(pool);
    let dir = tempfile::tempdir().unwrap();
    let blob = LocalBlobStore::new(dir.path());

    populated_vehicle(&store, &owner, &blob).await;
    commands::submit_feedback(&store, &owner, "great app").await.unwrap();

    let outcome = commands::delete_user(&store, &admin, &owner).await.unwrap();
    // 6 child rows + 1 feedback + 1 vehicle + the user row.
    assert_eq!(outcome.total_deleted, 9);

    assert!(commands::get_user(store.pool(), &owner).await.unwrap().is_none());
    let vehicles = store
        .query("vehicles", Some(&owner), &Filter::default(), SortOrder::KeyAsc)
        .await
        .unwrap();
    assert!(vehicles.is_empty());
}

#[tokio::test]
async fn non_admin_cannot_delete_users() {
    let pool = util::memory_pool().await;
    let owner = util::seed_user(&pool, "owner@example.com", "user").await;
    let other = util::seed_user(&pool, "other@example.com", "user").await;
    let store = Store::new(pool);

    let err = commands::delete_user(&store, &owner, &other).await.unwrap_err();
    assert_eq!(err.code(), "AUTH/FORBIDDEN");
    assert!(commands::get_user(store.pool(), &other).await.unwrap().is_some());
}
