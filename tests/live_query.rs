mod util;

use autovault::commands::{self, NewVehicle};
use autovault::{QuerySpec, Store};

fn patrol(year: i64) -> NewVehicle {
    NewVehicle {
        make: "Nissan".into(),
        model: "Patrol".into(),
        year,
        ..NewVehicle::default()
    }
}

#[tokio::test]
async fn subscription_delivers_initial_snapshot() {
    let pool = util::memory_pool().await;
    let owner = util::seed_user(&pool, "owner@example.com", "user").await;
    let store = Store::new(pool);
    commands::add_vehicle(&store, &owner, patrol(2018)).await.unwrap();

    let mut sub = store.subscribe(QuerySpec::table("vehicles").owned_by(owner.as_str()));
    let snapshot = sub.next().await.unwrap().unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0]["model"], "Patrol");
}

#[tokio::test]
async fn writes_arrive_in_commit_order() {
    let pool = util::memory_pool().await;
    let owner = util::seed_user(&pool, "owner@example.com", "user").await;
    let store = Store::new(pool);

    let mut sub = store.subscribe(QuerySpec::table("vehicles").owned_by(owner.as_str()));
    assert!(sub.next().await.unwrap().unwrap().is_empty());

    commands::add_vehicle(&store, &owner, patrol(2016)).await.unwrap();
    commands::add_vehicle(&store, &owner, patrol(2017)).await.unwrap();

    let first = sub.next().await.unwrap().unwrap();
    let second = sub.next().await.unwrap().unwrap();
    // Snapshot sizes never go backwards.
    assert!(first.len() <= second.len());
    assert_eq!(second.len(), 2);
}

#[tokio::test]
async fn unsubscribe_stops_delivery_and_is_idempotent() {
    let pool = util::memory_pool().await;
    let owner = util::seed_user(&pool, "owner@example.com", "user").await;
    let store = Store::new(pool);

    let mut sub = store.subscribe(QuerySpec::table("vehicles").owned_by(owner.as_str()));
    assert!(sub.next().await.is_some());

    sub.unsubscribe();
    sub.unsubscribe();

    commands::add_vehicle(&store, &owner, patrol(2019)).await.unwrap();
    assert!(sub.next().await.is_none());
}

#[tokio::test]
async fn invalid_table_surfaces_a_query_error() {
    let pool = util::memory_pool().await;
    let store = Store::new(pool);

    let mut sub = store.subscribe(QuerySpec::table("sqlite_master"));
    let err = sub.next().await.unwrap().unwrap_err();
    assert_eq!(err.code(), "QUERY/EVAL");
    let cause = err.cause().expect("underlying store error");
    assert_eq!(cause.code(), "STORE/INVALID_TABLE");
}

#[tokio::test]
async fn scoped_subscription_only_sees_its_owner() {
    let pool = util::memory_pool().await;
    let alice = util::seed_user(&pool, "alice@example.com", "user").await;
    let bob = util::seed_user(&pool, "bob@example.com", "user").await;
    let store = Store::new(pool);

    let mut sub = store.subscribe(QuerySpec::table("vehicles").owned_by(alice.as_str()));
    assert!(sub.next().await.unwrap().unwrap().is_empty());

    commands::add_vehicle(&store, &bob, patrol(2015)).await.unwrap();
    // Bob's write still invalidates the table, but Alice's view stays empty.
    let snapshot = sub.next().await.unwrap().unwrap();
    assert!(snapshot.is_empty());
}
