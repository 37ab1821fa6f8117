use jikoni_core::db::InterruptGuard;
use jikoni_core::repo::classify::classify;
use jikoni_core::{
    open_store, open_store_in_memory, CallContext, CoreService, ErrorClass, ErrorKind,
    Operation, Order, OrderPlace, OrderRepository, OrderStatus, PageMetadata,
    ResourceRepository, ResourceService, StoreConfig,
};
use std::time::{Duration, Instant};

const LONG_QUERY: &str = "WITH RECURSIVE counter(x) AS (
    SELECT 1
    UNION ALL
    SELECT x + 1 FROM counter WHERE x < 100000000
)
SELECT COUNT(*) FROM counter;";

fn service() -> CoreService<Order, OrderRepository> {
    CoreService::new(OrderRepository::new(open_store_in_memory().unwrap()))
}

fn chai() -> Order {
    Order::new("chai", 50, OrderPlace::InHouse, OrderStatus::Paid)
}

#[test]
fn cancelled_context_stops_before_storage() {
    let svc = service();
    let ctx = CallContext::background();
    ctx.cancel();

    let err = svc.create(&ctx, "token", chai()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);

    let page = svc
        .list(&CallContext::background(), "token", &PageMetadata::default())
        .unwrap();
    assert_eq!(page.total, 0);
}

#[test]
fn cancelling_a_clone_cancels_the_call() {
    let svc = service();
    let ctx = CallContext::background();
    let handle = ctx.clone();
    handle.cancel();

    let err = svc.view(&ctx, "token", "any").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[test]
fn expired_deadline_is_cancelled() {
    let svc = service();
    let ctx = CallContext::with_deadline(Instant::now() - Duration::from_millis(1));

    for err in [
        svc.view(&ctx, "token", "any").unwrap_err(),
        svc.delete(&ctx, "token", "any").unwrap_err(),
        svc.list(&ctx, "token", &PageMetadata::default()).unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(err.detail(), Some("deadline exceeded"));
    }
}

#[test]
fn in_flight_statement_is_interrupted_at_deadline() {
    let store = open_store_in_memory().unwrap();
    let conn = store.connection().unwrap();
    let ctx = CallContext::with_timeout(Duration::from_millis(50));

    let started_at = Instant::now();
    let err = {
        let _guard = InterruptGuard::arm(&conn, &ctx);
        conn.query_row(LONG_QUERY, [], |row| row.get::<_, i64>(0))
            .unwrap_err()
    };
    assert!(started_at.elapsed() < Duration::from_secs(5));
    assert_eq!(classify(Operation::List, err).kind(), ErrorKind::Cancelled);

    let after: i64 = conn.query_row("SELECT 1;", [], |row| row.get(0)).unwrap();
    assert_eq!(after, 1);
}

#[test]
fn guard_is_removed_before_connection_is_reused() {
    let store = open_store_in_memory().unwrap();
    let conn = store.connection().unwrap();
    let ctx = CallContext::background();
    ctx.cancel();

    {
        let _guard = InterruptGuard::arm(&conn, &ctx);
        assert!(conn
            .query_row(LONG_QUERY, [], |row| row.get::<_, i64>(0))
            .is_err());
    }

    let counted: i64 = conn
        .query_row(
            "WITH RECURSIVE counter(x) AS (
                SELECT 1 UNION ALL SELECT x + 1 FROM counter WHERE x < 10000
            ) SELECT COUNT(*) FROM counter;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(counted, 10_000);
}

#[test]
fn pool_wait_is_bounded_by_deadline() {
    let store = open_store_in_memory().unwrap();
    let repo = OrderRepository::new(store.clone());
    let held = store.connection().unwrap();

    let started_at = Instant::now();
    let err = repo
        .retrieve_by_id(&CallContext::with_timeout(Duration::from_millis(50)), "any")
        .unwrap_err();
    assert!(started_at.elapsed() < Duration::from_secs(5));
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(err.detail(), Some("deadline exceeded"));
    drop(held);

    let err = repo
        .retrieve_by_id(&CallContext::background(), "any")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn pool_timeout_without_deadline_is_storage_failure() {
    let store = open_store(&StoreConfig {
        connection_timeout_ms: 50,
        ..StoreConfig::in_memory()
    })
    .unwrap();
    let repo = OrderRepository::new(store.clone());
    let _held = store.connection().unwrap();

    let err = repo
        .retrieve_by_id(&CallContext::background(), "any")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ViewFailed);
    assert_eq!(err.kind().class(), ErrorClass::Server);
}
