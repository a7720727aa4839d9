//! PostgreSQL integration tests.
//!
//! These tests start a PostgreSQL container via Docker and are ignored by
//! default. Run with:
//!
//! ```bash
//! cargo test -p ledger --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use chrono::Utc;
use common::{Money, OrderId};
use ledger::{
    InMemoryOrderStore, LedgerError, Order, OrderItem, OrderStore, PaymentApplication,
    PaymentHandle, PostgresOrderStore, StatusFilter,
};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(include_str!("../../../migrations/001_create_orders.sql"))
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

async fn store() -> PostgresOrderStore {
    let info = get_container_info().await;
    let pool = PgPool::connect(&info.connection_string).await.unwrap();
    PostgresOrderStore::new(pool)
}

fn order(subtotal: i64, tax: i64) -> Order {
    Order::new(
        OrderId::new(),
        Money::from_minor(subtotal),
        Money::from_minor(tax),
    )
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn insert_and_load_order_roundtrip() {
    let store = store().await;
    let created = order(2_000, 200);
    let items = vec![
        OrderItem::new(created.id, "prod-0001", 2, Money::from_minor(1_000)),
        OrderItem::new(created.id, "prod-0002", 1, Money::from_minor(500)),
    ];

    store.insert_order(&created, &items).await.unwrap();

    let loaded = store.get_order(created.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, created.id);
    assert_eq!(loaded.grand_total.minor(), 2_200);
    assert!(loaded.payment.is_none());

    let loaded_items = store.items_for_order(created.id).await.unwrap();
    assert_eq!(loaded_items.len(), 2);
    assert_eq!(loaded_items[0].quantity, 2);
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn duplicate_insert_maps_unique_violation() {
    let store = store().await;
    let created = order(1_000, 100);
    store.insert_order(&created, &[]).await.unwrap();

    let result = store.insert_order(&created, &[]).await;
    assert!(matches!(result, Err(LedgerError::DuplicateOrder(_))));
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn conditional_paid_transition_applies_once() {
    let store = store().await;
    let created = order(2_000, 200);
    store.insert_order(&created, &[]).await.unwrap();
    store
        .attach_payment(
            created.id,
            PaymentHandle {
                external_transaction_id: "pr-0001".to_string(),
                payment_method_id: "pm-0001".to_string(),
            },
        )
        .await
        .unwrap();

    let first = store.apply_payment(created.id, Utc::now()).await.unwrap();
    assert_eq!(first, PaymentApplication::Applied);

    let loaded = store.get_order(created.id).await.unwrap().unwrap();
    let first_paid_at = loaded.paid_at.unwrap();

    // Duplicate delivery loses the conditional update.
    let second = store.apply_payment(created.id, Utc::now()).await.unwrap();
    assert_eq!(second, PaymentApplication::AlreadyPaid);

    let loaded = store.get_order(created.id).await.unwrap().unwrap();
    assert_eq!(loaded.paid_at, Some(first_paid_at));
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn finish_order_enforces_preconditions() {
    let store = store().await;
    let created = order(2_000, 200);
    store.insert_order(&created, &[]).await.unwrap();

    let result = store.finish_order(created.id).await;
    assert!(matches!(result, Err(LedgerError::NotPaid(_))));

    store.apply_payment(created.id, Utc::now()).await.unwrap();
    store.finish_order(created.id).await.unwrap();

    let result = store.finish_order(created.id).await;
    assert!(matches!(result, Err(LedgerError::NotProcessing { .. })));
}

#[tokio::test]
#[serial]
#[ignore = "requires Docker"]
async fn listing_and_report_queries_match_memory_semantics() {
    // Same fixture against both stores; they must agree. The Postgres
    // database is shared across tests, so assertions are deltas against a
    // baseline taken first.
    let pg = store().await;
    let memory = InMemoryOrderStore::new();

    for s in [&pg as &dyn OrderStore, &memory as &dyn OrderStore] {
        let base_revenue = s.paid_revenue().await.unwrap().minor();
        let base_completed = s.count_completed().await.unwrap();
        let base_ongoing = s.count_ongoing().await.unwrap();

        let paid = order(100, 0);
        s.insert_order(&paid, &[]).await.unwrap();
        s.apply_payment(paid.id, Utc::now()).await.unwrap();

        let unpaid = order(999, 0);
        s.insert_order(&unpaid, &[]).await.unwrap();

        let done = order(50, 0);
        s.insert_order(&done, &[]).await.unwrap();
        s.apply_payment(done.id, Utc::now()).await.unwrap();
        s.finish_order(done.id).await.unwrap();

        assert_eq!(s.paid_revenue().await.unwrap().minor() - base_revenue, 150);
        assert_eq!(s.count_completed().await.unwrap() - base_completed, 1);
        assert_eq!(s.count_ongoing().await.unwrap() - base_ongoing, 2);

        let done_only = s.list_orders(StatusFilter::Done).await.unwrap();
        assert!(done_only.iter().any(|o| o.id == done.id));
    }
}
