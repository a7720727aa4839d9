use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId};
use tokio::sync::RwLock;

use crate::{
    LedgerError, Result,
    order::{Order, OrderItem, OrderSummary, PaymentHandle},
    status::{OrderStatus, StatusFilter},
    store::{OrderStore, PaymentApplication},
};

#[derive(Debug, Default)]
struct LedgerState {
    orders: HashMap<OrderId, Order>,
    items: HashMap<OrderId, Vec<OrderItem>>,
}

/// In-memory order store.
///
/// Provides the same interface and transition semantics as the PostgreSQL
/// implementation; a single write lock per operation stands in for the
/// database's transactional guarantees.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<()> {
        let mut state = self.state.write().await;
        if state.orders.contains_key(&order.id) {
            return Err(LedgerError::DuplicateOrder(order.id));
        }
        state.orders.insert(order.id, order.clone());
        state.items.insert(order.id, items.to_vec());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn items_for_order(&self, id: OrderId) -> Result<Vec<OrderItem>> {
        Ok(self
            .state
            .read()
            .await
            .items
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn attach_payment(&self, id: OrderId, handle: PaymentHandle) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(LedgerError::OrderNotFound(id))?;
        order.payment = Some(handle);
        Ok(())
    }

    async fn apply_payment(
        &self,
        id: OrderId,
        paid_at: DateTime<Utc>,
    ) -> Result<PaymentApplication> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(LedgerError::OrderNotFound(id))?;

        if !order.status.can_apply_payment() {
            return Ok(PaymentApplication::AlreadyPaid);
        }

        order.paid_at = Some(paid_at);
        order.status = OrderStatus::Processing;
        Ok(PaymentApplication::Applied)
    }

    async fn finish_order(&self, id: OrderId) -> Result<()> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(LedgerError::OrderNotFound(id))?;

        if order.paid_at.is_none() {
            return Err(LedgerError::NotPaid(id));
        }
        if !order.status.can_finish() {
            return Err(LedgerError::NotProcessing {
                order_id: id,
                status: order.status,
            });
        }

        order.status = OrderStatus::Done;
        Ok(())
    }

    async fn list_orders(&self, filter: StatusFilter) -> Result<Vec<OrderSummary>> {
        let state = self.state.read().await;
        let mut summaries: Vec<(DateTime<Utc>, OrderSummary)> = state
            .orders
            .values()
            .filter(|o| filter.matches(o.status))
            .map(|o| {
                let item_count = state.items.get(&o.id).map_or(0, Vec::len) as u32;
                (
                    o.created_at,
                    OrderSummary {
                        id: o.id,
                        grand_total: o.grand_total,
                        status: o.status,
                        paid_at: o.paid_at,
                        item_count,
                    },
                )
            })
            .collect();
        summaries.sort_by_key(|(created_at, _)| *created_at);
        Ok(summaries.into_iter().map(|(_, s)| s).collect())
    }

    async fn paid_revenue(&self) -> Result<Money> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|o| o.paid_at.is_some())
            .map(|o| o.grand_total)
            .sum())
    }

    async fn count_ongoing(&self) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|o| o.status != OrderStatus::Done)
            .count() as u64)
    }

    async fn count_completed(&self) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .orders
            .values()
            .filter(|o| o.status == OrderStatus::Done)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_with_totals(subtotal: i64, tax: i64) -> Order {
        Order::new(
            OrderId::new(),
            Money::from_minor(subtotal),
            Money::from_minor(tax),
        )
    }

    fn items_for(order: &Order, count: usize) -> Vec<OrderItem> {
        (0..count)
            .map(|i| {
                OrderItem::new(
                    order.id,
                    format!("prod-{i:04}"),
                    1,
                    Money::from_minor(1_000),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn insert_and_get_order_with_items() {
        let store = InMemoryOrderStore::new();
        let order = order_with_totals(2_000, 200);
        let items = items_for(&order, 2);

        store.insert_order(&order, &items).await.unwrap();

        let loaded = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(loaded, order);
        assert_eq!(store.items_for_order(order.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_insert_fails() {
        let store = InMemoryOrderStore::new();
        let order = order_with_totals(2_000, 200);
        store.insert_order(&order, &[]).await.unwrap();

        let result = store.insert_order(&order, &[]).await;
        assert!(matches!(result, Err(LedgerError::DuplicateOrder(_))));
    }

    #[tokio::test]
    async fn attach_payment_records_handle() {
        let store = InMemoryOrderStore::new();
        let order = order_with_totals(2_000, 200);
        store.insert_order(&order, &[]).await.unwrap();

        store
            .attach_payment(
                order.id,
                PaymentHandle {
                    external_transaction_id: "pr-0001".to_string(),
                    payment_method_id: "pm-0001".to_string(),
                },
            )
            .await
            .unwrap();

        let loaded = store.get_order(order.id).await.unwrap().unwrap();
        let handle = loaded.payment.unwrap();
        assert_eq!(handle.external_transaction_id, "pr-0001");
        assert!(loaded.paid_at.is_none());
    }

    #[tokio::test]
    async fn apply_payment_transitions_once() {
        let store = InMemoryOrderStore::new();
        let order = order_with_totals(2_000, 200);
        store.insert_order(&order, &[]).await.unwrap();

        let first_paid_at = Utc::now();
        let outcome = store.apply_payment(order.id, first_paid_at).await.unwrap();
        assert_eq!(outcome, PaymentApplication::Applied);

        // Duplicate delivery: acknowledged, nothing changes.
        let outcome = store.apply_payment(order.id, Utc::now()).await.unwrap();
        assert_eq!(outcome, PaymentApplication::AlreadyPaid);

        let loaded = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Processing);
        assert_eq!(loaded.paid_at, Some(first_paid_at));
    }

    #[tokio::test]
    async fn apply_payment_to_missing_order_fails() {
        let store = InMemoryOrderStore::new();
        let result = store.apply_payment(OrderId::new(), Utc::now()).await;
        assert!(matches!(result, Err(LedgerError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn finish_requires_payment_and_processing() {
        let store = InMemoryOrderStore::new();
        let order = order_with_totals(2_000, 200);
        store.insert_order(&order, &[]).await.unwrap();

        // Unpaid: refused.
        let result = store.finish_order(order.id).await;
        assert!(matches!(result, Err(LedgerError::NotPaid(_))));

        // Paid + processing: allowed.
        store.apply_payment(order.id, Utc::now()).await.unwrap();
        store.finish_order(order.id).await.unwrap();

        let loaded = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Done);

        // Done is terminal: a second finish is refused.
        let result = store.finish_order(order.id).await;
        assert!(matches!(
            result,
            Err(LedgerError::NotProcessing {
                status: OrderStatus::Done,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn finish_missing_order_fails() {
        let store = InMemoryOrderStore::new();
        let result = store.finish_order(OrderId::new()).await;
        assert!(matches!(result, Err(LedgerError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn list_orders_filters_by_status() {
        let store = InMemoryOrderStore::new();

        let awaiting = order_with_totals(1_000, 100);
        store
            .insert_order(&awaiting, &items_for(&awaiting, 1))
            .await
            .unwrap();

        let processing = order_with_totals(2_000, 200);
        store
            .insert_order(&processing, &items_for(&processing, 2))
            .await
            .unwrap();
        store.apply_payment(processing.id, Utc::now()).await.unwrap();

        let all = store.list_orders(StatusFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = store.list_orders(StatusFilter::Processing).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, processing.id);
        assert_eq!(filtered[0].item_count, 2);
        assert!(filtered[0].paid_at.is_some());
    }

    #[tokio::test]
    async fn report_queries_partition_orders() {
        let store = InMemoryOrderStore::new();

        // Paid, processing, grand total 100.
        let paid = Order::new(OrderId::new(), Money::from_minor(100), Money::zero());
        store.insert_order(&paid, &[]).await.unwrap();
        store.apply_payment(paid.id, Utc::now()).await.unwrap();

        // Unpaid, awaiting payment.
        let unpaid = Order::new(OrderId::new(), Money::from_minor(999), Money::zero());
        store.insert_order(&unpaid, &[]).await.unwrap();

        // Paid and completed, grand total 50.
        let done = Order::new(OrderId::new(), Money::from_minor(50), Money::zero());
        store.insert_order(&done, &[]).await.unwrap();
        store.apply_payment(done.id, Utc::now()).await.unwrap();
        store.finish_order(done.id).await.unwrap();

        assert_eq!(store.paid_revenue().await.unwrap().minor(), 150);
        assert_eq!(store.count_ongoing().await.unwrap(), 2);
        assert_eq!(store.count_completed().await.unwrap(), 1);
    }
}
