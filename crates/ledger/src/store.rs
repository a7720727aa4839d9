use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId};

use crate::{
    Result,
    order::{Order, OrderItem, OrderSummary, PaymentHandle},
    status::StatusFilter,
};

/// Outcome of the conditional paid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentApplication {
    /// The payment was applied: `paid_at` set, status moved to Processing.
    Applied,
    /// The order was already paid; nothing changed.
    AlreadyPaid,
}

/// Persistence operations over orders and their line items.
///
/// Status transitions are conditional at this layer: `apply_payment` only
/// fires from `AWAITING_PAYMENT` and `finish_order` only from a paid
/// `PROCESSING` order, so concurrent callers cannot double-apply either
/// transition. All implementations must be thread-safe.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts an order together with its line items, atomically.
    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<()>;

    /// Loads an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Loads the line items of an order.
    async fn items_for_order(&self, id: OrderId) -> Result<Vec<OrderItem>>;

    /// Records the gateway identifiers issued for an order's payment
    /// request. Fails with `OrderNotFound` if the order does not exist.
    async fn attach_payment(&self, id: OrderId, handle: PaymentHandle) -> Result<()>;

    /// Applies a confirmed payment: sets `paid_at` and moves the order to
    /// Processing, but only when the current status is `AWAITING_PAYMENT`.
    ///
    /// Returns [`PaymentApplication::AlreadyPaid`], leaving `paid_at`
    /// untouched, when the order was paid before, which makes duplicate
    /// webhook deliveries harmless.
    async fn apply_payment(
        &self,
        id: OrderId,
        paid_at: DateTime<Utc>,
    ) -> Result<PaymentApplication>;

    /// Moves a paid Processing order to Done.
    ///
    /// Fails with `OrderNotFound`, `NotPaid`, or `NotProcessing` when the
    /// preconditions do not hold.
    async fn finish_order(&self, id: OrderId) -> Result<()>;

    /// Lists orders, optionally restricted to one status. No pagination;
    /// the dashboard operates at small scale.
    async fn list_orders(&self, filter: StatusFilter) -> Result<Vec<OrderSummary>>;

    /// Sum of `grand_total` over all paid orders.
    async fn paid_revenue(&self) -> Result<Money>;

    /// Number of orders not yet Done.
    async fn count_ongoing(&self) -> Result<u64>;

    /// Number of Done orders.
    async fn count_completed(&self) -> Result<u64>;
}
