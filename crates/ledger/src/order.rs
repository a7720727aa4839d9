//! Order and order item records.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId};
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// Gateway identifiers recorded once a payment request exists for an order.
///
/// Kept separate from `paid_at`: an order can have an outstanding payment
/// request without being paid, and the two conditions are checked
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHandle {
    /// Payment request id issued by the gateway.
    pub external_transaction_id: String,
    /// Payment method id backing the request.
    pub payment_method_id: String,
}

/// A customer order with snapshot totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub subtotal: Money,
    pub tax: Money,
    pub grand_total: Money,
    pub status: OrderStatus,
    /// Set exactly once, when the payment is confirmed.
    pub paid_at: Option<DateTime<Utc>>,
    /// Present iff a gateway payment request was created.
    pub payment: Option<PaymentHandle>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order awaiting payment.
    ///
    /// The grand total is derived from subtotal and tax so the
    /// `grand_total = subtotal + tax` invariant holds by construction.
    pub fn new(id: OrderId, subtotal: Money, tax: Money) -> Self {
        Self {
            id,
            subtotal,
            tax,
            grand_total: subtotal + tax,
            status: OrderStatus::AwaitingPayment,
            paid_at: None,
            payment: None,
            created_at: Utc::now(),
        }
    }

    /// Returns true if the payment has been confirmed.
    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }
}

/// A line item belonging to exactly one order.
///
/// `unit_price` is a snapshot of the product price at order time; later
/// catalog changes do not affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Money,
}

impl OrderItem {
    /// Creates a new order item.
    pub fn new(
        order_id: OrderId,
        product_id: impl Into<ProductId>,
        quantity: u32,
        unit_price: Money,
    ) -> Self {
        Self {
            order_id,
            product_id: product_id.into(),
            quantity,
            unit_price,
        }
    }

    /// Returns the total price for this line (quantity × unit price).
    pub fn total_price(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }
}

/// Listing row for the dashboard order table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub grand_total: Money,
    pub status: OrderStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub item_count: u32,
}
