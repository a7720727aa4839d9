//! Order lifecycle core.
//!
//! This crate owns the two pieces of the system with real ordering
//! semantics:
//!
//! - [`OrderService`] creates orders with snapshot totals, requests a QR
//!   payment from the gateway, and drives the `PROCESSING → DONE`
//!   completion step.
//! - [`WebhookReconciler`] applies asynchronous payment notifications to
//!   the ledger exactly once, no matter how often the gateway retries.

mod engine;
mod error;
mod reconciler;

pub use engine::{CreatedOrder, OrderItemRequest, OrderService, SalesReport};
pub use error::OrderError;
pub use reconciler::{ReconcileOutcome, WebhookReconciler};
