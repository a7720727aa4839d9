use common::OrderId;
use thiserror::Error;

use crate::status::OrderStatus;

/// Errors that can occur when interacting with the order ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order already exists.
    #[error("Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// Finish was requested before payment was confirmed.
    #[error("Order {0} is not paid yet")]
    NotPaid(OrderId),

    /// Finish was requested outside the Processing status.
    #[error("Order {order_id} is not processing yet (status {status})")]
    NotProcessing {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row violates the ledger's invariants.
    #[error("Corrupt order row: {message}")]
    Corrupt { message: String },
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
