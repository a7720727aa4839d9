//! Order core error taxonomy.

use common::{OrderId, ProductId};
use ledger::{LedgerError, OrderStatus};
use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order creation was called with no items.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// A requested quantity is below one.
    #[error("Invalid quantity {quantity} for product {product_id} (must be at least 1)")]
    InvalidQuantity {
        product_id: ProductId,
        quantity: u32,
    },

    /// One or more requested product ids do not exist in the catalog.
    #[error("Unknown products: {}", format_ids(.ids))]
    UnknownProducts { ids: Vec<ProductId> },

    /// The order does not exist.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// No order matches a webhook reference.
    #[error("No order matches reference {0:?}")]
    UnknownReference(String),

    /// The order has no gateway payment request attached.
    #[error("Order {0} has no payment request attached")]
    MissingPaymentRequest(OrderId),

    /// Completion was requested before payment was confirmed.
    #[error("Order {0} is not paid yet")]
    NotPaid(OrderId),

    /// Completion was requested outside the Processing status.
    #[error("Order {order_id} is not processing yet (status {status})")]
    NotProcessing {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// The gateway call timed out; the caller may retry.
    #[error("Payment gateway timed out")]
    GatewayTimeout,

    /// The gateway call failed; the caller may retry.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] payment::PaymentError),

    /// The catalog refused the request.
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    /// The ledger failed outside the mapped precondition errors.
    #[error("Ledger error: {0}")]
    Ledger(LedgerError),
}

impl From<LedgerError> for OrderError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::OrderNotFound(id) => OrderError::NotFound(id),
            LedgerError::NotPaid(id) => OrderError::NotPaid(id),
            LedgerError::NotProcessing { order_id, status } => {
                OrderError::NotProcessing { order_id, status }
            }
            other => OrderError::Ledger(other),
        }
    }
}

fn format_ids(ids: &[ProductId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_precondition_errors_map_to_domain_errors() {
        let id = OrderId::new();

        assert!(matches!(
            OrderError::from(LedgerError::OrderNotFound(id)),
            OrderError::NotFound(_)
        ));
        assert!(matches!(
            OrderError::from(LedgerError::NotPaid(id)),
            OrderError::NotPaid(_)
        ));
        assert!(matches!(
            OrderError::from(LedgerError::NotProcessing {
                order_id: id,
                status: OrderStatus::Done,
            }),
            OrderError::NotProcessing { .. }
        ));
    }

    #[test]
    fn unknown_products_lists_ids() {
        let err = OrderError::UnknownProducts {
            ids: vec![ProductId::new("prod-0001"), ProductId::new("prod-0002")],
        };
        assert_eq!(err.to_string(), "Unknown products: prod-0001, prod-0002");
    }
}
