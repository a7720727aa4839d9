//! Order status state machine.

use serde::{Deserialize, Serialize};

/// The status of an order in its lifecycle.
///
/// Transitions:
/// ```text
/// AwaitingPayment ──(webhook: payment succeeded)──► Processing ──(finish)──► Done
/// ```
/// A failed-payment webhook is acknowledged without a transition, and no
/// transition leaves `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order created, payment request outstanding.
    #[default]
    AwaitingPayment,

    /// Payment confirmed, goods being prepared.
    Processing,

    /// Goods handed over (terminal state).
    Done,
}

impl OrderStatus {
    /// Returns true if a confirmed payment may be applied in this status.
    pub fn can_apply_payment(&self) -> bool {
        matches!(self, OrderStatus::AwaitingPayment)
    }

    /// Returns true if the order can be finished in this status.
    pub fn can_finish(&self) -> bool {
        matches!(self, OrderStatus::Processing)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Done)
    }

    /// Returns the wire/storage literal for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingPayment => "AWAITING_PAYMENT",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Done => "DONE",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AWAITING_PAYMENT" => Ok(OrderStatus::AwaitingPayment),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "DONE" => Ok(OrderStatus::Done),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// A status literal outside the three the ledger understands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownStatus(pub String);

/// Listing filter over order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusFilter {
    #[default]
    All,
    AwaitingPayment,
    Processing,
    Done,
}

impl StatusFilter {
    /// Returns the concrete status this filter selects, if any.
    pub fn status(&self) -> Option<OrderStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::AwaitingPayment => Some(OrderStatus::AwaitingPayment),
            StatusFilter::Processing => Some(OrderStatus::Processing),
            StatusFilter::Done => Some(OrderStatus::Done),
        }
    }

    /// Returns true if an order with `status` passes this filter.
    pub fn matches(&self, status: OrderStatus) -> bool {
        self.status().is_none_or(|s| s == status)
    }
}
