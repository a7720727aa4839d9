//! Webhook payload sent by the payment provider.
//!
//! Deliveries are asynchronous and may be duplicated; the reconciler is
//! responsible for applying them exactly once.

use common::Money;
use serde::{Deserialize, Serialize};

/// Outcome literal carried by a webhook notification.
///
/// The canonical success literal for this integration is `SUCCEEDED`.
/// Anything else the provider might send (including the misspelled
/// `SUCCESSED` an earlier revision of the provider emitted) is preserved in
/// [`NotificationStatus::Other`] and acknowledged without being applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationStatus {
    Succeeded,
    Failed,
    Other(String),
}

impl From<String> for NotificationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "SUCCEEDED" => NotificationStatus::Succeeded,
            "FAILED" => NotificationStatus::Failed,
            _ => NotificationStatus::Other(s),
        }
    }
}

impl From<NotificationStatus> for String {
    fn from(status: NotificationStatus) -> Self {
        match status {
            NotificationStatus::Succeeded => "SUCCEEDED".to_string(),
            NotificationStatus::Failed => "FAILED".to_string(),
            NotificationStatus::Other(s) => s,
        }
    }
}

/// Payment fields of a webhook notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookPaymentData {
    /// Gateway id of the payment itself.
    pub id: String,
    /// Amount the payer transferred, in minor units.
    pub amount: Money,
    /// The payment request this payment fulfills.
    pub payment_request_id: String,
    /// The order id the payment request was tagged with.
    pub reference_id: String,
    /// Outcome of the payment.
    pub status: NotificationStatus,
}

/// Envelope the provider POSTs to the webhook endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookNotification {
    /// Provider event name, e.g. `payment.succeeded`.
    pub event: String,
    pub data: WebhookPaymentData,
}
