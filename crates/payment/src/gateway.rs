use async_trait::async_trait;
use common::{Money, OrderId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A gateway-issued payment request with its QR payload.
///
/// The payer fulfills the request out-of-band by scanning the QR code; the
/// gateway later reports the outcome through the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Gateway id for the payment request (the external transaction id).
    pub id: String,
    /// Gateway id for the payment method backing the request.
    pub payment_method_id: String,
    /// QR payload string to present to the payer.
    pub qr_string: String,
}

/// Status of a payment request as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentRequestStatus {
    Pending,
    RequiresAction,
    Succeeded,
    Failed,
    Expired,
    /// Any status literal this integration does not recognize.
    #[serde(other)]
    Unknown,
}

/// Errors surfaced by gateway adapters.
///
/// Transport and provider failures are transient from the caller's point of
/// view; the caller decides whether to retry.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The HTTP call to the provider failed (connect, timeout, non-2xx).
    #[error("Gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a payload this integration cannot use.
    #[error("Gateway returned an unusable response: {message}")]
    MalformedResponse { message: String },

    /// The referenced payment request is not known to the gateway.
    #[error("Unknown payment request: {0}")]
    UnknownPaymentRequest(String),

    /// The referenced payment method is not known to the gateway.
    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    /// The gateway refused the operation.
    #[error("Gateway declined: {message}")]
    Declined { message: String },
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Operations the order core needs from a payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a QR payment request for `amount`, tagged with the order id
    /// so the webhook can be reconciled back to the order.
    async fn create_payment_request(
        &self,
        amount: Money,
        order_id: OrderId,
    ) -> Result<PaymentRequest>;

    /// Polls the current status of a payment request.
    async fn get_payment_request_status(&self, request_id: &str) -> Result<PaymentRequestStatus>;

    /// Asks the gateway to simulate a successful payment against a payment
    /// method. Test/demo hook; real providers expose this only in sandbox
    /// environments.
    async fn simulate_payment(&self, payment_method_id: &str, amount: Money) -> Result<()>;
}
