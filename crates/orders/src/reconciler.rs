//! Webhook reconciliation.

use chrono::Utc;
use common::OrderId;
use ledger::{OrderStore, PaymentApplication};
use payment::{NotificationStatus, WebhookNotification};
use uuid::Uuid;

use crate::error::OrderError;

/// What a webhook delivery did to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// First delivery of a success notification: the order moved to
    /// Processing and `paid_at` was set.
    PaymentApplied,
    /// Duplicate delivery of a success notification: nothing changed.
    AlreadyPaid,
    /// A failure notification was acknowledged without mutating the order.
    FailureAcknowledged,
    /// The status literal was not recognized; acknowledged, no mutation.
    Ignored,
}

/// Applies payment notifications from the gateway to the order ledger.
///
/// Deliveries may arrive duplicated or concurrently; the ledger's
/// conditional paid transition guarantees the success path applies at most
/// once. Authentication of the delivery happens at the HTTP layer, so this
/// type only ever sees authenticated input.
pub struct WebhookReconciler<S> {
    store: S,
}

impl<S: OrderStore> WebhookReconciler<S> {
    /// Creates a new reconciler over the given ledger.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Applies one notification to the ledger.
    ///
    /// Returns `UnknownReference` when no order matches the notification's
    /// reference id; every other outcome on authenticated, well-formed
    /// input is a success so the gateway stops retrying.
    #[tracing::instrument(
        skip(self, notification),
        fields(reference_id = %notification.data.reference_id)
    )]
    pub async fn apply(
        &self,
        notification: &WebhookNotification,
    ) -> Result<ReconcileOutcome, OrderError> {
        let reference_id = notification.data.reference_id.as_str();
        let order_id = Uuid::parse_str(reference_id)
            .map(OrderId::from_uuid)
            .map_err(|_| OrderError::UnknownReference(reference_id.to_string()))?;

        if self.store.get_order(order_id).await?.is_none() {
            return Err(OrderError::UnknownReference(reference_id.to_string()));
        }

        match &notification.data.status {
            NotificationStatus::Succeeded => {
                match self.store.apply_payment(order_id, Utc::now()).await? {
                    PaymentApplication::Applied => {
                        metrics::counter!("payments_applied").increment(1);
                        tracing::info!(%order_id, amount = %notification.data.amount, "payment applied");
                        Ok(ReconcileOutcome::PaymentApplied)
                    }
                    PaymentApplication::AlreadyPaid => {
                        metrics::counter!("payments_duplicate").increment(1);
                        tracing::debug!(%order_id, "duplicate payment notification");
                        Ok(ReconcileOutcome::AlreadyPaid)
                    }
                }
            }
            NotificationStatus::Failed => {
                // TODO: surface failed payments on the dashboard once the
                // listing grows a failure column; until then the order stays
                // in AWAITING_PAYMENT and can be retried.
                tracing::info!(%order_id, "failed payment acknowledged");
                Ok(ReconcileOutcome::FailureAcknowledged)
            }
            NotificationStatus::Other(literal) => {
                metrics::counter!("webhook_ignored").increment(1);
                tracing::warn!(%order_id, %literal, "unrecognized notification status");
                Ok(ReconcileOutcome::Ignored)
            }
        }
    }
}
