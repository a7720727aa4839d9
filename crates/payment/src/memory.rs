use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{Money, OrderId};
use tokio::sync::RwLock;

use crate::gateway::{
    PaymentError, PaymentGateway, PaymentRequest, PaymentRequestStatus, Result,
};

#[derive(Debug)]
struct RequestRecord {
    order_id: OrderId,
    amount: Money,
    status: PaymentRequestStatus,
}

#[derive(Debug, Default)]
struct GatewayState {
    requests: HashMap<String, RequestRecord>,
    /// payment_method_id -> payment_request_id
    methods: HashMap<String, String>,
    simulated: Vec<(String, Money)>,
    next_id: u32,
    fail_on_create: bool,
}

/// In-memory payment gateway for tests and demos.
///
/// Ids are sequential (`pr-0001` / `pm-0001`) and the QR payload is
/// deterministic, so assertions stay simple.
#[derive(Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<GatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to refuse the next payment-request creations.
    pub async fn set_fail_on_create(&self, fail: bool) {
        self.state.write().await.fail_on_create = fail;
    }

    /// Returns the number of payment requests created.
    pub async fn request_count(&self) -> usize {
        self.state.read().await.requests.len()
    }

    /// Returns the simulated payments recorded so far.
    pub async fn simulated_payments(&self) -> Vec<(String, Money)> {
        self.state.read().await.simulated.clone()
    }

    /// Returns the order a payment request was created for.
    pub async fn order_for_request(&self, request_id: &str) -> Option<OrderId> {
        self.state
            .read()
            .await
            .requests
            .get(request_id)
            .map(|r| r.order_id)
    }

    /// Returns the amount a payment request was created over.
    pub async fn request_amount(&self, request_id: &str) -> Option<Money> {
        self.state
            .read()
            .await
            .requests
            .get(request_id)
            .map(|r| r.amount)
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_payment_request(
        &self,
        amount: Money,
        order_id: OrderId,
    ) -> Result<PaymentRequest> {
        let mut state = self.state.write().await;

        if state.fail_on_create {
            return Err(PaymentError::Declined {
                message: "gateway unavailable".to_string(),
            });
        }

        state.next_id += 1;
        let request_id = format!("pr-{:04}", state.next_id);
        let payment_method_id = format!("pm-{:04}", state.next_id);
        let qr_string = format!("QR|{order_id}|{}", amount.minor());

        state.requests.insert(
            request_id.clone(),
            RequestRecord {
                order_id,
                amount,
                status: PaymentRequestStatus::Pending,
            },
        );
        state
            .methods
            .insert(payment_method_id.clone(), request_id.clone());

        Ok(PaymentRequest {
            id: request_id,
            payment_method_id,
            qr_string,
        })
    }

    async fn get_payment_request_status(&self, request_id: &str) -> Result<PaymentRequestStatus> {
        let state = self.state.read().await;
        state
            .requests
            .get(request_id)
            .map(|r| r.status)
            .ok_or_else(|| PaymentError::UnknownPaymentRequest(request_id.to_string()))
    }

    async fn simulate_payment(&self, payment_method_id: &str, amount: Money) -> Result<()> {
        let mut state = self.state.write().await;

        let request_id = state
            .methods
            .get(payment_method_id)
            .cloned()
            .ok_or_else(|| PaymentError::UnknownPaymentMethod(payment_method_id.to_string()))?;

        if let Some(record) = state.requests.get_mut(&request_id) {
            record.status = PaymentRequestStatus::Succeeded;
        }
        state.simulated.push((payment_method_id.to_string(), amount));
        Ok(())
    }
}
