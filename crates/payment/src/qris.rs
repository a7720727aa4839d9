//! QRIS payment provider integration via REST API (no SDK dependency).

use std::time::Duration;

use async_trait::async_trait;
use common::{Money, OrderId};
use serde_json::{Value, json};

use crate::gateway::{
    PaymentError, PaymentGateway, PaymentRequest, PaymentRequestStatus, Result,
};

const DEFAULT_BASE_URL: &str = "https://api.xendit.co";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client for a QRIS-style payment provider.
///
/// Authenticates with an API key via basic auth. Every call carries a
/// request timeout so no order operation blocks indefinitely on the
/// provider.
#[derive(Clone)]
pub struct QrisGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl QrisGateway {
    /// Creates a gateway client against the default provider endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Creates a gateway client against a custom endpoint (sandbox, tests).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for QrisGateway {
    async fn create_payment_request(
        &self,
        amount: Money,
        order_id: OrderId,
    ) -> Result<PaymentRequest> {
        tracing::debug!(%order_id, amount = amount.minor(), "creating payment request");

        let body = json!({
            "amount": amount.minor(),
            "currency": "IDR",
            "reference_id": order_id.to_string(),
            "payment_method": {
                "type": "QR_CODE",
                "reusability": "ONE_TIME_USE",
                "qr_code": { "channel_code": "QRIS" },
            },
        });

        let resp: Value = self
            .client
            .post(format!("{}/payment_requests", self.base_url))
            .basic_auth(&self.api_key, None::<&str>)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_payment_request(&resp)
    }

    async fn get_payment_request_status(&self, request_id: &str) -> Result<PaymentRequestStatus> {
        let resp: Value = self
            .client
            .get(format!("{}/payment_requests/{request_id}", self.base_url))
            .basic_auth(&self.api_key, None::<&str>)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        parse_request_status(&resp)
    }

    async fn simulate_payment(&self, payment_method_id: &str, amount: Money) -> Result<()> {
        self.client
            .post(format!(
                "{}/payment_methods/{payment_method_id}/payments/simulate",
                self.base_url
            ))
            .basic_auth(&self.api_key, None::<&str>)
            .json(&json!({ "amount": amount.minor() }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

fn parse_payment_request(resp: &Value) -> Result<PaymentRequest> {
    let id = resp["id"].as_str();
    let payment_method_id = resp["payment_method"]["id"].as_str();
    let qr_string = resp["payment_method"]["qr_code"]["channel_properties"]["qr_string"].as_str();

    match (id, payment_method_id, qr_string) {
        (Some(id), Some(payment_method_id), Some(qr_string)) => Ok(PaymentRequest {
            id: id.to_string(),
            payment_method_id: payment_method_id.to_string(),
            qr_string: qr_string.to_string(),
        }),
        _ => Err(PaymentError::MalformedResponse {
            message: format!("payment request creation failed: {resp}"),
        }),
    }
}

fn parse_request_status(resp: &Value) -> Result<PaymentRequestStatus> {
    let status = resp["status"]
        .as_str()
        .ok_or_else(|| PaymentError::MalformedResponse {
            message: format!("payment request status missing: {resp}"),
        })?;

    Ok(serde_json::from_value(Value::String(status.to_string()))
        .unwrap_or(PaymentRequestStatus::Unknown))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_payment_request() {
        let resp = json!({
            "id": "pr-abc",
            "status": "PENDING",
            "payment_method": {
                "id": "pm-abc",
                "qr_code": {
                    "channel_properties": { "qr_string": "00020101021226..." }
                }
            }
        });

        let request = parse_payment_request(&resp).unwrap();
        assert_eq!(request.id, "pr-abc");
        assert_eq!(request.payment_method_id, "pm-abc");
        assert_eq!(request.qr_string, "00020101021226...");
    }

    #[test]
    fn missing_qr_string_is_malformed() {
        let resp = json!({
            "id": "pr-abc",
            "payment_method": { "id": "pm-abc" }
        });

        let result = parse_payment_request(&resp);
        assert!(matches!(
            result,
            Err(PaymentError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn parses_status_literal() {
        let resp = json!({ "status": "SUCCEEDED" });
        assert_eq!(
            parse_request_status(&resp).unwrap(),
            PaymentRequestStatus::Succeeded
        );
    }

    #[test]
    fn unknown_status_literal_is_preserved_as_unknown() {
        let resp = json!({ "status": "SOMETHING_NEW" });
        assert_eq!(
            parse_request_status(&resp).unwrap(),
            PaymentRequestStatus::Unknown
        );
    }
}
