//! Payment webhook endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use catalog::Catalog;
use ledger::OrderStore;
use payment::{PaymentGateway, WebhookNotification};
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// Header carrying the shared webhook secret.
pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

#[derive(Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// POST /payment/webhook — apply a payment notification.
///
/// Token mismatch is rejected before the body is inspected, so an
/// unauthenticated caller cannot probe which orders exist. Every
/// authenticated, well-formed delivery except an unknown reference is
/// answered 200, including duplicates and failure notices, so the
/// gateway stops retrying.
#[tracing::instrument(skip(state, headers, notification))]
pub async fn handle<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    headers: HeaderMap,
    Json(notification): Json<WebhookNotification>,
) -> Result<Json<WebhookAck>, ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let token = headers
        .get(CALLBACK_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    if token != Some(state.webhook_token.as_str()) {
        metrics::counter!("webhook_unauthorized").increment(1);
        return Err(ApiError::Unauthorized);
    }

    state.reconciler.apply(&notification).await?;
    Ok(Json(WebhookAck { status: "OK" }))
}
