//! Order RPC endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use catalog::Catalog;
use common::{OrderId, ProductId};
use ledger::{Order, OrderItem, OrderStore, OrderSummary, StatusFilter};
use orders::{OrderItemRequest, OrderService, WebhookReconciler};
use payment::{PaymentGateway, PaymentRequestStatus};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S, C, G> {
    pub order_service: OrderService<S, C, G>,
    pub reconciler: WebhookReconciler<S>,
    pub catalog: C,
    pub webhook_token: String,
}

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<CreateOrderItem>,
}

#[derive(Deserialize)]
pub struct CreateOrderItem {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default)]
    pub status: StatusFilter,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub subtotal: i64,
    pub tax: i64,
    pub grand_total: i64,
    pub status: String,
    pub paid_at: Option<String>,
    pub external_transaction_id: Option<String>,
    pub payment_method_id: Option<String>,
    pub created_at: String,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            subtotal: order.subtotal.minor(),
            tax: order.tax.minor(),
            grand_total: order.grand_total.minor(),
            status: order.status.to_string(),
            paid_at: order.paid_at.map(|t| t.to_rfc3339()),
            external_transaction_id: order
                .payment
                .as_ref()
                .map(|p| p.external_transaction_id.clone()),
            payment_method_id: order.payment.as_ref().map(|p| p.payment_method_id.clone()),
            created_at: order.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: i64,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            quantity: item.quantity,
            unit_price: item.unit_price.minor(),
        }
    }
}

#[derive(Serialize)]
pub struct CreateOrderResponse {
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
    pub qr_string: String,
}

#[derive(Serialize)]
pub struct OrderSummaryResponse {
    pub id: String,
    pub grand_total: i64,
    pub status: String,
    pub paid_at: Option<String>,
    pub item_count: u32,
}

impl From<OrderSummary> for OrderSummaryResponse {
    fn from(summary: OrderSummary) -> Self {
        Self {
            id: summary.id.to_string(),
            grand_total: summary.grand_total.minor(),
            status: summary.status.to_string(),
            paid_at: summary.paid_at.map(|t| t.to_rfc3339()),
            item_count: summary.item_count,
        }
    }
}

#[derive(Serialize)]
pub struct PaymentStatusResponse {
    pub status: PaymentRequestStatus,
}

#[derive(Serialize)]
pub struct SalesReportResponse {
    pub total_revenue: i64,
    pub total_ongoing_orders: u64,
    pub total_completed_orders: u64,
}

// -- Handlers --

/// POST /orders — create an order and open a QR payment request.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let items: Vec<OrderItemRequest> = req
        .items
        .into_iter()
        .map(|item| OrderItemRequest {
            product_id: ProductId::new(item.product_id),
            quantity: item.quantity,
        })
        .collect();

    let created = state.order_service.create_order(items).await?;

    let response = CreateOrderResponse {
        order: OrderResponse::from(&created.order),
        items: created.items.iter().map(OrderItemResponse::from).collect(),
        qr_string: created.qr_string,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /orders — list orders, optionally filtered by status.
#[tracing::instrument(skip(state))]
pub async fn list<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderSummaryResponse>>, ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let summaries = state.order_service.list_orders(query.status).await?;
    Ok(Json(
        summaries.into_iter().map(OrderSummaryResponse::from).collect(),
    ))
}

/// POST /orders/{id}/simulate-payment — sandbox payment for an order.
#[tracing::instrument(skip(state))]
pub async fn simulate_payment<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let order_id = parse_order_id(&id)?;
    state.order_service.simulate_payment(order_id).await?;
    Ok(StatusCode::OK)
}

/// GET /orders/{id}/payment-status — poll the gateway for the order's
/// payment request status.
#[tracing::instrument(skip(state))]
pub async fn payment_status<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentStatusResponse>, ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let order_id = parse_order_id(&id)?;
    let status = state.order_service.check_order_status(order_id).await?;
    Ok(Json(PaymentStatusResponse { status }))
}

/// POST /orders/{id}/finish — mark a paid, processing order as done.
#[tracing::instrument(skip(state))]
pub async fn finish<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let order_id = parse_order_id(&id)?;
    state.order_service.finish_order(order_id).await?;
    Ok(StatusCode::OK)
}

/// GET /reports/sales — aggregate revenue and order counts.
#[tracing::instrument(skip(state))]
pub async fn sales_report<S, C, G>(
    State(state): State<Arc<AppState<S, C, G>>>,
) -> Result<Json<SalesReportResponse>, ApiError>
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let report = state.order_service.sales_report().await?;
    Ok(Json(SalesReportResponse {
        total_revenue: report.total_revenue.minor(),
        total_ongoing_orders: report.total_ongoing_orders,
        total_completed_orders: report.total_completed_orders,
    }))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
