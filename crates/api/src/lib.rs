//! HTTP API server for the point-of-sale system.
//!
//! Exposes the order RPC surface, the payment webhook endpoint, and the
//! catalog admin endpoints, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use catalog::Catalog;
use ledger::OrderStore;
use metrics_exporter_prometheus::PrometheusHandle;
use orders::{OrderService, WebhookReconciler};
use payment::PaymentGateway;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, C, G>(state: Arc<AppState<S, C, G>>, metrics_handle: PrometheusHandle) -> Router
where
    S: OrderStore + 'static,
    C: Catalog + 'static,
    G: PaymentGateway + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        // Order lifecycle
        .route("/orders", post(routes::orders::create::<S, C, G>))
        .route("/orders", get(routes::orders::list::<S, C, G>))
        .route(
            "/orders/{id}/simulate-payment",
            post(routes::orders::simulate_payment::<S, C, G>),
        )
        .route(
            "/orders/{id}/payment-status",
            get(routes::orders::payment_status::<S, C, G>),
        )
        .route("/orders/{id}/finish", post(routes::orders::finish::<S, C, G>))
        .route("/reports/sales", get(routes::orders::sales_report::<S, C, G>))
        // Payment webhook
        .route("/payment/webhook", post(routes::webhook::handle::<S, C, G>))
        // Catalog admin
        .route("/products", get(routes::catalog::list_products::<S, C, G>))
        .route("/products", post(routes::catalog::create_product::<S, C, G>))
        .route(
            "/products/{id}",
            put(routes::catalog::update_product::<S, C, G>),
        )
        .route(
            "/products/{id}",
            delete(routes::catalog::delete_product::<S, C, G>),
        )
        .route("/categories", get(routes::catalog::list_categories::<S, C, G>))
        .route(
            "/categories",
            post(routes::catalog::create_category::<S, C, G>),
        )
        .route(
            "/categories/{id}",
            put(routes::catalog::update_category::<S, C, G>),
        )
        .route(
            "/categories/{id}",
            delete(routes::catalog::delete_category::<S, C, G>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the application state from a store, catalog, and gateway.
pub fn create_state<S, C, G>(
    store: S,
    catalog: C,
    gateway: G,
    config: &Config,
) -> Arc<AppState<S, C, G>>
where
    S: OrderStore + Clone + 'static,
    C: Catalog + Clone + 'static,
    G: PaymentGateway + 'static,
{
    let order_service = OrderService::new(store.clone(), catalog.clone(), gateway, config.tax_rate);
    let reconciler = WebhookReconciler::new(store);

    Arc::new(AppState {
        order_service,
        reconciler,
        catalog,
        webhook_token: config.webhook_token.clone(),
    })
}
