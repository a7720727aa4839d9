//! Order lifecycle engine.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

use catalog::Catalog;
use common::{Money, OrderId, ProductId, TaxRate};
use ledger::{Order, OrderItem, OrderStore, OrderSummary, PaymentHandle, StatusFilter};
use payment::{PaymentGateway, PaymentRequestStatus};
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Upper bound on any single gateway call, independent of the adapter's
/// own transport timeout.
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Result of a successful order creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// QR payload to present to the payer.
    pub qr_string: String,
}

/// Aggregated sales figures for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SalesReport {
    pub total_revenue: Money,
    pub total_ongoing_orders: u64,
    pub total_completed_orders: u64,
}

/// Service driving the order lifecycle.
///
/// Computes snapshot totals, persists orders, requests QR payments from
/// the gateway, and performs the explicit completion transition. Payment
/// confirmation itself arrives through the webhook reconciler, not here.
pub struct OrderService<S, C, G> {
    store: S,
    catalog: C,
    gateway: G,
    tax_rate: TaxRate,
}

impl<S, C, G> OrderService<S, C, G>
where
    S: OrderStore,
    C: Catalog,
    G: PaymentGateway,
{
    /// Creates a new order service.
    pub fn new(store: S, catalog: C, gateway: G, tax_rate: TaxRate) -> Self {
        Self {
            store,
            catalog,
            gateway,
            tax_rate,
        }
    }

    /// Creates an order from the requested items and opens a QR payment
    /// request for its grand total.
    ///
    /// The order row and its items are written first; if the gateway call
    /// then fails, the order stays persisted in `AWAITING_PAYMENT` with no
    /// payment handle and the error is surfaced as retryable.
    #[tracing::instrument(skip(self, items), fields(item_count = items.len()))]
    pub async fn create_order(
        &self,
        items: Vec<OrderItemRequest>,
    ) -> Result<CreatedOrder, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        for item in &items {
            if item.quantity < 1 {
                return Err(OrderError::InvalidQuantity {
                    product_id: item.product_id.clone(),
                    quantity: item.quantity,
                });
            }
        }

        // Merge duplicate lines for the same product.
        let mut quantities: HashMap<ProductId, u32> = HashMap::new();
        for item in &items {
            *quantities.entry(item.product_id.clone()).or_default() += item.quantity;
        }

        let ids: Vec<ProductId> = quantities.keys().cloned().collect();
        let products = self.catalog.products_by_ids(&ids).await?;

        let found: HashSet<&ProductId> = products.iter().map(|p| &p.id).collect();
        let mut unresolved: Vec<ProductId> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .cloned()
            .collect();
        if !unresolved.is_empty() {
            unresolved.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            return Err(OrderError::UnknownProducts { ids: unresolved });
        }

        let order_id = OrderId::new();
        let mut order_items: Vec<OrderItem> = products
            .iter()
            .map(|product| {
                let quantity = quantities[&product.id];
                OrderItem::new(order_id, product.id.clone(), quantity, product.price)
            })
            .collect();
        order_items.sort_by(|a, b| a.product_id.as_str().cmp(b.product_id.as_str()));

        let subtotal: Money = order_items.iter().map(OrderItem::total_price).sum();
        let tax = self.tax_rate.tax_on(subtotal);
        let mut order = Order::new(order_id, subtotal, tax);

        self.store.insert_order(&order, &order_items).await?;
        metrics::counter!("orders_created").increment(1);

        let request = self
            .gateway_call(self.gateway.create_payment_request(order.grand_total, order_id))
            .await?;

        let handle = PaymentHandle {
            external_transaction_id: request.id,
            payment_method_id: request.payment_method_id,
        };
        self.store.attach_payment(order_id, handle.clone()).await?;
        order.payment = Some(handle);

        tracing::info!(%order_id, grand_total = %order.grand_total, "order created");

        Ok(CreatedOrder {
            order,
            items: order_items,
            qr_string: request.qr_string,
        })
    }

    /// Asks the gateway to simulate a successful payment for the order's
    /// grand total. Test/demo hook.
    #[tracing::instrument(skip(self))]
    pub async fn simulate_payment(&self, order_id: OrderId) -> Result<(), OrderError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;
        let handle = order
            .payment
            .ok_or(OrderError::MissingPaymentRequest(order_id))?;

        self.gateway_call(
            self.gateway
                .simulate_payment(&handle.payment_method_id, order.grand_total),
        )
        .await
    }

    /// Polls the gateway for the current status of the order's payment
    /// request.
    #[tracing::instrument(skip(self))]
    pub async fn check_order_status(
        &self,
        order_id: OrderId,
    ) -> Result<PaymentRequestStatus, OrderError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))?;
        let handle = order
            .payment
            .ok_or(OrderError::MissingPaymentRequest(order_id))?;

        self.gateway_call(
            self.gateway
                .get_payment_request_status(&handle.external_transaction_id),
        )
        .await
    }

    /// Marks a paid, processing order as done. Terminal transition.
    #[tracing::instrument(skip(self))]
    pub async fn finish_order(&self, order_id: OrderId) -> Result<(), OrderError> {
        self.store.finish_order(order_id).await?;
        metrics::counter!("orders_finished").increment(1);
        tracing::info!(%order_id, "order finished");
        Ok(())
    }

    /// Lists orders for the dashboard, optionally filtered by status.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filter: StatusFilter,
    ) -> Result<Vec<OrderSummary>, OrderError> {
        Ok(self.store.list_orders(filter).await?)
    }

    /// Computes the sales report. The three aggregations are independent
    /// and run concurrently.
    #[tracing::instrument(skip(self))]
    pub async fn sales_report(&self) -> Result<SalesReport, OrderError> {
        let (revenue, ongoing, completed) = tokio::join!(
            self.store.paid_revenue(),
            self.store.count_ongoing(),
            self.store.count_completed(),
        );

        Ok(SalesReport {
            total_revenue: revenue?,
            total_ongoing_orders: ongoing?,
            total_completed_orders: completed?,
        })
    }

    async fn gateway_call<T>(
        &self,
        call: impl Future<Output = Result<T, payment::PaymentError>>,
    ) -> Result<T, OrderError> {
        match tokio::time::timeout(GATEWAY_TIMEOUT, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(OrderError::GatewayTimeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::{InMemoryCatalog, Product};
    use common::CategoryId;
    use ledger::{InMemoryOrderStore, OrderStatus};
    use payment::InMemoryPaymentGateway;

    type TestService = OrderService<InMemoryOrderStore, InMemoryCatalog, InMemoryPaymentGateway>;

    async fn service_with_product(price: i64) -> (TestService, ProductId) {
        let catalog = InMemoryCatalog::new();
        let product_id = ProductId::new("prod-0001");
        catalog
            .seed_product(Product {
                id: product_id.clone(),
                name: "Americano".to_string(),
                price: Money::from_minor(price),
                category_id: CategoryId::new("cat-0001"),
                image_url: None,
            })
            .await;

        let service = OrderService::new(
            InMemoryOrderStore::new(),
            catalog,
            InMemoryPaymentGateway::new(),
            TaxRate::default(),
        );
        (service, product_id)
    }

    fn request(product_id: &ProductId, quantity: u32) -> OrderItemRequest {
        OrderItemRequest {
            product_id: product_id.clone(),
            quantity,
        }
    }

    #[tokio::test]
    async fn create_order_computes_totals_and_snapshots_price() {
        let (service, product_id) = service_with_product(1_000).await;

        let created = service
            .create_order(vec![request(&product_id, 2)])
            .await
            .unwrap();

        assert_eq!(created.order.subtotal.minor(), 2_000);
        assert_eq!(created.order.tax.minor(), 200);
        assert_eq!(created.order.grand_total.minor(), 2_200);
        assert_eq!(created.order.status, OrderStatus::AwaitingPayment);
        assert_eq!(created.items.len(), 1);
        assert_eq!(created.items[0].unit_price.minor(), 1_000);
        assert!(!created.qr_string.is_empty());
        assert!(created.order.payment.is_some());
    }

    #[tokio::test]
    async fn create_order_with_empty_items_fails() {
        let (service, _) = service_with_product(1_000).await;
        let result = service.create_order(vec![]).await;
        assert!(matches!(result, Err(OrderError::EmptyOrder)));
    }

    #[tokio::test]
    async fn create_order_with_zero_quantity_fails() {
        let (service, product_id) = service_with_product(1_000).await;
        let result = service.create_order(vec![request(&product_id, 0)]).await;
        assert!(matches!(result, Err(OrderError::InvalidQuantity { .. })));
    }

    #[tokio::test]
    async fn create_order_with_unknown_product_fails() {
        let (service, product_id) = service_with_product(1_000).await;
        let result = service
            .create_order(vec![
                request(&product_id, 1),
                request(&ProductId::new("prod-9999"), 1),
            ])
            .await;

        match result {
            Err(OrderError::UnknownProducts { ids }) => {
                assert_eq!(ids, vec![ProductId::new("prod-9999")]);
            }
            other => panic!("expected UnknownProducts, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_lines_merge_quantities() {
        let (service, product_id) = service_with_product(1_000).await;

        let created = service
            .create_order(vec![request(&product_id, 1), request(&product_id, 2)])
            .await
            .unwrap();

        assert_eq!(created.items.len(), 1);
        assert_eq!(created.items[0].quantity, 3);
        assert_eq!(created.order.subtotal.minor(), 3_000);
    }

    #[tokio::test]
    async fn simulate_payment_requires_payment_handle() {
        let (service, _) = service_with_product(1_000).await;
        let result = service.simulate_payment(OrderId::new()).await;
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }

    #[tokio::test]
    async fn simulate_payment_forwards_grand_total() {
        let (service, product_id) = service_with_product(1_000).await;
        let created = service
            .create_order(vec![request(&product_id, 2)])
            .await
            .unwrap();

        service.simulate_payment(created.order.id).await.unwrap();

        let simulated = service.gateway.simulated_payments().await;
        assert_eq!(simulated.len(), 1);
        assert_eq!(simulated[0].1.minor(), 2_200);
    }

    #[tokio::test]
    async fn check_order_status_polls_gateway() {
        let (service, product_id) = service_with_product(1_000).await;
        let created = service
            .create_order(vec![request(&product_id, 1)])
            .await
            .unwrap();

        let status = service.check_order_status(created.order.id).await.unwrap();
        assert_eq!(status, PaymentRequestStatus::Pending);

        service.simulate_payment(created.order.id).await.unwrap();
        let status = service.check_order_status(created.order.id).await.unwrap();
        assert_eq!(status, PaymentRequestStatus::Succeeded);
    }

    #[tokio::test]
    async fn gateway_failure_leaves_recoverable_order() {
        let (service, product_id) = service_with_product(1_000).await;
        service.gateway.set_fail_on_create(true).await;

        let result = service.create_order(vec![request(&product_id, 1)]).await;
        assert!(matches!(result, Err(OrderError::Gateway(_))));

        // The order row survived without a payment handle.
        let orders = service.list_orders(StatusFilter::All).await.unwrap();
        assert_eq!(orders.len(), 1);
        let order = service
            .store
            .get_order(orders[0].id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(order.status, OrderStatus::AwaitingPayment);
        assert!(order.payment.is_none());
    }

    #[tokio::test]
    async fn price_change_after_creation_does_not_affect_order() {
        let (service, product_id) = service_with_product(1_000).await;
        let created = service
            .create_order(vec![request(&product_id, 2)])
            .await
            .unwrap();

        // Reprice the product in the catalog.
        service
            .catalog
            .seed_product(Product {
                id: product_id.clone(),
                name: "Americano".to_string(),
                price: Money::from_minor(9_999),
                category_id: CategoryId::new("cat-0001"),
                image_url: None,
            })
            .await;

        let items = service
            .store
            .items_for_order(created.order.id)
            .await
            .unwrap();
        assert_eq!(items[0].unit_price.minor(), 1_000);
    }
}
