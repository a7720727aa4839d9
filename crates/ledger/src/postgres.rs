use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    LedgerError, Result,
    order::{Order, OrderItem, OrderSummary, PaymentHandle},
    status::{OrderStatus, StatusFilter},
    store::{OrderStore, PaymentApplication},
};

/// PostgreSQL-backed order store.
///
/// The paid transition is a conditional `UPDATE ... WHERE status =
/// 'AWAITING_PAYMENT'`, so concurrent webhook deliveries race on a single
/// row update and at most one of them wins.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let status_text: String = row.try_get("status")?;
        let status: OrderStatus = status_text.parse().map_err(|_| LedgerError::Corrupt {
            message: format!("unrecognized status literal {status_text:?}"),
        })?;

        let external_transaction_id: Option<String> = row.try_get("external_transaction_id")?;
        let payment_method_id: Option<String> = row.try_get("payment_method_id")?;
        let payment = match (external_transaction_id, payment_method_id) {
            (Some(external_transaction_id), Some(payment_method_id)) => Some(PaymentHandle {
                external_transaction_id,
                payment_method_id,
            }),
            (None, None) => None,
            _ => {
                return Err(LedgerError::Corrupt {
                    message: "payment handle columns set inconsistently".to_string(),
                });
            }
        };

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            subtotal: Money::from_minor(row.try_get("subtotal")?),
            tax: Money::from_minor(row.try_get("tax")?),
            grand_total: Money::from_minor(row.try_get("grand_total")?),
            status,
            paid_at: row.try_get("paid_at")?,
            payment,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_summary(row: PgRow) -> Result<OrderSummary> {
        let status_text: String = row.try_get("status")?;
        let status: OrderStatus = status_text.parse().map_err(|_| LedgerError::Corrupt {
            message: format!("unrecognized status literal {status_text:?}"),
        })?;

        Ok(OrderSummary {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            grand_total: Money::from_minor(row.try_get("grand_total")?),
            status,
            paid_at: row.try_get("paid_at")?,
            item_count: row.try_get::<i64, _>("item_count")? as u32,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, subtotal, tax, grand_total, status, paid_at,
                                external_transaction_id, payment_method_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.subtotal.minor())
        .bind(order.tax.minor())
        .bind(order.grand_total.minor())
        .bind(order.status.as_str())
        .bind(order.paid_at)
        .bind(order.payment.as_ref().map(|p| &p.external_transaction_id))
        .bind(order.payment.as_ref().map(|p| &p.payment_method_id))
        .bind(order.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return LedgerError::DuplicateOrder(order.id);
            }
            LedgerError::Database(e)
        })?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(item.order_id.as_uuid())
            .bind(item.product_id.as_str())
            .bind(item.quantity as i32)
            .bind(item.unit_price.minor())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT id, subtotal, tax, grand_total, status, paid_at,
                   external_transaction_id, payment_method_id, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn items_for_order(&self, id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY product_id
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderItem {
                    order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
                    product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
                    quantity: row.try_get::<i32, _>("quantity")? as u32,
                    unit_price: Money::from_minor(row.try_get("unit_price")?),
                })
            })
            .collect()
    }

    async fn attach_payment(&self, id: OrderId, handle: PaymentHandle) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET external_transaction_id = $2, payment_method_id = $3
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&handle.external_transaction_id)
        .bind(&handle.payment_method_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::OrderNotFound(id));
        }
        Ok(())
    }

    async fn apply_payment(
        &self,
        id: OrderId,
        paid_at: DateTime<Utc>,
    ) -> Result<PaymentApplication> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET paid_at = $2, status = 'PROCESSING'
            WHERE id = $1 AND status = 'AWAITING_PAYMENT'
            "#,
        )
        .bind(id.as_uuid())
        .bind(paid_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(PaymentApplication::Applied);
        }

        // The conditional update missed: either the order does not exist or
        // it already left AWAITING_PAYMENT.
        match self.get_order(id).await? {
            None => Err(LedgerError::OrderNotFound(id)),
            Some(_) => Ok(PaymentApplication::AlreadyPaid),
        }
    }

    async fn finish_order(&self, id: OrderId) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = 'DONE'
            WHERE id = $1 AND status = 'PROCESSING' AND paid_at IS NOT NULL
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.get_order(id).await? {
            None => Err(LedgerError::OrderNotFound(id)),
            Some(order) if order.paid_at.is_none() => Err(LedgerError::NotPaid(id)),
            Some(order) => Err(LedgerError::NotProcessing {
                order_id: id,
                status: order.status,
            }),
        }
    }

    async fn list_orders(&self, filter: StatusFilter) -> Result<Vec<OrderSummary>> {
        let base = r#"
            SELECT o.id, o.grand_total, o.status, o.paid_at, o.created_at,
                   COUNT(i.product_id) AS item_count
            FROM orders o
            LEFT JOIN order_items i ON i.order_id = o.id
        "#;

        let rows = match filter.status() {
            Some(status) => {
                sqlx::query(&format!(
                    "{base} WHERE o.status = $1 GROUP BY o.id ORDER BY o.created_at"
                ))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!("{base} GROUP BY o.id ORDER BY o.created_at"))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(Self::row_to_summary).collect()
    }

    async fn paid_revenue(&self) -> Result<Money> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(grand_total), 0)::BIGINT FROM orders WHERE paid_at IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_minor(total))
    }

    async fn count_ongoing(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status <> 'DONE'")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    async fn count_completed(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = 'DONE'")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}
