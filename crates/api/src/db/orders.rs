//! Order repository.
//!
//! Orders are written exactly once, inside the finalize transaction (see
//! `db::checkouts`); everything else here is reads plus the admin
//! delivery-status update.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use cedar_twine_core::order::Order;
use cedar_twine_core::{OrderId, OrderStatus, PaymentStatus, UserId};

use super::RepositoryError;

/// Raw database row for an order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    order_items: serde_json::Value,
    shipping_address: serde_json::Value,
    payment_method: String,
    total_price: rust_decimal::Decimal,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    status: String,
    payment_status: String,
    payment_details: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const ORDER_COLUMNS: &str = "id, user_id, order_items, shipping_address, payment_method, \
     total_price, is_paid, paid_at, is_delivered, delivered_at, status, payment_status, \
     payment_details, created_at, updated_at";

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, RepositoryError> {
        let status = row.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;
        let payment_status = row.payment_status.parse::<PaymentStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            order_items: RepositoryError::decode_json("order items", row.order_items)?,
            shipping_address: RepositoryError::decode_json(
                "shipping address",
                row.shipping_address,
            )?,
            payment_method: row.payment_method,
            total_price: row.total_price,
            is_paid: row.is_paid,
            paid_at: row.paid_at,
            is_delivered: row.is_delivered,
            delivered_at: row.delivered_at,
            status,
            payment_status,
            payment_details: row.payment_details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Insert an order inside an already-open transaction.
pub(crate) async fn insert_order_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
) -> Result<(), RepositoryError> {
    let order_items = serde_json::to_value(&order.order_items).map_err(|e| {
        RepositoryError::DataCorruption(format!("failed to serialize order items: {e}"))
    })?;
    let shipping_address = serde_json::to_value(&order.shipping_address).map_err(|e| {
        RepositoryError::DataCorruption(format!("failed to serialize shipping address: {e}"))
    })?;

    sqlx::query(
        "INSERT INTO orders (
            id, user_id, order_items, shipping_address, payment_method, total_price,
            is_paid, paid_at, is_delivered, delivered_at, status, payment_status,
            payment_details, created_at, updated_at
         )
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(order_items)
    .bind(shipping_address)
    .bind(&order.payment_method)
    .bind(order.total_price)
    .bind(order.is_paid)
    .bind(order.paid_at)
    .bind(order.is_delivered)
    .bind(order.delivered_at)
    .bind(order.status.as_str())
    .bind(order.payment_status.as_str())
    .bind(&order.payment_details)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Every order, newest first. Admin surface.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    /// Admin delivery-status update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        now: chrono::DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let mut order = self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)?;
        order.set_status(status, now);

        let result = sqlx::query(
            "UPDATE orders
             SET status = $2, is_delivered = $3, delivered_at = $4, updated_at = $5
             WHERE id = $1",
        )
        .bind(order.id)
        .bind(order.status.as_str())
        .bind(order.is_delivered)
        .bind(order.delivered_at)
        .bind(order.updated_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(order)
    }

    /// Delete an order. Admin surface only.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
