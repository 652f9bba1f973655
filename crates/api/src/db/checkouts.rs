//! Checkout session repository, including the transactional finalize.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use cedar_twine_core::checkout::{CheckoutError, CheckoutSession};
use cedar_twine_core::order::Order;
use cedar_twine_core::{CheckoutId, PaymentStatus, UserId};

use super::RepositoryError;
use super::orders::insert_order_in_tx;

/// Errors from checkout state transitions at the storage layer.
#[derive(Debug, Error)]
pub enum CheckoutUpdateError {
    /// No session with the given id.
    #[error("Checkout not found")]
    NotFound,
    /// The session refused the transition.
    #[error(transparent)]
    State(#[from] CheckoutError),
    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutUpdateError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(e.into())
    }
}

/// Raw database row for a checkout session.
#[derive(Debug, sqlx::FromRow)]
struct CheckoutRow {
    id: Uuid,
    user_id: Uuid,
    items: serde_json::Value,
    shipping_address: serde_json::Value,
    payment_method: String,
    total_price: rust_decimal::Decimal,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    payment_status: String,
    payment_details: Option<serde_json::Value>,
    is_finalized: bool,
    finalized_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const CHECKOUT_COLUMNS: &str = "id, user_id, items, shipping_address, payment_method, \
     total_price, is_paid, paid_at, payment_status, payment_details, is_finalized, \
     finalized_at, created_at, updated_at";

impl TryFrom<CheckoutRow> for CheckoutSession {
    type Error = RepositoryError;

    fn try_from(row: CheckoutRow) -> Result<Self, RepositoryError> {
        let payment_status = row.payment_status.parse::<PaymentStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;

        Ok(Self {
            id: CheckoutId::new(row.id),
            user_id: UserId::new(row.user_id),
            items: RepositoryError::decode_json("checkout items", row.items)?,
            shipping_address: RepositoryError::decode_json(
                "shipping address",
                row.shipping_address,
            )?,
            payment_method: row.payment_method,
            total_price: row.total_price,
            is_paid: row.is_paid,
            paid_at: row.paid_at,
            payment_status,
            payment_details: row.payment_details,
            is_finalized: row.is_finalized,
            finalized_at: row.finalized_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn to_json<T: serde::Serialize>(column: &str, value: &T) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value).map_err(|e| {
        RepositoryError::DataCorruption(format!("failed to serialize {column}: {e}"))
    })
}

/// Repository for checkout session database operations.
pub struct CheckoutRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutRepository<'a> {
    /// Create a new checkout repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a freshly started session.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, session: &CheckoutSession) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO checkout_sessions (
                id, user_id, items, shipping_address, payment_method, total_price,
                is_paid, paid_at, payment_status, payment_details, is_finalized,
                finalized_at, created_at, updated_at
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(to_json("items", &session.items)?)
        .bind(to_json("shipping address", &session.shipping_address)?)
        .bind(&session.payment_method)
        .bind(session.total_price)
        .bind(session.is_paid)
        .bind(session.paid_at)
        .bind(session.payment_status.as_str())
        .bind(&session.payment_details)
        .bind(session.is_finalized)
        .bind(session.finalized_at)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Get a session by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: CheckoutId,
    ) -> Result<Option<CheckoutSession>, RepositoryError> {
        let row = sqlx::query_as::<_, CheckoutRow>(&format!(
            "SELECT {CHECKOUT_COLUMNS} FROM checkout_sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(CheckoutSession::try_from).transpose()
    }

    /// Record a payment callback.
    ///
    /// A reported status other than `paid` rejects the whole update and
    /// leaves the stored session untouched.
    ///
    /// # Errors
    ///
    /// See [`CheckoutUpdateError`].
    pub async fn mark_paid(
        &self,
        id: CheckoutId,
        status: PaymentStatus,
        details: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<CheckoutSession, CheckoutUpdateError> {
        let mut session = self
            .get_by_id(id)
            .await?
            .ok_or(CheckoutUpdateError::NotFound)?;

        session.mark_paid(status, details, now)?;

        sqlx::query(
            "UPDATE checkout_sessions
             SET is_paid = $2, payment_status = $3, payment_details = $4,
                 paid_at = $5, updated_at = $6
             WHERE id = $1",
        )
        .bind(session.id)
        .bind(session.is_paid)
        .bind(session.payment_status.as_str())
        .bind(&session.payment_details)
        .bind(session.paid_at)
        .bind(session.updated_at)
        .execute(self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(session)
    }

    /// Convert a paid session into an order.
    ///
    /// One transaction: the session row is locked, the finalized flag is
    /// re-checked under the lock, the order is inserted, the session is
    /// stamped, and the user's cart is deleted. A retried finalize therefore
    /// either sees the lock (and then the finalized flag) or runs after the
    /// commit and fails on the flag; it can never mint a second order.
    ///
    /// # Errors
    ///
    /// See [`CheckoutUpdateError`].
    pub async fn finalize(
        &self,
        id: CheckoutId,
        now: DateTime<Utc>,
    ) -> Result<Order, CheckoutUpdateError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CheckoutRow>(&format!(
            "SELECT {CHECKOUT_COLUMNS} FROM checkout_sessions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let mut session = row
            .map(CheckoutSession::try_from)
            .transpose()?
            .ok_or(CheckoutUpdateError::NotFound)?;

        session.finalize(now)?;
        let order = Order::materialize(&session, now);

        insert_order_in_tx(&mut tx, &order).await?;

        sqlx::query(
            "UPDATE checkout_sessions
             SET is_finalized = $2, finalized_at = $3, updated_at = $4
             WHERE id = $1",
        )
        .bind(session.id)
        .bind(session.is_finalized)
        .bind(session.finalized_at)
        .bind(session.updated_at)
        .execute(&mut *tx)
        .await?;

        // The cart's contents now live on the order.
        sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(session.user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(order)
    }
}
