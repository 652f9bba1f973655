//! Cart repository, including the guest-to-user merge.
//!
//! A cart row carries two nullable owner columns (`user_id`, `guest_id`)
//! under a CHECK constraint that exactly one is set; rows decode into the
//! [`Owner`] tagged variant and never expose the raw pair. The merge runs in
//! a single transaction with both cart rows locked, so a retried merge
//! request cannot double-apply quantities.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use cedar_twine_core::cart::Cart;
use cedar_twine_core::{CartId, GuestId, Owner, UserId};

use super::RepositoryError;

/// Errors from the guest-to-user cart merge.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The guest cart exists but holds no lines.
    #[error("Guest cart is empty")]
    GuestCartEmpty,
    /// Neither a guest cart nor a user cart exists.
    #[error("Guest cart not found")]
    NotFound,
    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for MergeError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(e.into())
    }
}

/// Raw database row for a cart.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Option<Uuid>,
    guest_id: Option<String>,
    lines: serde_json::Value,
    total_price: rust_decimal::Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const CART_COLUMNS: &str = "id, user_id, guest_id, lines, total_price, created_at, updated_at";

impl TryFrom<CartRow> for Cart {
    type Error = RepositoryError;

    fn try_from(row: CartRow) -> Result<Self, RepositoryError> {
        let owner = match (row.user_id, row.guest_id) {
            (Some(user_id), None) => Owner::User(UserId::new(user_id)),
            (None, Some(guest_id)) => {
                let guest_id = GuestId::parse(&guest_id).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid guest id in database: {e}"))
                })?;
                Owner::Guest(guest_id)
            }
            // The CHECK constraint makes these unreachable.
            (Some(_), Some(_)) => {
                return Err(RepositoryError::DataCorruption(
                    "cart has both a user and a guest owner".to_owned(),
                ));
            }
            (None, None) => {
                return Err(RepositoryError::DataCorruption(
                    "cart has no owner".to_owned(),
                ));
            }
        };

        Ok(Self {
            id: CartId::new(row.id),
            owner,
            lines: RepositoryError::decode_json("cart lines", row.lines)?,
            total_price: row.total_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn owner_columns(owner: &Owner) -> (Option<Uuid>, Option<&str>) {
    match owner {
        Owner::User(user_id) => (Some(user_id.as_uuid()), None),
        Owner::Guest(guest_id) => (None, Some(guest_id.as_str())),
    }
}

fn lines_json(cart: &Cart) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(&cart.lines)
        .map_err(|e| RepositoryError::DataCorruption(format!("failed to serialize lines: {e}")))
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the cart for a request identity: the user's cart when a user id
    /// is present, otherwise the guest's cart when a guest token is present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_for_identity(
        &self,
        user_id: Option<UserId>,
        guest_id: Option<&GuestId>,
    ) -> Result<Option<Cart>, RepositoryError> {
        if let Some(user_id) = user_id {
            return self.get_by_user(user_id).await;
        }
        if let Some(guest_id) = guest_id {
            return self.get_by_guest(guest_id).await;
        }
        Ok(None)
    }

    /// Get a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Cart::try_from).transpose()
    }

    /// Get a guest's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_guest(&self, guest_id: &GuestId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(&format!(
            "SELECT {CART_COLUMNS} FROM carts WHERE guest_id = $1"
        ))
        .bind(guest_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Cart::try_from).transpose()
    }

    /// Insert a freshly created cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the owner already has a cart.
    pub async fn insert(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let (user_id, guest_id) = owner_columns(&cart.owner);

        sqlx::query(
            "INSERT INTO carts (id, user_id, guest_id, lines, total_price, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(cart.id)
        .bind(user_id)
        .bind(guest_id)
        .bind(lines_json(cart)?)
        .bind(cart.total_price)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "cart already exists for this owner"))?;

        Ok(())
    }

    /// Persist a mutated cart (lines, total, owner).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart row is gone.
    pub async fn save(&self, cart: &Cart) -> Result<(), RepositoryError> {
        let (user_id, guest_id) = owner_columns(&cart.owner);

        let result = sqlx::query(
            "UPDATE carts
             SET user_id = $2, guest_id = $3, lines = $4, total_price = $5, updated_at = $6
             WHERE id = $1",
        )
        .bind(cart.id)
        .bind(user_id)
        .bind(guest_id)
        .bind(lines_json(cart)?)
        .bind(cart.total_price)
        .bind(cart.updated_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Merge a guest cart into a user cart.
    ///
    /// Runs in one transaction with both rows locked:
    /// - no guest cart: the merge already happened, the user's cart is
    ///   returned unchanged ([`MergeError::NotFound`] only when the user has
    ///   no cart either);
    /// - guest cart empty: [`MergeError::GuestCartEmpty`], nothing touched;
    /// - no user cart: the guest cart is re-owned to the user (transfer, not
    ///   copy);
    /// - both exist: quantities of matching lines add, the rest append; the
    ///   guest cart row is deleted.
    ///
    /// # Errors
    ///
    /// See [`MergeError`].
    pub async fn merge_guest_into_user(
        &self,
        guest_id: &GuestId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Cart, MergeError> {
        let mut tx = self.pool.begin().await?;

        let guest_cart = lock_cart_by_guest(&mut tx, guest_id).await?;
        let user_cart = lock_cart_by_user(&mut tx, user_id).await?;

        let Some(guest_cart) = guest_cart else {
            // Already merged (or never existed); commit releases the lock on
            // the user row.
            let user_cart = user_cart.ok_or(MergeError::NotFound)?;
            tx.commit().await?;
            return Ok(user_cart);
        };

        if guest_cart.is_empty() {
            return Err(MergeError::GuestCartEmpty);
        }

        let merged = match user_cart {
            Some(mut user_cart) => {
                let guest_cart_id = guest_cart.id;
                user_cart.merge_from(guest_cart, now);
                save_cart_in_tx(&mut tx, &user_cart).await?;

                sqlx::query("DELETE FROM carts WHERE id = $1")
                    .bind(guest_cart_id)
                    .execute(&mut *tx)
                    .await?;

                user_cart
            }
            None => {
                let mut guest_cart = guest_cart;
                guest_cart.reassign_to_user(user_id, now);
                save_cart_in_tx(&mut tx, &guest_cart).await?;
                guest_cart
            }
        };

        tx.commit().await?;
        Ok(merged)
    }
}

async fn lock_cart_by_guest(
    tx: &mut Transaction<'_, Postgres>,
    guest_id: &GuestId,
) -> Result<Option<Cart>, RepositoryError> {
    let row = sqlx::query_as::<_, CartRow>(&format!(
        "SELECT {CART_COLUMNS} FROM carts WHERE guest_id = $1 FOR UPDATE"
    ))
    .bind(guest_id.as_str())
    .fetch_optional(&mut **tx)
    .await?;

    row.map(Cart::try_from).transpose()
}

async fn lock_cart_by_user(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<Option<Cart>, RepositoryError> {
    let row = sqlx::query_as::<_, CartRow>(&format!(
        "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1 FOR UPDATE"
    ))
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    row.map(Cart::try_from).transpose()
}

async fn save_cart_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    cart: &Cart,
) -> Result<(), RepositoryError> {
    let (user_id, guest_id) = owner_columns(&cart.owner);

    sqlx::query(
        "UPDATE carts
         SET user_id = $2, guest_id = $3, lines = $4, total_price = $5, updated_at = $6
         WHERE id = $1",
    )
    .bind(cart.id)
    .bind(user_id)
    .bind(guest_id)
    .bind(lines_json(cart)?)
    .bind(cart.total_price)
    .bind(cart.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
