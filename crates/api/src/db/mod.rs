//! Database operations for the commerce `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Shopper and admin accounts
//! - `products` - Catalog entries (option sets and images as JSONB)
//! - `carts` - One row per cart; lines embedded as JSONB
//! - `checkout_sessions` - Checkout snapshots and payment state
//! - `orders` - Finalized orders
//! - `subscribers` - Newsletter signups
//! - `messages` - Contact-form submissions
//!
//! All queries use the runtime query API with explicit row structs; embedded
//! documents (cart lines, checkout/order items, addresses, images) are
//! serialized to JSONB and decoded back into domain types, with decode
//! failures surfacing as [`RepositoryError::DataCorruption`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p cedar-twine-cli -- migrate
//! ```

pub mod carts;
pub mod checkouts;
pub mod messages;
pub mod orders;
pub mod products;
pub mod subscribers;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email or SKU).
    #[error("{0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a sqlx error, turning unique violations into [`Self::Conflict`].
    pub(crate) fn from_sqlx(e: sqlx::Error, conflict_message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict_message.to_owned());
        }
        Self::Database(e)
    }

    /// Decode a JSONB column into a domain type.
    pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
        column: &str,
        value: serde_json::Value,
    ) -> Result<T, Self> {
        serde_json::from_value(value)
            .map_err(|e| Self::DataCorruption(format!("invalid {column} in database: {e}")))
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
