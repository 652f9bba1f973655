//! Newsletter subscriber repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cedar_twine_core::{Email, SubscriberId};

use super::RepositoryError;

/// A newsletter subscriber.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: Email,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriberRow {
    id: Uuid,
    email: String,
    subscribed_at: DateTime<Utc>,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = RepositoryError;

    fn try_from(row: SubscriberRow) -> Result<Self, RepositoryError> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: SubscriberId::new(row.id),
            email,
            subscribed_at: row.subscribed_at,
        })
    }
}

/// Repository for newsletter subscribers.
pub struct SubscriberRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubscriberRepository<'a> {
    /// Create a new subscriber repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Subscribe an email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already
    /// subscribed.
    pub async fn subscribe(&self, email: &Email) -> Result<Subscriber, RepositoryError> {
        let row = sqlx::query_as::<_, SubscriberRow>(
            "INSERT INTO subscribers (email)
             VALUES ($1)
             RETURNING id, email, subscribed_at",
        )
        .bind(email.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "Email already subscribed"))?;

        Subscriber::try_from(row)
    }
}
