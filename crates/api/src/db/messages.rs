//! Contact-form message repository.
//!
//! The stored row is authoritative; the SMTP notification that follows it
//! is best-effort (see `services::email`).

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cedar_twine_core::{Email, MessageId};

use super::RepositoryError;

/// A contact-form submission.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub name: String,
    pub email: Email,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    name: String,
    email: String,
    body: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for Message {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, RepositoryError> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: MessageId::new(row.id),
            name: row.name,
            email,
            body: row.body,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

/// Repository for contact messages.
pub struct MessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a contact-form submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        body: &str,
    ) -> Result<Message, RepositoryError> {
        let row = sqlx::query_as::<_, MessageRow>(
            "INSERT INTO messages (name, email, body)
             VALUES ($1, $2, $3)
             RETURNING id, name, email, body, is_read, created_at",
        )
        .bind(name)
        .bind(email.as_str())
        .bind(body)
        .fetch_one(self.pool)
        .await?;

        Message::try_from(row)
    }
}
