//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::middleware::TokenService;
use crate::services::email::EmailService;
use crate::services::media::{MediaClient, MediaError};

/// Error assembling application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("media client error: {0}")]
    Media(#[from] MediaError),
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    tokens: TokenService,
    mailer: Option<EmailService>,
    media: MediaClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the media client or SMTP transport cannot be
    /// built from the configuration.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let tokens = TokenService::new(&config.jwt_secret, config.jwt_expiry_hours);
        let media = MediaClient::new(&config.media)?;
        let mailer = match &config.email {
            Some(email_config) => Some(EmailService::new(email_config)?),
            None => {
                tracing::warn!("SMTP not configured, contact notifications disabled");
                None
            }
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                mailer,
                media,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get the email service, if SMTP is configured.
    #[must_use]
    pub fn mailer(&self) -> Option<&EmailService> {
        self.inner.mailer.as_ref()
    }

    /// Get a reference to the media host client.
    #[must_use]
    pub fn media(&self) -> &MediaClient {
        &self.inner.media
    }
}
