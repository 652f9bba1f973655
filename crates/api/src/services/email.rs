//! SMTP mail transport for contact-form notifications.
//!
//! Delivery is best-effort by design: the stored message row is
//! authoritative, and the notification runs in a background task with a
//! small bounded retry. A delivery failure is logged and captured, never
//! surfaced to the shopper who submitted the form.

use std::time::Duration;

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// How many delivery attempts a notification gets.
const DELIVERY_ATTEMPTS: u32 = 3;

/// Pause between delivery attempts.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for contact-form notifications.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    contact_recipient: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            contact_recipient: config.contact_recipient.clone(),
        })
    }

    /// Send one contact-form notification.
    ///
    /// # Errors
    ///
    /// Returns error if the message fails to build or send.
    pub async fn send_contact_notification(
        &self,
        name: &str,
        email: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .reply_to(
                email
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(email.to_string()))?,
            )
            .to(self
                .contact_recipient
                .parse()
                .map_err(|_| EmailError::InvalidAddress(self.contact_recipient.clone()))?)
            .subject(format!("New contact message from {name}"))
            .header(ContentType::TEXT_PLAIN)
            .body(format!("From: {name} <{email}>\n\n{body}"))?;

        self.mailer.send(message).await?;
        Ok(())
    }

    /// Deliver a contact notification in the background.
    ///
    /// Retries a couple of times with a pause, then gives up: the failure is
    /// logged and captured, and the already-stored message row stands.
    pub fn notify_contact_in_background(&self, name: String, email: String, body: String) {
        let service = self.clone();

        tokio::spawn(async move {
            for attempt in 1..=DELIVERY_ATTEMPTS {
                match service
                    .send_contact_notification(&name, &email, &body)
                    .await
                {
                    Ok(()) => {
                        tracing::info!(attempt, "Contact notification delivered");
                        return;
                    }
                    Err(e) if attempt < DELIVERY_ATTEMPTS => {
                        tracing::warn!(attempt, error = %e, "Contact notification failed, retrying");
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Contact notification gave up");
                        sentry::capture_error(&e);
                    }
                }
            }
        });
    }
}
