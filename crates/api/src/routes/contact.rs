//! Contact-form route.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::json;

use cedar_twine_core::Email;

use crate::db::messages::MessageRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Contact-form payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

/// Store a contact-form submission and notify the shop by email.
///
/// POST /api/contact
///
/// The stored message row is authoritative; the email notification runs
/// in a background task and its failure never fails this request.
///
/// # Errors
///
/// Returns 400 when any field is missing or the email is invalid.
pub async fn contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let (Some(name), Some(raw_email), Some(body)) =
        (payload.name, payload.email, payload.message)
    else {
        return Err(AppError::Validation("All fields are required".to_string()));
    };
    if name.trim().is_empty() || body.trim().is_empty() {
        return Err(AppError::Validation("All fields are required".to_string()));
    }
    let email = Email::parse(&raw_email).map_err(|e| AppError::Validation(e.to_string()))?;

    let message = MessageRepository::new(state.pool())
        .create(name.trim(), &email, body.trim())
        .await?;

    if let Some(mailer) = state.mailer() {
        mailer.notify_contact_in_background(
            message.name.clone(),
            message.email.to_string(),
            message.body.clone(),
        );
    } else {
        tracing::info!(message_id = %message.id, "SMTP not configured, skipping notification");
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Your message has been received" })),
    ))
}
