//! Newsletter subscription route.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::json;

use cedar_twine_core::Email;

use crate::db::subscribers::SubscriberRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Newsletter signup payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub email: Option<String>,
}

/// Subscribe an email address to the newsletter.
///
/// POST /api/subscribe
///
/// The address is normalized to lowercase before storage.
///
/// # Errors
///
/// Returns 400 on a missing or invalid email, 409 when already subscribed.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let raw = payload
        .email
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;
    let email = Email::parse(&raw)
        .map_err(|e| AppError::Validation(e.to_string()))?
        .normalized();

    SubscriberRepository::new(state.pool())
        .subscribe(&email)
        .await?;

    tracing::info!("Newsletter subscription added");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Successfully subscribed to the newsletter" })),
    ))
}
