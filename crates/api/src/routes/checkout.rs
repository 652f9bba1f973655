//! Checkout routes: start, payment callback, finalize.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use cedar_twine_core::checkout::{CheckoutItem, CheckoutSession, ShippingAddress};
use cedar_twine_core::order::Order;
use cedar_twine_core::{CheckoutId, PaymentStatus};

use crate::db::checkouts::CheckoutRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Request to start a checkout session.
///
/// Items and total are the client's snapshot of its cart; prices were
/// locked in at add-to-cart time and are not re-validated here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCheckoutRequest {
    pub checkout_items: Vec<CheckoutItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: Option<String>,
    pub total_price: Decimal,
}

/// Start a pending checkout session.
///
/// POST /api/checkout
///
/// # Errors
///
/// Returns 400 when the item list is empty.
pub async fn start(
    State(state): State<AppState>,
    RequireAuth(authed): RequireAuth,
    Json(payload): Json<StartCheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutSession>)> {
    let session = CheckoutSession::new(
        authed.id,
        payload.checkout_items,
        payload.shipping_address,
        payload.payment_method,
        payload.total_price,
        Utc::now(),
    )?;

    CheckoutRepository::new(state.pool()).insert(&session).await?;
    tracing::info!(checkout_id = %session.id, "Checkout started");

    Ok((StatusCode::CREATED, Json(session)))
}

/// Payment callback payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub payment_status: String,
    pub payment_details: Option<serde_json::Value>,
}

/// Record a payment callback on a session.
///
/// PUT /api/checkout/{id}/pay
///
/// A reported status other than `paid` rejects the whole update.
///
/// # Errors
///
/// Returns 404 when the session is absent, 409 on a non-paid status.
pub async fn pay(
    State(state): State<AppState>,
    RequireAuth(_authed): RequireAuth,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentRequest>,
) -> Result<Json<CheckoutSession>> {
    let status = payload
        .payment_status
        .parse::<PaymentStatus>()
        .map_err(|_| AppError::Validation("Invalid payment status".to_string()))?;

    let session = CheckoutRepository::new(state.pool())
        .mark_paid(CheckoutId::new(id), status, payload.payment_details, Utc::now())
        .await?;

    Ok(Json(session))
}

/// Convert a paid session into an order.
///
/// POST /api/checkout/{id}/finalize
///
/// Deletes the user's cart as a side effect; retrying after success fails
/// with 409 and never creates a second order.
///
/// # Errors
///
/// Returns 404 when the session is absent, 409 when unpaid or already
/// finalized.
pub async fn finalize(
    State(state): State<AppState>,
    RequireAuth(_authed): RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = CheckoutRepository::new(state.pool())
        .finalize(CheckoutId::new(id), Utc::now())
        .await?;

    tracing::info!(checkout_id = %id, order_id = %order.id, "Checkout finalized");
    Ok((StatusCode::CREATED, Json(order)))
}
