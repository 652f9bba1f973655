//! Cart routes.
//!
//! Every cart endpoint works for both signed-in shoppers (bearer token)
//! and guests (a `guestId` echoed by the client). When an add-to-cart
//! arrives with no identity at all, the server mints a guest token and
//! returns it on the cart's owner.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use cedar_twine_core::cart::Cart;
use cedar_twine_core::{GuestId, Owner, ProductId};

use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::state::AppState;

fn parse_guest_id(raw: Option<&str>) -> Result<Option<GuestId>> {
    raw.map(GuestId::parse)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Query parameters identifying a guest's cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuery {
    pub guest_id: Option<String>,
}

/// Fetch the cart for the requesting identity.
///
/// GET /api/cart
///
/// # Errors
///
/// Returns 404 when the identity has no cart.
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(authed): OptionalAuth,
    Query(query): Query<CartQuery>,
) -> Result<Json<Cart>> {
    let guest_id = parse_guest_id(query.guest_id.as_deref())?;

    let cart = CartRepository::new(state.pool())
        .find_for_identity(authed.map(|u| u.id), guest_id.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

    Ok(Json(cart))
}

fn default_quantity() -> u32 {
    1
}

/// Request to add an item to a cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub guest_id: Option<String>,
}

/// Add an item to the cart, creating the cart if needed.
///
/// POST /api/cart
///
/// The added line snapshots the product's current name, base price, and
/// first image. Adding the same (product, size, color) again increments
/// the existing line.
///
/// # Errors
///
/// Returns 404 when the product does not exist, 400 on a zero quantity.
pub async fn add_item(
    State(state): State<AppState>,
    OptionalAuth(authed): OptionalAuth,
    Json(payload): Json<AddItemRequest>,
) -> Result<Json<Cart>> {
    if payload.quantity == 0 {
        return Err(AppError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }
    let guest_id = parse_guest_id(payload.guest_id.as_deref())?;

    let product = ProductRepository::new(state.pool())
        .get_by_id(ProductId::new(payload.product_id))
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let now = Utc::now();
    let repo = CartRepository::new(state.pool());
    let existing = repo
        .find_for_identity(authed.map(|u| u.id), guest_id.as_ref())
        .await?;

    let cart = match existing {
        Some(mut cart) => {
            cart.add_item(
                product.snapshot(),
                payload.size,
                payload.color,
                payload.quantity,
                now,
            );
            repo.save(&cart).await?;
            cart
        }
        None => {
            let owner = match (authed, guest_id) {
                (Some(user), _) => Owner::User(user.id),
                (None, Some(guest_id)) => Owner::Guest(guest_id),
                (None, None) => Owner::Guest(GuestId::generate()),
            };
            let mut cart = Cart::new(owner, now);
            cart.add_item(
                product.snapshot(),
                payload.size,
                payload.color,
                payload.quantity,
                now,
            );
            repo.insert(&cart).await?;
            cart
        }
    };

    Ok(Json(cart))
}

/// Request to overwrite a line's quantity.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetQuantityRequest {
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub guest_id: Option<String>,
}

/// Overwrite the quantity of an existing line; zero removes it.
///
/// PUT /api/cart
///
/// # Errors
///
/// Returns 404 when there is no cart or no matching line.
pub async fn set_quantity(
    State(state): State<AppState>,
    OptionalAuth(authed): OptionalAuth,
    Json(payload): Json<SetQuantityRequest>,
) -> Result<Json<Cart>> {
    let guest_id = parse_guest_id(payload.guest_id.as_deref())?;

    let repo = CartRepository::new(state.pool());
    let mut cart = repo
        .find_for_identity(authed.map(|u| u.id), guest_id.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

    cart.set_item_quantity(
        ProductId::new(payload.product_id),
        &payload.size,
        &payload.color,
        payload.quantity,
        Utc::now(),
    )?;
    repo.save(&cart).await?;

    Ok(Json(cart))
}

/// Request to remove a line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
    pub guest_id: Option<String>,
}

/// Remove a line from the cart.
///
/// DELETE /api/cart
///
/// # Errors
///
/// Returns 404 when there is no cart or no matching line.
pub async fn remove_item(
    State(state): State<AppState>,
    OptionalAuth(authed): OptionalAuth,
    Json(payload): Json<RemoveItemRequest>,
) -> Result<Json<Cart>> {
    let guest_id = parse_guest_id(payload.guest_id.as_deref())?;

    let repo = CartRepository::new(state.pool());
    let mut cart = repo
        .find_for_identity(authed.map(|u| u.id), guest_id.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

    cart.remove_item(
        ProductId::new(payload.product_id),
        &payload.size,
        &payload.color,
        Utc::now(),
    )?;
    repo.save(&cart).await?;

    Ok(Json(cart))
}

/// Request to merge a guest cart into the signed-in user's cart.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub guest_id: String,
}

/// Merge the guest cart into the authenticated user's cart.
///
/// POST /api/cart/merge
///
/// Idempotent: once the guest cart is gone, the user's cart is returned
/// unchanged.
///
/// # Errors
///
/// Returns 400 when the guest cart exists but is empty, 404 when neither
/// cart exists.
pub async fn merge(
    State(state): State<AppState>,
    RequireAuth(authed): RequireAuth,
    Json(payload): Json<MergeRequest>,
) -> Result<Json<Cart>> {
    let guest_id =
        GuestId::parse(&payload.guest_id).map_err(|e| AppError::Validation(e.to_string()))?;

    let cart = CartRepository::new(state.pool())
        .merge_guest_into_user(&guest_id, authed.id, Utc::now())
        .await?;

    tracing::info!(user_id = %authed.id, "Guest cart merged");
    Ok(Json(cart))
}
