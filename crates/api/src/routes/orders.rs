//! Order read routes for shoppers.

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use cedar_twine_core::OrderId;
use cedar_twine_core::order::Order;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// The authenticated user's orders, newest first.
///
/// GET /api/orders/my-orders
///
/// # Errors
///
/// Returns 500 on a storage failure.
pub async fn my_orders(
    State(state): State<AppState>,
    RequireAuth(authed): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(authed.id)
        .await?;

    Ok(Json(orders))
}

/// Single order fetch. Owner or admin only.
///
/// GET /api/orders/{id}
///
/// # Errors
///
/// Returns 404 when absent, 403 when the requester is neither the owner
/// nor an admin.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(authed): RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get_by_id(OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    if order.user_id != authed.id && !authed.is_admin() {
        return Err(AppError::Forbidden(
            "Not authorized to view this order".to_string(),
        ));
    }

    Ok(Json(order))
}
