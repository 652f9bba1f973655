//! Admin routes: user management, full catalog and order listings,
//! order status updates. All handlers require the admin role.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use cedar_twine_core::order::Order;
use cedar_twine_core::product::Product;
use cedar_twine_core::{Email, OrderId, OrderStatus, Role, UserId};

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::db::products::{ProductFilter, ProductRepository};
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::User;
use crate::services::auth::{self, AuthError};
use crate::state::AppState;

/// All accounts, newest first.
///
/// GET /api/admin/users
///
/// # Errors
///
/// Returns 500 on a storage failure.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(Json(users))
}

/// Request to create an account from the admin surface.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// Create an account; role defaults to customer.
///
/// POST /api/admin/users
///
/// # Errors
///
/// Returns 409 on a duplicate email, 400 on invalid input.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    let email = Email::parse(&payload.email)
        .map_err(|e| AppError::Validation(e.to_string()))?
        .normalized();
    let role = payload
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|_| AppError::Validation("Invalid role".to_string()))?
        .unwrap_or(Role::Customer);

    auth::validate_password(&payload.password)?;
    let password_hash = auth::hash_password(&payload.password)?;

    let user = UserRepository::new(state.pool())
        .create(payload.name.trim(), &email, &password_hash, role)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::Auth(AuthError::UserAlreadyExists),
            other => AppError::Database(other),
        })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Partial account update. Absent fields keep current values.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Update an account's name, email, or role.
///
/// PUT /api/admin/users/{id}
///
/// # Errors
///
/// Returns 404 when absent, 409 when the new email is taken.
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let email = payload
        .email
        .as_deref()
        .map(Email::parse)
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))?
        .map(|e| e.normalized());
    let role = payload
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|_| AppError::Validation("Invalid role".to_string()))?;

    let user = UserRepository::new(state.pool())
        .update(UserId::new(id), payload.name.as_deref(), email.as_ref(), role)
        .await?;

    Ok(Json(user))
}

/// Delete an account.
///
/// DELETE /api/admin/users/{id}
///
/// # Errors
///
/// Returns 404 when the account does not exist.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    UserRepository::new(state.pool())
        .delete(UserId::new(id))
        .await?;

    Ok(Json(json!({ "message": "User deleted" })))
}

/// The whole catalog, unpublished entries included.
///
/// GET /api/admin/products
///
/// # Errors
///
/// Returns 500 on a storage failure.
pub async fn list_products(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list(&ProductFilter::default())
        .await?;

    Ok(Json(products))
}

/// All orders, newest first.
///
/// GET /api/admin/orders
///
/// # Errors
///
/// Returns 500 on a storage failure.
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(orders))
}

/// Request to move an order along its delivery lifecycle.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusRequest {
    pub status: String,
}

/// Update an order's delivery status.
///
/// PUT /api/admin/orders/{id}
///
/// A status of `Delivered` also stamps the delivery flag and timestamp.
///
/// # Errors
///
/// Returns 404 when absent, 400 on an unknown status.
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrderStatusRequest>,
) -> Result<Json<Order>> {
    let status = payload
        .status
        .parse::<OrderStatus>()
        .map_err(|_| AppError::Validation("Invalid order status".to_string()))?;

    let order = OrderRepository::new(state.pool())
        .set_status(OrderId::new(id), status, Utc::now())
        .await?;

    Ok(Json(order))
}

/// Delete an order.
///
/// DELETE /api/admin/orders/{id}
///
/// # Errors
///
/// Returns 404 when the order does not exist.
pub async fn delete_order(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    OrderRepository::new(state.pool())
        .delete(OrderId::new(id))
        .await?;

    Ok(Json(json!({ "message": "Order deleted" })))
}
