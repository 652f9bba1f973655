//! Account routes: registration, login, and the profile read.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use cedar_twine_core::{Email, Role};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::auth::{self, AuthError};
use crate::state::AppState;

/// Request to register a new account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request to log in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public user record plus a fresh bearer token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Register a new account.
///
/// POST /api/users/register
///
/// # Errors
///
/// Returns 400 on an invalid email or weak password, 409 when the email
/// already has an account.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    let email = Email::parse(&payload.email)
        .map_err(|e| AppError::Validation(e.to_string()))?
        .normalized();
    auth::validate_password(&payload.password)?;

    let password_hash = auth::hash_password(&payload.password)?;

    let repo = UserRepository::new(state.pool());
    let user = repo
        .create(payload.name.trim(), &email, &password_hash, Role::Customer)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::Auth(AuthError::UserAlreadyExists),
            other => AppError::Database(other),
        })?;

    let token = state.tokens().issue(user.id, user.role)?;
    tracing::info!(user_id = %user.id, "Account registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// Log in with email and password.
///
/// POST /api/users/login
///
/// Unknown email and wrong password produce the same 401 so responses
/// can't be used to probe which emails have accounts.
///
/// # Errors
///
/// Returns 401 on bad credentials.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = Email::parse(&payload.email)
        .map_err(|_| AppError::Auth(AuthError::InvalidCredentials))?
        .normalized();

    let repo = UserRepository::new(state.pool());
    let (user, password_hash) = repo
        .get_password_hash(&email)
        .await?
        .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

    auth::verify_password(&payload.password, &password_hash)?;

    let token = state.tokens().issue(user.id, user.role)?;

    Ok(Json(AuthResponse { user, token }))
}

/// Return the authenticated user's public record.
///
/// GET /api/users/profile
///
/// # Errors
///
/// Returns 404 when the account behind the token no longer exists.
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(authed): RequireAuth,
) -> Result<Json<User>> {
    let repo = UserRepository::new(state.pool());
    let user = repo
        .get_by_id(authed.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
