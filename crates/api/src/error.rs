//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures unexpected errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; the client always sees a JSON body with a
//! `message` field.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use cedar_twine_core::cart::CartError;
use cedar_twine_core::checkout::CheckoutError;

use crate::db::RepositoryError;
use crate::db::carts::MergeError;
use crate::db::checkouts::CheckoutUpdateError;
use crate::middleware::auth::TokenError;
use crate::services::auth::AuthError;
use crate::services::email::EmailError;
use crate::services::media::MediaError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid input in the request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request is valid but the entity is in the wrong state for it
    /// (unpaid checkout, double finalization, rejected payment status).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Uniqueness violated (duplicate user or subscriber email, SKU).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bearer token missing, malformed, or expired.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Credential or password-policy failure.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// The authenticated user lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Media host call failed.
    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    /// Mail transport failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-side failures to Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Media(_) | Self::Email(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidState(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Token(_) => StatusCode::UNAUTHORIZED,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Media(_) | Self::Email(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Internal server error".to_string(),
            },
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Media(_) => "Image upload service error".to_string(),
            Self::Email(_) => "Mail service error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Hash(_) => "Internal server error".to_string(),
            },
            Self::Validation(msg)
            | Self::NotFound(msg)
            | Self::InvalidState(msg)
            | Self::Conflict(msg)
            | Self::Forbidden(msg) => msg.clone(),
            Self::Token(err) => err.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<CartError> for AppError {
    fn from(_: CartError) -> Self {
        Self::NotFound("Item not found in cart".to_string())
    }
}

impl From<CheckoutError> for AppError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::NoItems => Self::Validation("No items in checkout".to_string()),
            CheckoutError::PaymentNotConfirmed(status) => {
                Self::InvalidState(format!("Invalid payment status: {status}"))
            }
            CheckoutError::AlreadyFinalized => {
                Self::InvalidState("Checkout has already been finalized".to_string())
            }
            CheckoutError::NotPaid => Self::InvalidState("Checkout is not paid yet".to_string()),
        }
    }
}

impl From<MergeError> for AppError {
    fn from(e: MergeError) -> Self {
        match e {
            MergeError::GuestCartEmpty => Self::Validation("Guest cart is empty".to_string()),
            MergeError::NotFound => Self::NotFound("Guest cart not found".to_string()),
            MergeError::Repository(e) => Self::Database(e),
        }
    }
}

impl From<CheckoutUpdateError> for AppError {
    fn from(e: CheckoutUpdateError) -> Self {
        match e {
            CheckoutUpdateError::NotFound => Self::NotFound("Checkout not found".to_string()),
            CheckoutUpdateError::State(e) => e.into(),
            CheckoutUpdateError::Repository(e) => Self::Database(e),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Cart not found".to_string());
        assert_eq!(err.to_string(), "Not found: Cart not found");

        let err = AppError::Validation("Email is required".to_string());
        assert_eq!(err.to_string(), "Validation error: Email is required");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::InvalidState("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                "email already exists".to_string()
            ))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let response =
            AppError::Internal("connection refused to 10.0.0.3:5432".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
