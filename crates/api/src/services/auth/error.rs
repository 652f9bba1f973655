//! Authentication error types.

use thiserror::Error;

use cedar_twine_core::EmailError;

/// Errors that can occur during credential handling.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately one variant for both so
    /// responses can't be used to probe which emails have accounts.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration against an email that already has an account.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password fails the policy.
    #[error("{0}")]
    WeakPassword(String),

    /// Email fails to parse.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Hashing or hash parsing failed.
    #[error("hash error: {0}")]
    Hash(String),
}
