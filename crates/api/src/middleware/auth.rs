//! Bearer-token authentication: the token service and request extractors.
//!
//! Tokens are stateless HS256 JWTs carrying the user id and role. Handlers
//! opt into authentication through extractors:
//!
//! - [`RequireAuth`] - any valid bearer token
//! - [`RequireAdmin`] - valid token with the admin role
//! - [`OptionalAuth`] - token if present and valid, otherwise `None`

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use cedar_twine_core::{Role, UserId};

use crate::error::AppError;
use crate::state::AppState;

/// Errors from issuing or verifying a bearer token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// No `Authorization: Bearer` header on the request.
    #[error("Authentication required")]
    Missing,
    /// The token's expiry has passed.
    #[error("Token expired")]
    Expired,
    /// The token is malformed or its signature doesn't verify.
    #[error("Invalid token")]
    Invalid,
    /// Signing a new token failed.
    #[error("Token generation failed: {0}")]
    Generation(String),
}

/// Claims carried in the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    /// Account role.
    pub role: Role,
    /// Issued-at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

/// The identity a verified token resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthedUser {
    pub id: UserId,
    pub role: Role,
}

impl AuthedUser {
    /// True when this account carries the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Issues and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenService {
    /// Create a token service from the signing secret and expiry.
    #[must_use]
    pub fn new(secret: &secrecy::SecretString, expiry_hours: i64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry: Duration::hours(expiry_hours),
        }
    }

    /// Issue a signed token for a user.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Generation`] if signing fails.
    pub fn issue(&self, user_id: UserId, role: Role) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.as_uuid(),
            role,
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Verify a token and return the identity it carries.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] or [`TokenError::Invalid`].
    pub fn verify(&self, token: &str) -> Result<AuthedUser, TokenError> {
        let validation = Validation::new(Algorithm::HS256);

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;

        Ok(AuthedUser {
            id: UserId::new(data.claims.sub),
            role: data.claims.role,
        })
    }
}

/// Pull the bearer token out of the `Authorization` header.
fn bearer_token(parts: &Parts) -> Result<&str, TokenError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(TokenError::Missing)
}

/// Extractor that requires a valid bearer token.
pub struct RequireAuth(pub AuthedUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(parts)?;
        let user = state.tokens().verify(token)?;
        Ok(Self(user))
    }
}

/// Extractor that requires a valid bearer token with the admin role.
pub struct RequireAdmin(pub AuthedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_owned()));
        }

        Ok(Self(user))
    }
}

/// Extractor that resolves the bearer token when present.
///
/// A missing, malformed, or expired token yields `None` rather than a
/// rejection; cart routes serve guests and signed-in shoppers alike.
pub struct OptionalAuth(pub Option<AuthedUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let user = bearer_token(parts)
            .and_then(|token| state.tokens().verify(token))
            .map_err(|e| {
                if !matches!(e, TokenError::Missing) {
                    tracing::debug!(error = %e, "Ignoring unusable bearer token");
                }
            })
            .ok();

        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn service() -> TokenService {
        TokenService::new(&SecretString::from("kQ9vR2mX7pL4nB8cJ3wF6tZ1hY5dG0sA"), 40)
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let tokens = service();
        let user_id = UserId::generate();

        let token = tokens.issue(user_id, Role::Customer).unwrap();
        let user = tokens.verify(&token).unwrap();

        assert_eq!(user.id, user_id);
        assert_eq!(user.role, Role::Customer);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_admin_role_survives_the_token() {
        let tokens = service();
        let token = tokens.issue(UserId::generate(), Role::Admin).unwrap();
        assert!(tokens.verify(&token).unwrap().is_admin());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let tokens = service();
        assert!(matches!(
            tokens.verify("not-a-token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = service().issue(UserId::generate(), Role::Customer).unwrap();

        let other =
            TokenService::new(&SecretString::from("zW4uT8qN1rE6yK3oP9aS5dH2fJ7gL0xC"), 40);
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_verify_rejects_expired() {
        let tokens = TokenService::new(
            &SecretString::from("kQ9vR2mX7pL4nB8cJ3wF6tZ1hY5dG0sA"),
            -1,
        );
        let token = tokens.issue(UserId::generate(), Role::Customer).unwrap();
        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }
}
