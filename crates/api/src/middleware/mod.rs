//! Request middleware and extractors.

pub mod auth;

pub use auth::{AuthedUser, OptionalAuth, RequireAdmin, RequireAuth, TokenService};
