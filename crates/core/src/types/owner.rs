//! Cart ownership: a registered user or an anonymous guest, never both.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Errors that can occur when parsing a [`GuestId`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum GuestIdError {
    /// The input string is empty (or whitespace only).
    #[error("guest id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("guest id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A transient token identifying an unauthenticated shopper's cart.
///
/// Clients mint one the first time an anonymous shopper adds to cart and
/// echo it on every cart request until the shopper signs in, at which point
/// the guest cart is merged into the user cart and the token is retired.
/// The server also mints one when an add-to-cart arrives with no identity
/// at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct GuestId(String);

impl GuestId {
    /// Maximum accepted token length.
    pub const MAX_LENGTH: usize = 64;

    /// Prefix used for server-minted tokens.
    pub const PREFIX: &'static str = "guest_";

    /// Parse a client-supplied guest token, trimming surrounding whitespace.
    ///
    /// Tokens are opaque: any non-empty string within the length limit is
    /// accepted, whether or not it carries the `guest_` prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or too long.
    pub fn parse(s: &str) -> Result<Self, GuestIdError> {
        let s = s.trim();

        if s.is_empty() {
            return Err(GuestIdError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(GuestIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Mint a fresh server-side guest token.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, uuid::Uuid::new_v4().simple()))
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `GuestId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for GuestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for GuestId {
    type Err = GuestIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The identity a cart belongs to.
///
/// A cart is owned by exactly one identity at a time. Representing that as
/// an enum (rather than a pair of optional fields) makes the "never both,
/// never neither" rule unrepresentable to break in memory; the storage
/// layer mirrors it with a CHECK constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
    /// A signed-in shopper, keyed by account id.
    User(UserId),
    /// An anonymous shopper, keyed by guest token.
    Guest(GuestId),
}

impl Owner {
    /// Returns the user id when this owner is a signed-in shopper.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Guest(_) => None,
        }
    }

    /// Returns the guest token when this owner is an anonymous shopper.
    #[must_use]
    pub const fn guest_id(&self) -> Option<&GuestId> {
        match self {
            Self::User(_) => None,
            Self::Guest(id) => Some(id),
        }
    }

    /// True when this owner is a signed-in shopper.
    #[must_use]
    pub const fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Guest(id) => write!(f, "guest:{id}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_has_prefix() {
        let guest = GuestId::generate();
        assert!(guest.as_str().starts_with(GuestId::PREFIX));
        assert!(guest.as_str().len() <= GuestId::MAX_LENGTH);
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(GuestId::generate(), GuestId::generate());
    }

    #[test]
    fn test_parse_trims() {
        let guest = GuestId::parse("  guest_1712654321  ").unwrap();
        assert_eq!(guest.as_str(), "guest_1712654321");
    }

    #[test]
    fn test_parse_accepts_unprefixed_tokens() {
        assert!(GuestId::parse("session-4271").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(GuestId::parse("   "), Err(GuestIdError::Empty)));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "g".repeat(65);
        assert!(matches!(
            GuestId::parse(&long),
            Err(GuestIdError::TooLong { .. })
        ));
    }

    #[test]
    fn test_owner_accessors() {
        let user_id = UserId::generate();
        let owner = Owner::User(user_id);
        assert!(owner.is_user());
        assert_eq!(owner.user_id(), Some(user_id));
        assert_eq!(owner.guest_id(), None);

        let guest = GuestId::generate();
        let owner = Owner::Guest(guest.clone());
        assert!(!owner.is_user());
        assert_eq!(owner.user_id(), None);
        assert_eq!(owner.guest_id(), Some(&guest));
    }

    #[test]
    fn test_owner_display() {
        let guest = Owner::Guest(GuestId::parse("guest_abc").unwrap());
        assert_eq!(guest.to_string(), "guest:guest_abc");
    }
}
