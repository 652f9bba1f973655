//! User account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cedar_twine_core::{Email, Role, UserId};

/// A registered account.
///
/// The password hash is deliberately not part of this struct; it only ever
/// travels through `db::users::get_password_hash`, so serializing a `User`
/// into a response body can never leak it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serializes_without_password_fields() {
        let now = Utc::now();
        let user = User {
            id: UserId::generate(),
            name: "Maya".to_string(),
            email: Email::parse("maya@example.com").unwrap(),
            role: Role::Customer,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value.get("role").unwrap(), "customer");
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
    }
}
