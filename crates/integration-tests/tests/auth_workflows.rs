//! Account workflow tests: password hashing round trip and the token
//! lifecycle that carries a role from login to an admin check.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;

use cedar_twine_api::middleware::TokenService;
use cedar_twine_api::services::auth;
use cedar_twine_core::{Role, UserId};

fn token_service() -> TokenService {
    TokenService::new(&SecretString::from("0123456789abcdef0123456789abcdef"), 40)
}

#[test]
fn password_round_trip_accepts_the_original_and_rejects_others() {
    let hash = auth::hash_password("correct horse battery").unwrap();

    assert!(auth::verify_password("correct horse battery", &hash).is_ok());
    assert!(auth::verify_password("wrong horse battery", &hash).is_err());
}

#[test]
fn short_passwords_fail_the_policy_before_hashing() {
    assert!(auth::validate_password("short").is_err());
    assert!(auth::validate_password("long enough").is_ok());
}

#[test]
fn token_carries_identity_and_role_from_login_to_admin_check() {
    let tokens = token_service();
    let customer = UserId::generate();
    let admin = UserId::generate();

    let customer_token = tokens.issue(customer, Role::Customer).unwrap();
    let admin_token = tokens.issue(admin, Role::Admin).unwrap();

    let authed = tokens.verify(&customer_token).unwrap();
    assert_eq!(authed.id, customer);
    assert!(!authed.is_admin());

    let authed = tokens.verify(&admin_token).unwrap();
    assert_eq!(authed.id, admin);
    assert!(authed.is_admin());
}

#[test]
fn tampered_tokens_are_rejected() {
    let tokens = token_service();
    let token = tokens.issue(UserId::generate(), Role::Customer).unwrap();

    let mut tampered = token.clone();
    tampered.push('x');
    assert!(tokens.verify(&tampered).is_err());

    let other_service = TokenService::new(
        &SecretString::from("fedcba9876543210fedcba9876543210"),
        40,
    );
    assert!(other_service.verify(&token).is_err());
}
