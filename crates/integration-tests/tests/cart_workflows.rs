//! Cart workflow tests: totals, line identity, and guest-to-user merge.

#![allow(clippy::unwrap_used)]

use chrono::Duration;
use rust_decimal::Decimal;

use cedar_twine_core::cart::{Cart, CartError};
use cedar_twine_core::{GuestId, Owner, ProductId};

use cedar_twine_integration_tests::{fixed_now, snapshot, user_id};

fn expected_total(cart: &Cart) -> Decimal {
    cart.lines
        .iter()
        .map(|line| line.price * Decimal::from(line.quantity))
        .sum()
}

#[test]
fn total_tracks_every_mutation() {
    let now = fixed_now();
    let product = ProductId::generate();
    let mut cart = Cart::new(Owner::Guest(GuestId::generate()), now);

    cart.add_item(snapshot(product, 1000), "M".into(), "Red".into(), 2, now);
    assert_eq!(cart.total_price, Decimal::new(2000, 2));
    assert_eq!(cart.lines.len(), 1);

    cart.add_item(snapshot(product, 1000), "M".into(), "Red".into(), 1, now);
    assert_eq!(cart.lines.len(), 1, "same triple merges into one line");
    assert_eq!(cart.total_price, Decimal::new(3000, 2));

    cart.add_item(snapshot(product, 1000), "L".into(), "Red".into(), 1, now);
    assert_eq!(cart.lines.len(), 2, "different size is a new line");

    cart.set_item_quantity(product, "M", "Red", 5, now).unwrap();
    assert_eq!(cart.total_price, expected_total(&cart));

    cart.remove_item(product, "L", "Red", now).unwrap();
    assert_eq!(cart.total_price, expected_total(&cart));
    assert_eq!(cart.lines.len(), 1);
}

#[test]
fn zero_quantity_removes_the_line() {
    let now = fixed_now();
    let product = ProductId::generate();
    let mut cart = Cart::new(Owner::User(user_id()), now);

    cart.add_item(snapshot(product, 1500), "S".into(), "Black".into(), 3, now);
    cart.set_item_quantity(product, "S", "Black", 0, now).unwrap();

    assert!(cart.is_empty());
    assert_eq!(cart.total_price, Decimal::ZERO);
}

#[test]
fn mutating_a_missing_line_is_not_found() {
    let now = fixed_now();
    let mut cart = Cart::new(Owner::User(user_id()), now);

    let missing = ProductId::generate();
    assert_eq!(
        cart.set_item_quantity(missing, "M", "Red", 1, now),
        Err(CartError::LineNotFound)
    );
    assert_eq!(
        cart.remove_item(missing, "M", "Red", now),
        Err(CartError::LineNotFound)
    );
}

#[test]
fn merge_adds_matching_lines_and_appends_the_rest() {
    let now = fixed_now();
    let shared = ProductId::generate();
    let guest_only = ProductId::generate();

    let user = user_id();
    let mut user_cart = Cart::new(Owner::User(user), now);
    user_cart.add_item(snapshot(shared, 1000), "M".into(), "Red".into(), 2, now);

    let mut guest_cart = Cart::new(Owner::Guest(GuestId::generate()), now);
    guest_cart.add_item(snapshot(shared, 1000), "M".into(), "Red".into(), 1, now);
    guest_cart.add_item(snapshot(guest_only, 2500), "L".into(), "Blue".into(), 1, now);

    let later = now + Duration::minutes(5);
    user_cart.merge_from(guest_cart, later);

    assert_eq!(user_cart.lines.len(), 2);
    assert_eq!(
        user_cart.find_line(shared, "M", "Red").unwrap().quantity,
        3,
        "matching triples add quantities"
    );
    assert_eq!(
        user_cart.find_line(guest_only, "L", "Blue").unwrap().quantity,
        1
    );
    assert_eq!(user_cart.total_price, expected_total(&user_cart));
    assert_eq!(user_cart.updated_at, later);
}

#[test]
fn reassigning_a_guest_cart_transfers_ownership_and_contents() {
    let now = fixed_now();
    let product = ProductId::generate();
    let mut cart = Cart::new(Owner::Guest(GuestId::generate()), now);
    cart.add_item(snapshot(product, 4200), "M".into(), "Natural".into(), 1, now);
    let total_before = cart.total_price;

    let user = user_id();
    cart.reassign_to_user(user, now);

    assert_eq!(cart.owner, Owner::User(user));
    assert_eq!(cart.total_price, total_before, "transfer, not copy");
    assert_eq!(cart.lines.len(), 1);
}

#[test]
fn merge_consumes_the_guest_cart_so_a_retry_has_nothing_to_apply() {
    let now = fixed_now();
    let shared = ProductId::generate();

    let mut guest_cart = Cart::new(Owner::Guest(GuestId::generate()), now);
    guest_cart.add_item(snapshot(shared, 1000), "M".into(), "Red".into(), 1, now);

    let mut user_cart = Cart::new(Owner::User(user_id()), now);
    user_cart.add_item(snapshot(shared, 1000), "M".into(), "Red".into(), 2, now);

    // First merge consumes the guest cart (the storage layer deletes its
    // row in the same transaction). A retried merge finds no guest cart and
    // returns the user cart unchanged, modeled here as absorbing an empty
    // one.
    user_cart.merge_from(guest_cart, now);
    let lines_after_first = user_cart.lines.clone();
    let total_after_first = user_cart.total_price;

    user_cart.merge_from(Cart::new(Owner::Guest(GuestId::generate()), now), now);

    assert_eq!(user_cart.lines, lines_after_first);
    assert_eq!(user_cart.total_price, total_after_first);
    assert_eq!(user_cart.find_line(shared, "M", "Red").unwrap().quantity, 3);
}
