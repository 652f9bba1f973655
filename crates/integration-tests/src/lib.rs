//! Cross-crate workflow tests for Cedar & Twine.
//!
//! These tests exercise the cart-merge and checkout-finalization state
//! machines end to end at the domain level, with no live database: the
//! storage layer is thin enough that the interesting transitions all live
//! in `cedar-twine-core`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cedar-twine-integration-tests
//! ```

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use cedar_twine_core::checkout::{CheckoutItem, ShippingAddress};
use cedar_twine_core::product::ProductSnapshot;
use cedar_twine_core::{ProductId, UserId};

/// A fixed instant so assertions on timestamps are deterministic.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

/// A product snapshot fixture with the given id and price in cents.
#[must_use]
pub fn snapshot(product_id: ProductId, cents: i64) -> ProductSnapshot {
    ProductSnapshot {
        product_id,
        name: "Cedar Oxford Shirt".to_owned(),
        image: "https://cdn.example.com/oxford.jpg".to_owned(),
        price: Decimal::new(cents, 2),
    }
}

/// A checkout item fixture with the given price in cents and quantity.
#[must_use]
pub fn checkout_item(product_id: ProductId, cents: i64, quantity: u32) -> CheckoutItem {
    CheckoutItem {
        product_id,
        name: "Cedar Oxford Shirt".to_owned(),
        image: "https://cdn.example.com/oxford.jpg".to_owned(),
        price: Decimal::new(cents, 2),
        quantity,
    }
}

/// A shipping address fixture.
#[must_use]
pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        address: "12 Forest Lane".to_owned(),
        city: "Portland".to_owned(),
        postal_code: "97201".to_owned(),
        country: "US".to_owned(),
    }
}

/// A fresh user id fixture.
#[must_use]
pub fn user_id() -> UserId {
    UserId::generate()
}
