//! Checkout session state machine.
//!
//! A session is a snapshot of what the shopper intends to buy, created at
//! checkout-start and advanced by exactly two transitions:
//!
//! ```text
//! pending --mark_paid--> paid --finalize--> finalized
//! ```
//!
//! Neither transition ever runs backward. Finalization is the irreversible
//! step that materializes an [`Order`](crate::order::Order) and retires the
//! shopper's cart; the guards here are what make a retried finalize request
//! unable to mint a second order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CheckoutId, PaymentStatus, ProductId, UserId};

/// Errors that can occur when creating or advancing a [`CheckoutSession`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// A session cannot be started with an empty item list.
    #[error("no items in checkout")]
    NoItems,
    /// The payment callback reported something other than `paid`.
    #[error("invalid payment status: {0}")]
    PaymentNotConfirmed(PaymentStatus),
    /// The session has already been finalized.
    #[error("checkout has already been finalized")]
    AlreadyFinalized,
    /// The session has not been paid yet.
    #[error("checkout is not paid yet")]
    NotPaid,
}

/// One item in a checkout snapshot.
///
/// Copied from the cart at checkout-start (by the client, in the reference
/// flow) and copied again onto the order at finalize time. Never a live
/// reference to the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Decimal,
    pub quantity: u32,
}

/// Where the order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// A checkout session.
///
/// Invariant: `is_finalized` implies `is_paid`; both flags only ever go
/// from `false` to `true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub id: CheckoutId,
    pub user_id: UserId,
    pub items: Vec<CheckoutItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub total_price: Decimal,
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_status: PaymentStatus,
    /// Opaque payload from the payment provider, stored as given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<serde_json::Value>,
    pub is_finalized: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CheckoutSession {
    /// Payment method recorded when the client does not name one.
    pub const DEFAULT_PAYMENT_METHOD: &'static str = "Paypal";

    /// Start a pending session from a snapshot of items.
    ///
    /// The shopper's cart is left untouched; it is only retired at
    /// finalize time.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NoItems`] when `items` is empty.
    pub fn new(
        user_id: UserId,
        items: Vec<CheckoutItem>,
        shipping_address: ShippingAddress,
        payment_method: Option<String>,
        total_price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Self, CheckoutError> {
        if items.is_empty() {
            return Err(CheckoutError::NoItems);
        }

        Ok(Self {
            id: CheckoutId::generate(),
            user_id,
            items,
            shipping_address,
            payment_method: payment_method
                .unwrap_or_else(|| Self::DEFAULT_PAYMENT_METHOD.to_owned()),
            total_price,
            is_paid: false,
            paid_at: None,
            payment_status: PaymentStatus::Pending,
            payment_details: None,
            is_finalized: false,
            finalized_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Record a successful payment callback.
    ///
    /// Rejects the whole update when the reported status is anything other
    /// than [`PaymentStatus::Paid`]; a failed callback leaves the session
    /// exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::PaymentNotConfirmed`] for non-`paid` statuses.
    pub fn mark_paid(
        &mut self,
        status: PaymentStatus,
        details: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<(), CheckoutError> {
        if status != PaymentStatus::Paid {
            return Err(CheckoutError::PaymentNotConfirmed(status));
        }

        self.is_paid = true;
        self.payment_status = status;
        self.payment_details = details;
        self.paid_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Mark the session finalized.
    ///
    /// The caller is responsible for materializing the order from the same
    /// snapshot (see [`Order::materialize`](crate::order::Order::materialize))
    /// and for retiring the shopper's cart; this method only guards and
    /// advances the session state.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AlreadyFinalized`] on a second call and
    /// [`CheckoutError::NotPaid`] when payment has not been recorded.
    pub fn finalize(&mut self, now: DateTime<Utc>) -> Result<(), CheckoutError> {
        if self.is_finalized {
            return Err(CheckoutError::AlreadyFinalized);
        }
        if !self.is_paid {
            return Err(CheckoutError::NotPaid);
        }

        self.is_finalized = true;
        self.finalized_at = Some(now);
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_items() -> Vec<CheckoutItem> {
        vec![
            CheckoutItem {
                product_id: ProductId::generate(),
                name: "Linen Camp Shirt".into(),
                image: "https://media.example.com/ct/lcs-front.jpg".into(),
                price: Decimal::new(6400, 2),
                quantity: 1,
            },
            CheckoutItem {
                product_id: ProductId::generate(),
                name: "Selvedge Denim Jacket".into(),
                image: "https://media.example.com/ct/sdj-front.jpg".into(),
                price: Decimal::new(14800, 2),
                quantity: 2,
            },
        ]
    }

    fn sample_address() -> ShippingAddress {
        ShippingAddress {
            address: "12 Alder Row".into(),
            city: "Portland".into(),
            postal_code: "97209".into(),
            country: "USA".into(),
        }
    }

    fn pending_session() -> CheckoutSession {
        CheckoutSession::new(
            UserId::generate(),
            sample_items(),
            sample_address(),
            None,
            Decimal::new(36000, 2),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_session_is_pending() {
        let session = pending_session();
        assert!(!session.is_paid);
        assert!(!session.is_finalized);
        assert_eq!(session.payment_status, PaymentStatus::Pending);
        assert_eq!(session.payment_method, "Paypal");
        assert!(session.paid_at.is_none());
    }

    #[test]
    fn test_new_session_rejects_empty_items() {
        let err = CheckoutSession::new(
            UserId::generate(),
            Vec::new(),
            sample_address(),
            None,
            Decimal::ZERO,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, CheckoutError::NoItems);
    }

    #[test]
    fn test_explicit_payment_method_is_kept() {
        let session = CheckoutSession::new(
            UserId::generate(),
            sample_items(),
            sample_address(),
            Some("Stripe".into()),
            Decimal::new(36000, 2),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(session.payment_method, "Stripe");
    }

    #[test]
    fn test_mark_paid_sets_payment_fields() {
        let mut session = pending_session();
        let details = serde_json::json!({ "transactionId": "txn_93k1" });
        let now = Utc::now();

        session
            .mark_paid(PaymentStatus::Paid, Some(details.clone()), now)
            .unwrap();

        assert!(session.is_paid);
        assert_eq!(session.payment_status, PaymentStatus::Paid);
        assert_eq!(session.payment_details, Some(details));
        assert_eq!(session.paid_at, Some(now));
    }

    #[test]
    fn test_mark_paid_rejects_failed_status_without_partial_update() {
        let mut session = pending_session();
        let before = session.clone();

        let err = session
            .mark_paid(
                PaymentStatus::Failed,
                Some(serde_json::json!({ "reason": "card_declined" })),
                Utc::now(),
            )
            .unwrap_err();

        assert_eq!(err, CheckoutError::PaymentNotConfirmed(PaymentStatus::Failed));
        // The whole update is rejected; the session stays pending.
        assert_eq!(session, before);
    }

    #[test]
    fn test_finalize_requires_payment() {
        let mut session = pending_session();
        assert_eq!(session.finalize(Utc::now()).unwrap_err(), CheckoutError::NotPaid);
        assert!(!session.is_finalized);
    }

    #[test]
    fn test_finalize_paid_session() {
        let mut session = pending_session();
        session
            .mark_paid(PaymentStatus::Paid, None, Utc::now())
            .unwrap();

        let now = Utc::now();
        session.finalize(now).unwrap();

        assert!(session.is_finalized);
        assert_eq!(session.finalized_at, Some(now));
    }

    #[test]
    fn test_finalize_twice_fails() {
        let mut session = pending_session();
        session
            .mark_paid(PaymentStatus::Paid, None, Utc::now())
            .unwrap();
        session.finalize(Utc::now()).unwrap();

        assert_eq!(
            session.finalize(Utc::now()).unwrap_err(),
            CheckoutError::AlreadyFinalized
        );
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let session = pending_session();
        let value = serde_json::to_value(&session).unwrap();
        assert!(value.get("totalPrice").is_some());
        assert!(value.get("isPaid").is_some());
        assert!(value.get("shippingAddress").is_some());
        assert!(
            value
                .get("shippingAddress")
                .and_then(|a| a.get("postalCode"))
                .is_some()
        );
    }
}
