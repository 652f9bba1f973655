//! Checkout-to-order workflow tests: payment state transitions, the
//! finalize-once guard, and order materialization.

#![allow(clippy::unwrap_used)]

use chrono::Duration;
use rust_decimal::Decimal;
use serde_json::json;

use cedar_twine_core::checkout::{CheckoutError, CheckoutSession};
use cedar_twine_core::order::Order;
use cedar_twine_core::{OrderStatus, PaymentStatus, ProductId};

use cedar_twine_integration_tests::{checkout_item, fixed_now, shipping_address, user_id};

fn pending_session() -> CheckoutSession {
    let product = ProductId::generate();
    CheckoutSession::new(
        user_id(),
        vec![checkout_item(product, 6400, 2)],
        shipping_address(),
        None,
        Decimal::new(12800, 2),
        fixed_now(),
    )
    .unwrap()
}

#[test]
fn checkout_requires_items() {
    let result = CheckoutSession::new(
        user_id(),
        Vec::new(),
        shipping_address(),
        None,
        Decimal::ZERO,
        fixed_now(),
    );
    assert_eq!(result.unwrap_err(), CheckoutError::NoItems);
}

#[test]
fn payment_method_defaults_when_not_supplied() {
    let session = pending_session();
    assert_eq!(
        session.payment_method,
        CheckoutSession::DEFAULT_PAYMENT_METHOD
    );
    assert_eq!(session.payment_status, PaymentStatus::Pending);
    assert!(!session.is_paid);
}

#[test]
fn failed_payment_leaves_the_session_pending() {
    let mut session = pending_session();
    let before = session.clone();

    let err = session
        .mark_paid(
            PaymentStatus::Failed,
            Some(json!({ "reason": "card declined" })),
            fixed_now(),
        )
        .unwrap_err();

    assert_eq!(err, CheckoutError::PaymentNotConfirmed(PaymentStatus::Failed));
    assert_eq!(session, before, "a rejected callback changes nothing");
}

#[test]
fn paid_session_finalizes_exactly_once() {
    let now = fixed_now();
    let mut session = pending_session();

    session
        .mark_paid(PaymentStatus::Paid, Some(json!({ "id": "tx_123" })), now)
        .unwrap();
    assert!(session.is_paid);
    assert_eq!(session.paid_at, Some(now));

    let later = now + Duration::minutes(10);
    session.finalize(later).unwrap();
    assert!(session.is_finalized);
    assert_eq!(session.finalized_at, Some(later));

    assert_eq!(
        session.finalize(later + Duration::minutes(1)).unwrap_err(),
        CheckoutError::AlreadyFinalized
    );
}

#[test]
fn unpaid_session_refuses_to_finalize() {
    let mut session = pending_session();
    assert_eq!(session.finalize(fixed_now()).unwrap_err(), CheckoutError::NotPaid);
    assert!(!session.is_finalized);
}

#[test]
fn order_copies_the_paid_snapshot() {
    let now = fixed_now();
    let mut session = pending_session();
    session
        .mark_paid(PaymentStatus::Paid, Some(json!({ "id": "tx_123" })), now)
        .unwrap();
    let later = now + Duration::minutes(10);
    session.finalize(later).unwrap();

    let order = Order::materialize(&session, later);

    assert_eq!(order.user_id, session.user_id);
    assert_eq!(order.order_items, session.items);
    assert_eq!(order.shipping_address, session.shipping_address);
    assert_eq!(order.payment_method, session.payment_method);
    assert_eq!(order.total_price, session.total_price);
    assert_eq!(order.payment_details, session.payment_details);
    assert!(order.is_paid);
    assert_eq!(order.paid_at, session.paid_at);
    assert!(!order.is_delivered);
    assert_eq!(order.status, OrderStatus::Processing);
}

#[test]
fn delivered_status_stamps_the_delivery_fields() {
    let now = fixed_now();
    let mut session = pending_session();
    session.mark_paid(PaymentStatus::Paid, None, now).unwrap();
    session.finalize(now).unwrap();
    let mut order = Order::materialize(&session, now);

    let later = now + Duration::days(3);
    order.set_status(OrderStatus::Delivered, later);

    assert_eq!(order.status, OrderStatus::Delivered);
    assert!(order.is_delivered);
    assert_eq!(order.delivered_at, Some(later));
}
