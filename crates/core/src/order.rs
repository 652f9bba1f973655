//! Orders: the immutable record minted when a checkout is finalized.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::checkout::{CheckoutItem, CheckoutSession, ShippingAddress};
use crate::types::{OrderId, OrderStatus, PaymentStatus, UserId};

/// A placed order.
///
/// Created exactly once per checkout session, at finalize time. After that,
/// the only mutation is the admin's delivery-status update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_items: Vec<CheckoutItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub total_price: Decimal,
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Materialize an order from a paid checkout session.
    ///
    /// Pure copy of the session's snapshot: items, address, payment
    /// method/status/details, and total. Delivery starts at
    /// [`OrderStatus::Processing`] with `is_delivered = false`. The caller
    /// guards the state transition (see
    /// [`CheckoutSession::finalize`](crate::checkout::CheckoutSession::finalize));
    /// this transform never looks at the finalized flag.
    #[must_use]
    pub fn materialize(session: &CheckoutSession, now: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::generate(),
            user_id: session.user_id,
            order_items: session.items.clone(),
            shipping_address: session.shipping_address.clone(),
            payment_method: session.payment_method.clone(),
            total_price: session.total_price,
            is_paid: true,
            paid_at: session.paid_at,
            is_delivered: false,
            delivered_at: None,
            status: OrderStatus::Processing,
            payment_status: PaymentStatus::Paid,
            payment_details: session.payment_details.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Admin delivery-status update.
    ///
    /// Moving to [`OrderStatus::Delivered`] also stamps the delivery flag
    /// and time; moving elsewhere never clears a delivery that already
    /// happened.
    pub fn set_status(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        self.status = status;
        if status == OrderStatus::Delivered && !self.is_delivered {
            self.is_delivered = true;
            self.delivered_at = Some(now);
        }
        self.updated_at = now;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    fn paid_session() -> CheckoutSession {
        let mut session = CheckoutSession::new(
            UserId::generate(),
            vec![CheckoutItem {
                product_id: ProductId::generate(),
                name: "Linen Camp Shirt".into(),
                image: "https://media.example.com/ct/lcs-front.jpg".into(),
                price: Decimal::new(6400, 2),
                quantity: 2,
            }],
            ShippingAddress {
                address: "12 Alder Row".into(),
                city: "Portland".into(),
                postal_code: "97209".into(),
                country: "USA".into(),
            },
            None,
            Decimal::new(12800, 2),
            Utc::now(),
        )
        .unwrap();
        session
            .mark_paid(
                PaymentStatus::Paid,
                Some(serde_json::json!({ "transactionId": "txn_93k1" })),
                Utc::now(),
            )
            .unwrap();
        session
    }

    #[test]
    fn test_materialize_copies_the_snapshot() {
        let session = paid_session();
        let order = Order::materialize(&session, Utc::now());

        assert_eq!(order.user_id, session.user_id);
        assert_eq!(order.order_items, session.items);
        assert_eq!(order.shipping_address, session.shipping_address);
        assert_eq!(order.payment_method, session.payment_method);
        assert_eq!(order.total_price, session.total_price);
        assert_eq!(order.payment_details, session.payment_details);
        assert_eq!(order.paid_at, session.paid_at);
    }

    #[test]
    fn test_materialize_starts_processing_and_undelivered() {
        let order = Order::materialize(&paid_session(), Utc::now());

        assert!(order.is_paid);
        assert!(!order.is_delivered);
        assert!(order.delivered_at.is_none());
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_materialize_mints_distinct_ids() {
        let session = paid_session();
        let a = Order::materialize(&session, Utc::now());
        let b = Order::materialize(&session, Utc::now());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_set_status_delivered_stamps_delivery() {
        let mut order = Order::materialize(&paid_session(), Utc::now());
        let now = Utc::now();

        order.set_status(OrderStatus::Delivered, now);

        assert!(order.is_delivered);
        assert_eq!(order.delivered_at, Some(now));
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn test_set_status_keeps_existing_delivery_stamp() {
        let mut order = Order::materialize(&paid_session(), Utc::now());
        let delivered_at = Utc::now();
        order.set_status(OrderStatus::Delivered, delivered_at);

        // A later move away from Delivered keeps the historical stamp.
        order.set_status(OrderStatus::Processing, Utc::now());
        assert!(order.is_delivered);
        assert_eq!(order.delivered_at, Some(delivered_at));

        // Re-delivering does not overwrite the original stamp either.
        order.set_status(OrderStatus::Delivered, Utc::now());
        assert_eq!(order.delivered_at, Some(delivered_at));
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let order = Order::materialize(&paid_session(), Utc::now());
        let value = serde_json::to_value(&order).unwrap();
        assert!(value.get("orderItems").is_some());
        assert!(value.get("isDelivered").is_some());
        assert!(value.get("paymentStatus").is_some());
    }
}
