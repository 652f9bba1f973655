//! Cart aggregate: line items keyed by product/size/color and a derived total.
//!
//! Every mutation goes through a method on [`Cart`], and every method
//! recomputes `total_price` from the remaining lines before returning.
//! Nothing else in the system writes cart totals, so the invariant
//! `total_price == sum(line.price * line.quantity)` holds everywhere a cart
//! is observed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::product::ProductSnapshot;
use crate::types::{CartId, Owner, ProductId, UserId};

/// Errors that can occur when mutating a [`Cart`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// No line matches the requested (product, size, color) triple.
    #[error("item not found in cart")]
    LineNotFound,
}

/// One line in a cart.
///
/// `name`, `image`, and `price` are a snapshot of the product at the moment
/// it was added; later catalog edits do not flow back into existing lines.
/// The identity of a line within its cart is the `(product_id, size, color)`
/// triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Decimal,
    pub size: String,
    pub color: String,
    pub quantity: u32,
}

impl CartLine {
    /// Price contribution of this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Whether this line is identified by the given triple.
    #[must_use]
    pub fn matches(&self, product_id: ProductId, size: &str, color: &str) -> bool {
        self.product_id == product_id && self.size == size && self.color == color
    }
}

/// A shopper's cart.
///
/// Owned by exactly one identity (user or guest, see [`Owner`]); created on
/// first add; deleted when the owning user's checkout is finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub owner: Owner,
    pub lines: Vec<CartLine>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Create an empty cart for the given owner.
    #[must_use]
    pub fn new(owner: Owner, now: DateTime<Utc>) -> Self {
        Self {
            id: CartId::generate(),
            owner,
            lines: Vec::new(),
            total_price: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add an item to the cart.
    ///
    /// When a line with the same (product, size, color) already exists its
    /// quantity is incremented and the original snapshot is kept; otherwise
    /// a new line is appended from the given snapshot.
    pub fn add_item(
        &mut self,
        snapshot: ProductSnapshot,
        size: String,
        color: String,
        quantity: u32,
        now: DateTime<Utc>,
    ) {
        match self
            .lines
            .iter_mut()
            .find(|line| line.matches(snapshot.product_id, &size, &color))
        {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(CartLine {
                product_id: snapshot.product_id,
                name: snapshot.name,
                image: snapshot.image,
                price: snapshot.price,
                size,
                color,
                quantity,
            }),
        }
        self.touch(now);
    }

    /// Overwrite the quantity of an existing line.
    ///
    /// A quantity of zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] when no line matches.
    pub fn set_item_quantity(
        &mut self,
        product_id: ProductId,
        size: &str,
        color: &str,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<(), CartError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.matches(product_id, size, color))
            .ok_or(CartError::LineNotFound)?;

        if quantity == 0 {
            self.lines.remove(index);
        } else if let Some(line) = self.lines.get_mut(index) {
            line.quantity = quantity;
        }
        self.touch(now);
        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LineNotFound`] when no line matches.
    pub fn remove_item(
        &mut self,
        product_id: ProductId,
        size: &str,
        color: &str,
        now: DateTime<Utc>,
    ) -> Result<(), CartError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.matches(product_id, size, color))
            .ok_or(CartError::LineNotFound)?;

        self.lines.remove(index);
        self.touch(now);
        Ok(())
    }

    /// Absorb every line of a guest cart into this cart.
    ///
    /// Lines matching an existing (product, size, color) triple add their
    /// quantities; the existing line's snapshot wins. Everything else is
    /// appended as-is. The absorbed cart is consumed; deleting its persisted
    /// row is the storage layer's job.
    pub fn merge_from(&mut self, other: Self, now: DateTime<Utc>) {
        for incoming in other.lines {
            match self
                .lines
                .iter_mut()
                .find(|line| line.matches(incoming.product_id, &incoming.size, &incoming.color))
            {
                Some(line) => line.quantity += incoming.quantity,
                None => self.lines.push(incoming),
            }
        }
        self.touch(now);
    }

    /// Hand a guest cart over to a signed-in user, keeping its contents.
    pub fn reassign_to_user(&mut self, user_id: UserId, now: DateTime<Utc>) {
        self.owner = Owner::User(user_id);
        self.touch(now);
    }

    /// True when the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up a line by its identity triple.
    #[must_use]
    pub fn find_line(&self, product_id: ProductId, size: &str, color: &str) -> Option<&CartLine> {
        self.lines
            .iter()
            .find(|line| line.matches(product_id, size, color))
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.total_price = self.lines.iter().map(CartLine::line_total).sum();
        self.updated_at = now;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::GuestId;

    fn snapshot(product_id: ProductId, price: i64) -> ProductSnapshot {
        ProductSnapshot {
            product_id,
            name: "Linen Camp Shirt".into(),
            image: "https://media.example.com/ct/lcs-front.jpg".into(),
            price: Decimal::new(price * 100, 2),
        }
    }

    fn guest_cart() -> Cart {
        Cart::new(Owner::Guest(GuestId::generate()), Utc::now())
    }

    fn assert_total_matches_lines(cart: &Cart) {
        let expected: Decimal = cart.lines.iter().map(CartLine::line_total).sum();
        assert_eq!(cart.total_price, expected);
    }

    #[test]
    fn test_add_item_to_empty_cart() {
        let mut cart = guest_cart();
        let product_id = ProductId::generate();

        cart.add_item(snapshot(product_id, 10), "M".into(), "Red".into(), 2, Utc::now());

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.total_price, Decimal::new(2000, 2));
        assert_total_matches_lines(&cart);
    }

    #[test]
    fn test_add_same_triple_increments_quantity() {
        let mut cart = guest_cart();
        let product_id = ProductId::generate();

        cart.add_item(snapshot(product_id, 10), "M".into(), "Red".into(), 2, Utc::now());
        cart.add_item(snapshot(product_id, 10), "M".into(), "Red".into(), 1, Utc::now());

        assert_eq!(cart.lines.len(), 1);
        let line = cart.find_line(product_id, "M", "Red").unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(cart.total_price, Decimal::new(3000, 2));
    }

    #[test]
    fn test_differing_size_or_color_gets_its_own_line() {
        let mut cart = guest_cart();
        let product_id = ProductId::generate();

        cart.add_item(snapshot(product_id, 10), "M".into(), "Red".into(), 1, Utc::now());
        cart.add_item(snapshot(product_id, 10), "L".into(), "Red".into(), 1, Utc::now());
        cart.add_item(snapshot(product_id, 10), "M".into(), "Blue".into(), 1, Utc::now());

        assert_eq!(cart.lines.len(), 3);
        assert_total_matches_lines(&cart);

        // No two lines share an identity triple.
        for (i, a) in cart.lines.iter().enumerate() {
            for b in cart.lines.iter().skip(i + 1) {
                assert!(!a.matches(b.product_id, &b.size, &b.color));
            }
        }
    }

    #[test]
    fn test_existing_snapshot_wins_on_increment() {
        let mut cart = guest_cart();
        let product_id = ProductId::generate();

        cart.add_item(snapshot(product_id, 10), "M".into(), "Red".into(), 1, Utc::now());
        // Catalog price changed between adds; the line keeps the first price.
        cart.add_item(snapshot(product_id, 12), "M".into(), "Red".into(), 1, Utc::now());

        let line = cart.find_line(product_id, "M", "Red").unwrap();
        assert_eq!(line.price, Decimal::new(1000, 2));
        assert_eq!(cart.total_price, Decimal::new(2000, 2));
    }

    #[test]
    fn test_set_item_quantity_overwrites() {
        let mut cart = guest_cart();
        let product_id = ProductId::generate();
        cart.add_item(snapshot(product_id, 10), "M".into(), "Red".into(), 2, Utc::now());

        cart.set_item_quantity(product_id, "M", "Red", 5, Utc::now())
            .unwrap();

        assert_eq!(cart.find_line(product_id, "M", "Red").unwrap().quantity, 5);
        assert_eq!(cart.total_price, Decimal::new(5000, 2));
    }

    #[test]
    fn test_set_item_quantity_zero_removes_line() {
        let mut cart = guest_cart();
        let product_id = ProductId::generate();
        cart.add_item(snapshot(product_id, 10), "M".into(), "Red".into(), 2, Utc::now());
        cart.add_item(snapshot(ProductId::generate(), 7), "S".into(), "Blue".into(), 1, Utc::now());

        cart.set_item_quantity(product_id, "M", "Red", 0, Utc::now())
            .unwrap();

        assert_eq!(cart.lines.len(), 1);
        assert!(cart.find_line(product_id, "M", "Red").is_none());
        assert_eq!(cart.total_price, Decimal::new(700, 2));
    }

    #[test]
    fn test_set_item_quantity_missing_line() {
        let mut cart = guest_cart();
        let err = cart
            .set_item_quantity(ProductId::generate(), "M", "Red", 1, Utc::now())
            .unwrap_err();
        assert_eq!(err, CartError::LineNotFound);
    }

    #[test]
    fn test_remove_item() {
        let mut cart = guest_cart();
        let product_id = ProductId::generate();
        cart.add_item(snapshot(product_id, 10), "M".into(), "Red".into(), 2, Utc::now());

        cart.remove_item(product_id, "M", "Red", Utc::now()).unwrap();

        assert!(cart.is_empty());
        assert_eq!(cart.total_price, Decimal::ZERO);
    }

    #[test]
    fn test_remove_item_missing_line() {
        let mut cart = guest_cart();
        let product_id = ProductId::generate();
        cart.add_item(snapshot(product_id, 10), "M".into(), "Red".into(), 1, Utc::now());

        let err = cart
            .remove_item(product_id, "XL", "Red", Utc::now())
            .unwrap_err();
        assert_eq!(err, CartError::LineNotFound);
        assert_eq!(cart.lines.len(), 1);
    }

    #[test]
    fn test_merge_adds_matching_quantities_and_appends_rest() {
        let now = Utc::now();
        let shared = ProductId::generate();
        let guest_only = ProductId::generate();

        let mut user_cart = Cart::new(Owner::User(UserId::generate()), now);
        user_cart.add_item(snapshot(shared, 10), "M".into(), "Red".into(), 2, now);

        let mut guest = guest_cart();
        guest.add_item(snapshot(shared, 10), "M".into(), "Red".into(), 1, now);
        guest.add_item(snapshot(guest_only, 8), "S".into(), "Olive".into(), 3, now);

        user_cart.merge_from(guest, now);

        assert_eq!(user_cart.lines.len(), 2);
        assert_eq!(user_cart.find_line(shared, "M", "Red").unwrap().quantity, 3);
        assert_eq!(
            user_cart.find_line(guest_only, "S", "Olive").unwrap().quantity,
            3
        );
        assert_eq!(user_cart.total_price, Decimal::new(5400, 2));
        assert_total_matches_lines(&user_cart);
    }

    #[test]
    fn test_merge_twice_is_idempotent() {
        let now = Utc::now();
        let shared = ProductId::generate();

        let mut user_cart = Cart::new(Owner::User(UserId::generate()), now);
        user_cart.add_item(snapshot(shared, 10), "M".into(), "Red".into(), 2, now);

        let mut guest = guest_cart();
        guest.add_item(snapshot(shared, 10), "M".into(), "Red".into(), 1, now);

        user_cart.merge_from(guest, now);
        let after_first = user_cart.clone();

        // Second merge finds no guest cart; merging an empty one is the
        // equivalent no-op at this layer.
        user_cart.merge_from(Cart::new(Owner::Guest(GuestId::generate()), now), now);

        assert_eq!(user_cart.lines, after_first.lines);
        assert_eq!(user_cart.total_price, after_first.total_price);
    }

    #[test]
    fn test_reassign_to_user() {
        let now = Utc::now();
        let mut cart = guest_cart();
        let user_id = UserId::generate();

        cart.reassign_to_user(user_id, now);

        assert_eq!(cart.owner, Owner::User(user_id));
        assert_eq!(cart.owner.guest_id(), None);
    }

    #[test]
    fn test_line_serde_uses_camel_case() {
        let mut cart = guest_cart();
        cart.add_item(snapshot(ProductId::generate(), 10), "M".into(), "Red".into(), 1, Utc::now());

        let value = serde_json::to_value(&cart).unwrap();
        assert!(value.get("totalPrice").is_some());
        let line = value.get("lines").and_then(|l| l.get(0)).unwrap();
        assert!(line.get("productId").is_some());
    }
}
