//! Catalog entries and the snapshot carried into carts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Gender, ProductId, UserId};

/// One image attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    /// Public URL served to clients.
    pub url: String,
    /// Opaque identifier at the media host, used for deletion.
    /// Absent on images that were seeded rather than uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

/// A catalog entry.
///
/// Read-mostly: the order pipeline only ever reads products (to snapshot
/// name/image/price at add-to-cart time); writes come from the admin
/// surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<Decimal>,
    pub count_in_stock: i32,
    /// Unique stock-keeping unit.
    pub sku: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Sizes this product is offered in.
    pub sizes: Vec<String>,
    /// Colors this product is offered in.
    pub colors: Vec<String>,
    /// Merchandising collection the product is filed under.
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    pub gender: Gender,
    pub images: Vec<ProductImage>,
    pub is_featured: bool,
    pub is_published: bool,
    /// Average shopper rating, 0 when unreviewed.
    pub rating: Decimal,
    pub num_reviews: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Admin account that created the entry, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Capture the fields a cart line copies at add-to-cart time.
    ///
    /// Prices are locked in here: later catalog edits never reprice lines
    /// already sitting in a cart. The first image stands in for the product;
    /// a product with no images snapshots an empty URL.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            product_id: self.id,
            name: self.name.clone(),
            image: self
                .images
                .first()
                .map(|image| image.url.clone())
                .unwrap_or_default(),
            price: self.price,
        }
    }
}

/// The point-in-time copy of product data stored on a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub image: String,
    pub price: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn linen_shirt() -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::generate(),
            name: "Linen Camp Shirt".into(),
            description: "Relaxed-fit camp collar shirt in washed linen.".into(),
            price: Decimal::new(6400, 2),
            discount_price: Some(Decimal::new(4800, 2)),
            count_in_stock: 12,
            sku: "CT-LCS-001".into(),
            category: "Shirts".into(),
            brand: Some("Cedar & Twine".into()),
            sizes: vec!["S".into(), "M".into(), "L".into()],
            colors: vec!["Sand".into(), "Olive".into()],
            collection: "Summer Staples".into(),
            material: Some("Linen".into()),
            gender: Gender::Men,
            images: vec![
                ProductImage {
                    url: "https://media.example.com/ct/lcs-front.jpg".into(),
                    asset_id: Some("ct/lcs-front".into()),
                    alt_text: Some("Linen camp shirt, front".into()),
                },
                ProductImage {
                    url: "https://media.example.com/ct/lcs-back.jpg".into(),
                    asset_id: Some("ct/lcs-back".into()),
                    alt_text: None,
                },
            ],
            is_featured: false,
            is_published: true,
            rating: Decimal::new(45, 1),
            num_reviews: 9,
            tags: vec!["linen".into(), "summer".into()],
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_snapshot_copies_base_price_and_first_image() {
        let product = linen_shirt();
        let snapshot = product.snapshot();

        assert_eq!(snapshot.product_id, product.id);
        assert_eq!(snapshot.name, "Linen Camp Shirt");
        assert_eq!(snapshot.image, "https://media.example.com/ct/lcs-front.jpg");
        // The base price is snapshotted even when a discount price exists.
        assert_eq!(snapshot.price, Decimal::new(6400, 2));
    }

    #[test]
    fn test_snapshot_without_images_uses_empty_url() {
        let mut product = linen_shirt();
        product.images.clear();
        assert_eq!(product.snapshot().image, "");
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let product = linen_shirt();
        let value = serde_json::to_value(&product).unwrap();
        assert!(value.get("countInStock").is_some());
        assert!(value.get("isPublished").is_some());
        assert!(value.get("discountPrice").is_some());
        assert!(value.get("count_in_stock").is_none());
    }
}
