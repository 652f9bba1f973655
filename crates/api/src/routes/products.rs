//! Catalog routes: the public read path and the admin write path.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use cedar_twine_core::product::{Product, ProductImage};
use cedar_twine_core::{Gender, ProductId};

use crate::db::products::{NewProduct, ProductFilter, ProductPatch, ProductRepository, SortKey};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Query parameters for the filtered catalog listing.
///
/// `material`, `brand`, and `size` accept comma-separated lists. The
/// literal value `all` on `collection` or `category` disables that filter.
/// Unknown `sortBy` keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub collection: Option<String>,
    pub category: Option<String>,
    pub material: Option<String>,
    pub brand: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub gender: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub limit: Option<i64>,
}

fn split_csv(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

impl ProductListQuery {
    fn into_filter(self) -> Result<ProductFilter> {
        let gender = self
            .gender
            .as_deref()
            .map(str::parse::<Gender>)
            .transpose()
            .map_err(|_| AppError::Validation("Invalid gender".to_string()))?;

        Ok(ProductFilter {
            collection: self.collection,
            category: self.category,
            material: split_csv(self.material),
            brand: split_csv(self.brand),
            sizes: split_csv(self.size),
            color: self.color,
            gender,
            min_price: self.min_price,
            max_price: self.max_price,
            search: self.search,
            sort_by: self.sort_by.as_deref().and_then(SortKey::parse),
            limit: self.limit,
        })
    }
}

/// Filtered catalog listing.
///
/// GET /api/products
///
/// # Errors
///
/// Returns 400 on an unparseable gender value.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = query.into_filter()?;
    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

/// Catalog sorted by rating, best first.
///
/// GET /api/products/best-seller
///
/// # Errors
///
/// Returns 404 when the catalog is empty.
pub async fn best_seller(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).best_sellers().await?;
    if products.is_empty() {
        return Err(AppError::NotFound("No best sellers found".to_string()));
    }
    Ok(Json(products))
}

/// The eight most recently created products.
///
/// GET /api/products/new-arrivals
///
/// # Errors
///
/// Returns 500 on a storage failure.
pub async fn new_arrivals(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).new_arrivals().await?;
    Ok(Json(products))
}

/// Products sharing the given product's gender and category.
///
/// GET /api/products/similar/{id}
///
/// # Errors
///
/// Returns 404 when the reference product does not exist.
pub async fn similar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Product>>> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get_by_id(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let products = repo.similar_to(&product).await?;
    Ok(Json(products))
}

/// Single product fetch.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns 404 when the product does not exist.
pub async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get_by_id(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

/// Request to create a catalog entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    pub count_in_stock: i32,
    pub sku: String,
    pub category: String,
    pub brand: Option<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    pub collection: String,
    pub material: Option<String>,
    pub gender: String,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update of a catalog entry. Absent fields keep current values.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub discount_price: Option<Decimal>,
    pub count_in_stock: Option<i32>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub collection: Option<String>,
    pub material: Option<String>,
    pub gender: Option<String>,
    pub images: Option<Vec<ProductImage>>,
    pub is_featured: Option<bool>,
    pub is_published: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// Create a catalog entry.
///
/// POST /api/products (admin)
///
/// # Errors
///
/// Returns 409 when the SKU is taken, 400 on an invalid gender.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let gender = payload
        .gender
        .parse::<Gender>()
        .map_err(|_| AppError::Validation("Invalid gender".to_string()))?;

    let new = NewProduct {
        name: payload.name,
        description: payload.description,
        price: payload.price,
        discount_price: payload.discount_price,
        count_in_stock: payload.count_in_stock,
        sku: payload.sku,
        category: payload.category,
        brand: payload.brand,
        sizes: payload.sizes,
        colors: payload.colors,
        collection: payload.collection,
        material: payload.material,
        gender,
        images: payload.images,
        is_featured: payload.is_featured,
        is_published: payload.is_published,
        tags: payload.tags,
        created_by: Some(admin.id),
    };

    let product = ProductRepository::new(state.pool()).create(&new).await?;
    tracing::info!(product_id = %product.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Partially update a catalog entry.
///
/// PUT /api/products/{id} (admin)
///
/// # Errors
///
/// Returns 404 when absent, 409 on a SKU clash, 400 on an invalid gender.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    let gender = payload
        .gender
        .as_deref()
        .map(str::parse::<Gender>)
        .transpose()
        .map_err(|_| AppError::Validation("Invalid gender".to_string()))?;

    let patch = ProductPatch {
        name: payload.name,
        description: payload.description,
        price: payload.price,
        discount_price: payload.discount_price,
        count_in_stock: payload.count_in_stock,
        sku: payload.sku,
        category: payload.category,
        brand: payload.brand,
        sizes: payload.sizes,
        colors: payload.colors,
        collection: payload.collection,
        material: payload.material,
        gender,
        images: payload.images,
        is_featured: payload.is_featured,
        is_published: payload.is_published,
        tags: payload.tags,
    };

    let product = ProductRepository::new(state.pool())
        .update(ProductId::new(id), &patch)
        .await?;

    Ok(Json(product))
}

/// Delete a catalog entry.
///
/// DELETE /api/products/{id} (admin)
///
/// # Errors
///
/// Returns 404 when the product does not exist.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await?;

    Ok(Json(json!({ "message": "Product deleted" })))
}
