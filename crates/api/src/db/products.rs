//! Product repository: catalog reads and the admin write surface.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use cedar_twine_core::product::{Product, ProductImage};
use cedar_twine_core::{Gender, ProductId, UserId};

use super::RepositoryError;

/// How many products the new-arrivals feed returns.
const NEW_ARRIVALS_LIMIT: i64 = 8;

/// How many similar products a detail page shows.
const SIMILAR_PRODUCTS_LIMIT: i64 = 4;

/// Sort order for catalog listings.
///
/// Parsed from the `sortBy` query parameter; unknown keys fall back to
/// insertion order rather than failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    PriceAsc,
    PriceDesc,
    /// Rating descending.
    Popularity,
}

impl SortKey {
    /// Parse the client-supplied sort key; unknown values are ignored.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "priceAsc" => Some(Self::PriceAsc),
            "priceDesc" => Some(Self::PriceDesc),
            "popularity" => Some(Self::Popularity),
            _ => None,
        }
    }

    const fn order_clause(self) -> &'static str {
        match self {
            Self::PriceAsc => "price ASC",
            Self::PriceDesc => "price DESC",
            Self::Popularity => "rating DESC",
        }
    }
}

/// Filters for the public catalog listing.
///
/// Every field is optional; an empty filter lists the whole catalog in
/// insertion order.
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    pub collection: Option<String>,
    pub category: Option<String>,
    pub material: Vec<String>,
    pub brand: Vec<String>,
    pub sizes: Vec<String>,
    pub color: Option<String>,
    pub gender: Option<Gender>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    pub sort_by: Option<SortKey>,
    pub limit: Option<i64>,
}

/// Fields for creating a product. Everything the catalog entry carries
/// except the server-generated id, rating, and timestamps.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub discount_price: Option<Decimal>,
    pub count_in_stock: i32,
    pub sku: String,
    pub category: String,
    pub brand: Option<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub collection: String,
    pub material: Option<String>,
    pub gender: Gender,
    pub images: Vec<ProductImage>,
    pub is_featured: bool,
    pub is_published: bool,
    pub tags: Vec<String>,
    pub created_by: Option<UserId>,
}

/// Partial update for a product. `None` keeps the current value.
#[derive(Debug, Default, Clone)]
pub struct ProductPatch {
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
    pub gender: Option<Gender>,
    pub images: Option<Vec<ProductImage>>,
    pub is_featured: Option<bool>,
    pub is_published: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// Raw database row for a product.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    price: Decimal,
    discount_price: Option<Decimal>,
    count_in_stock: i32,
    sku: String,
    category: String,
    brand: Option<String>,
    sizes: serde_json::Value,
    colors: serde_json::Value,
    collection: String,
    material: Option<String>,
    gender: String,
    images: serde_json::Value,
    is_featured: bool,
    is_published: bool,
    rating: Decimal,
    num_reviews: i32,
    tags: serde_json::Value,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, discount_price, count_in_stock, \
     sku, category, brand, sizes, colors, collection, material, gender, images, \
     is_featured, is_published, rating, num_reviews, tags, created_by, created_at, updated_at";

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, RepositoryError> {
        let gender = row.gender.parse::<Gender>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid gender in database: {e}"))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price: row.price,
            discount_price: row.discount_price,
            count_in_stock: row.count_in_stock,
            sku: row.sku,
            category: row.category,
            brand: row.brand,
            sizes: RepositoryError::decode_json("sizes", row.sizes)?,
            colors: RepositoryError::decode_json("colors", row.colors)?,
            collection: row.collection,
            material: row.material,
            gender,
            images: RepositoryError::decode_json("images", row.images)?,
            is_featured: row.is_featured,
            is_published: row.is_published,
            rating: row.rating,
            num_reviews: row.num_reviews,
            tags: RepositoryError::decode_json("tags", row.tags)?,
            created_by: row.created_by.map(UserId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("failed to serialize: {e}")))
}

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Filtered catalog listing.
    ///
    /// The `collection`/`category` filters treat the literal value "all"
    /// (case-insensitive) as no filter, matching what storefront clients
    /// send when every facet is deselected.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE TRUE"));

        if let Some(collection) = filter.collection.as_deref()
            && !collection.eq_ignore_ascii_case("all")
        {
            builder.push(" AND collection = ");
            builder.push_bind(collection.to_owned());
        }
        if let Some(category) = filter.category.as_deref()
            && !category.eq_ignore_ascii_case("all")
        {
            builder.push(" AND category = ");
            builder.push_bind(category.to_owned());
        }
        if !filter.material.is_empty() {
            builder.push(" AND material = ANY(");
            builder.push_bind(filter.material.clone());
            builder.push(")");
        }
        if !filter.brand.is_empty() {
            builder.push(" AND brand = ANY(");
            builder.push_bind(filter.brand.clone());
            builder.push(")");
        }
        if !filter.sizes.is_empty() {
            // JSONB "contains any of these keys" over the sizes array.
            builder.push(" AND sizes ?| ");
            builder.push_bind(filter.sizes.clone());
        }
        if let Some(color) = filter.color.as_deref() {
            builder.push(" AND colors ? ");
            builder.push_bind(color.to_owned());
        }
        if let Some(gender) = filter.gender {
            builder.push(" AND gender = ");
            builder.push_bind(gender.as_str());
        }
        if let Some(min_price) = filter.min_price {
            builder.push(" AND price >= ");
            builder.push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            builder.push(" AND price <= ");
            builder.push_bind(max_price);
        }
        if let Some(search) = filter.search.as_deref() {
            let pattern = format!("%{}%", escape_like(search));
            builder.push(" AND (name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        if let Some(sort_by) = filter.sort_by {
            builder.push(" ORDER BY ");
            builder.push(sort_by.order_clause());
        }
        if let Some(limit) = filter.limit
            && limit > 0
        {
            builder.push(" LIMIT ");
            builder.push_bind(limit);
        }

        let rows = builder
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Every product, rating descending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn best_sellers(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY rating DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// The eight most recently created products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn new_arrivals(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(NEW_ARRIVALS_LIMIT)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Products sharing the given product's gender and category, excluding
    /// the product itself, capped at four.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn similar_to(&self, product: &Product) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE id <> $1 AND gender = $2 AND category = $3
             LIMIT $4"
        ))
        .bind(product.id)
        .bind(product.gender.as_str())
        .bind(&product.category)
        .bind(SIMILAR_PRODUCTS_LIMIT)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Create a catalog entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU already exists.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "INSERT INTO products (
                name, description, price, discount_price, count_in_stock, sku,
                category, brand, sizes, colors, collection, material, gender,
                images, is_featured, is_published, tags, created_by
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                     $14, $15, $16, $17, $18)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.discount_price)
        .bind(new.count_in_stock)
        .bind(&new.sku)
        .bind(&new.category)
        .bind(&new.brand)
        .bind(to_json(&new.sizes)?)
        .bind(to_json(&new.colors)?)
        .bind(&new.collection)
        .bind(&new.material)
        .bind(new.gender.as_str())
        .bind(to_json(&new.images)?)
        .bind(new.is_featured)
        .bind(new.is_published)
        .bind(to_json(&new.tags)?)
        .bind(new.created_by)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "SKU already exists"))?;

        Product::try_from(row)
    }

    /// Partial update. Absent fields keep their current values.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new SKU is taken.
    pub async fn update(
        &self,
        id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, RepositoryError> {
        let sizes = patch.sizes.as_ref().map(to_json).transpose()?;
        let colors = patch.colors.as_ref().map(to_json).transpose()?;
        let images = patch.images.as_ref().map(to_json).transpose()?;
        let tags = patch.tags.as_ref().map(to_json).transpose()?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                discount_price = COALESCE($5, discount_price),
                count_in_stock = COALESCE($6, count_in_stock),
                sku = COALESCE($7, sku),
                category = COALESCE($8, category),
                brand = COALESCE($9, brand),
                sizes = COALESCE($10, sizes),
                colors = COALESCE($11, colors),
                collection = COALESCE($12, collection),
                material = COALESCE($13, material),
                gender = COALESCE($14, gender),
                images = COALESCE($15, images),
                is_featured = COALESCE($16, is_featured),
                is_published = COALESCE($17, is_published),
                tags = COALESCE($18, tags),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.price)
        .bind(patch.discount_price)
        .bind(patch.count_in_stock)
        .bind(&patch.sku)
        .bind(&patch.category)
        .bind(&patch.brand)
        .bind(sizes)
        .bind(colors)
        .bind(&patch.collection)
        .bind(&patch.material)
        .bind(patch.gender.map(|g| g.as_str()))
        .bind(images)
        .bind(patch.is_featured)
        .bind(patch.is_published)
        .bind(tags)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "SKU already exists"))?;

        row.map_or(Err(RepositoryError::NotFound), Product::try_from)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Escape LIKE wildcards in user-supplied search text.
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_parse() {
        assert_eq!(SortKey::parse("priceAsc"), Some(SortKey::PriceAsc));
        assert_eq!(SortKey::parse("priceDesc"), Some(SortKey::PriceDesc));
        assert_eq!(SortKey::parse("popularity"), Some(SortKey::Popularity));
        // Unknown keys are ignored rather than rejected.
        assert_eq!(SortKey::parse("alphabetical"), None);
        assert_eq!(SortKey::parse(""), None);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%_wool"), "100\\%\\_wool");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
