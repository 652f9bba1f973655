//! Seed the database with demo data.
//!
//! Destructive: clears users, products, carts, checkout sessions, and
//! orders, then loads an admin account and a small demo catalog. Dev and
//! demo environments only.
//!
//! # Usage
//!
//! ```bash
//! ct-cli seed
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use cedar_twine_api::db::RepositoryError;
use cedar_twine_api::db::products::{NewProduct, ProductRepository};
use cedar_twine_api::db::users::UserRepository;
use cedar_twine_api::services::auth::{self, AuthError};
use cedar_twine_core::product::ProductImage;
use cedar_twine_core::{Email, Gender, Role};

/// Demo admin credentials. Change them the moment they hit a shared box.
const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_NAME: &str = "Admin";
const ADMIN_PASSWORD: &str = "admin12345";

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Storage failure.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Hashing the demo password failed.
    #[error("Password error: {0}")]
    Password(#[from] AuthError),

    /// Built-in seed data failed validation.
    #[error("Invalid seed data: {0}")]
    InvalidSeedData(String),
}

/// Reset the database to a demo state.
pub async fn run() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| SeedError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::warn!("Clearing users, products, carts, checkout sessions, and orders");
    sqlx::query("TRUNCATE users, products, carts, checkout_sessions, orders")
        .execute(&pool)
        .await?;

    let users = UserRepository::new(&pool);
    let password_hash = auth::hash_password(ADMIN_PASSWORD)?;
    let admin_email =
        Email::parse(ADMIN_EMAIL).map_err(|e| SeedError::InvalidSeedData(e.to_string()))?;
    let admin = users
        .create(ADMIN_NAME, &admin_email, &password_hash, Role::Admin)
        .await?;
    tracing::info!("Admin account created: {}", ADMIN_EMAIL);

    let products = ProductRepository::new(&pool);
    for product in demo_catalog() {
        let mut product = product;
        product.created_by = Some(admin.id);
        let created = products.create(&product).await?;
        tracing::info!(sku = %created.sku, "Seeded product {}", created.name);
    }

    tracing::info!("Seed complete");
    Ok(())
}

fn demo_product(
    name: &str,
    sku: &str,
    price: Decimal,
    category: &str,
    collection: &str,
    gender: Gender,
) -> NewProduct {
    NewProduct {
        name: name.to_owned(),
        description: format!("{name} from the demo catalog."),
        price,
        discount_price: None,
        count_in_stock: 25,
        sku: sku.to_owned(),
        category: category.to_owned(),
        brand: Some("Cedar & Twine".to_owned()),
        sizes: vec!["S".to_owned(), "M".to_owned(), "L".to_owned()],
        colors: vec!["Black".to_owned(), "Natural".to_owned()],
        collection: collection.to_owned(),
        material: Some("Cotton".to_owned()),
        gender,
        images: vec![ProductImage {
            url: format!("https://placehold.co/600x800?text={sku}"),
            asset_id: None,
            alt_text: Some(name.to_owned()),
        }],
        is_featured: false,
        is_published: true,
        tags: vec!["demo".to_owned()],
        created_by: None,
    }
}

fn demo_catalog() -> Vec<NewProduct> {
    vec![
        demo_product(
            "Cedar Oxford Shirt",
            "CT-1001",
            Decimal::new(5900, 2),
            "Shirts",
            "Everyday",
            Gender::Men,
        ),
        demo_product(
            "Twine Linen Dress",
            "CT-1002",
            Decimal::new(8900, 2),
            "Dresses",
            "Summer",
            Gender::Women,
        ),
        demo_product(
            "Ridge Canvas Jacket",
            "CT-1003",
            Decimal::new(12900, 2),
            "Outerwear",
            "Everyday",
            Gender::Men,
        ),
        demo_product(
            "Meadow Knit Sweater",
            "CT-1004",
            Decimal::new(7400, 2),
            "Knitwear",
            "Winter",
            Gender::Women,
        ),
    ]
}
