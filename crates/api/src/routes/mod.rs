//! HTTP route handlers for the commerce API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness check
//! GET    /health/ready                - Readiness check (pings the database)
//!
//! # Accounts
//! POST   /api/users/register          - Register, returns user + token
//! POST   /api/users/login             - Login, returns user + token
//! GET    /api/users/profile           - Authenticated user's record
//!
//! # Catalog
//! GET    /api/products                - Filtered listing
//! GET    /api/products/best-seller    - Sorted by rating
//! GET    /api/products/new-arrivals   - Eight newest
//! GET    /api/products/similar/{id}   - Same gender + category
//! GET    /api/products/{id}           - Single product
//! POST   /api/products                - Create (admin)
//! PUT    /api/products/{id}           - Partial update (admin)
//! DELETE /api/products/{id}           - Delete (admin)
//!
//! # Cart (works for users and guests)
//! GET    /api/cart                    - Fetch cart
//! POST   /api/cart                    - Add item (creates cart if needed)
//! PUT    /api/cart                    - Overwrite line quantity
//! DELETE /api/cart                    - Remove line
//! POST   /api/cart/merge              - Merge guest cart into user cart
//!
//! # Checkout
//! POST   /api/checkout                - Start session
//! PUT    /api/checkout/{id}/pay       - Payment callback
//! POST   /api/checkout/{id}/finalize  - Convert paid session to order
//!
//! # Orders
//! GET    /api/orders/my-orders        - Authenticated user's orders
//! GET    /api/orders/{id}             - Single order (owner or admin)
//!
//! # Admin
//! GET    /api/admin/users             - List accounts
//! POST   /api/admin/users             - Create account
//! PUT    /api/admin/users/{id}        - Update account
//! DELETE /api/admin/users/{id}        - Delete account
//! GET    /api/admin/products          - Full catalog
//! GET    /api/admin/orders            - All orders
//! PUT    /api/admin/orders/{id}       - Update delivery status
//! DELETE /api/admin/orders/{id}       - Delete order
//!
//! # Media, contact, newsletter
//! POST   /api/upload                  - Upload images to the media host
//! DELETE /api/upload                  - Delete an asset (admin)
//! POST   /api/subscribe               - Newsletter signup
//! POST   /api/contact                 - Contact-form submission
//! ```

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod contact;
pub mod orders;
pub mod products;
pub mod subscribe;
pub mod upload;
pub mod users;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde_json::json;

use crate::state::AppState;

/// Maximum multipart body size for image uploads.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Liveness check.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness check: pings the database.
async fn health_ready(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Create the account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/profile", get(users::profile))
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route("/best-seller", get(products::best_seller))
        .route("/new-arrivals", get(products::new_arrivals))
        .route("/similar/{id}", get(products::similar))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(cart::show)
                .post(cart::add_item)
                .put(cart::set_quantity)
                .delete(cart::remove_item),
        )
        .route("/merge", post(cart::merge))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::start))
        .route("/{id}/pay", put(checkout::pay))
        .route("/{id}/finalize", post(checkout::finalize))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/my-orders", get(orders::my_orders))
        .route("/{id}", get(orders::show))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route(
            "/users/{id}",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/products", get(admin::list_products))
        .route("/orders", get(admin::list_orders))
        .route(
            "/orders/{id}",
            put(admin::update_order_status).delete(admin::delete_order),
        )
}

/// Create the media upload routes router.
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(upload::upload).delete(upload::delete))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .nest("/users", user_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/orders", order_routes())
        .nest("/admin", admin_routes())
        .nest("/upload", upload_routes())
        .route("/subscribe", post(subscribe::subscribe))
        .route("/contact", post(contact::contact));

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(health_ready))
        .nest("/api", api)
}
