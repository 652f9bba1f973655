//! Admin account bootstrap command.
//!
//! # Usage
//!
//! ```bash
//! ct-cli admin create -e admin@example.com -n "Admin Name"
//! ```
//!
//! The password is prompted on stdin rather than passed as an argument so
//! it never lands in shell history.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

use std::io::{BufRead, Write as _};

use sqlx::PgPool;
use thiserror::Error;

use cedar_twine_api::db::RepositoryError;
use cedar_twine_api::db::users::UserRepository;
use cedar_twine_api::services::auth::{self, AuthError};
use cedar_twine_core::{Email, Role};

/// Errors that can occur while bootstrapping an admin account.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email address.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password policy or hashing failure.
    #[error("Password error: {0}")]
    Password(#[from] AuthError),

    /// Account already exists.
    #[error("An account already exists with email: {0}")]
    UserExists(String),

    /// Storage failure.
    #[error("Repository error: {0}")]
    Repository(RepositoryError),

    /// Reading the password prompt failed.
    #[error("Failed to read password: {0}")]
    Prompt(#[from] std::io::Error),
}

/// Create an admin account.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `name` - Admin's display name
pub async fn create_user(email: &str, name: &str) -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email)
        .map_err(|e| AdminError::InvalidEmail(e.to_string()))?
        .normalized();

    let password = prompt_password()?;
    auth::validate_password(&password)?;
    let password_hash = auth::hash_password(&password)?;

    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| AdminError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Creating admin account: {}", email);
    let repo = UserRepository::new(&pool);
    let user = repo
        .create(name, &email, &password_hash, Role::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!("Admin account created: id {}, email {}", user.id, email);
    Ok(())
}

/// Read a password from stdin.
fn prompt_password() -> Result<String, std::io::Error> {
    let mut stderr = std::io::stderr();
    write!(stderr, "Password: ")?;
    stderr.flush()?;

    let mut password = String::new();
    std::io::stdin().lock().read_line(&mut password)?;
    Ok(password.trim_end_matches(['\r', '\n']).to_owned())
}
