//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! recipe-cli user create-superuser -e admin@example.com -p 'correct horse' -n "Admin"
//! ```
//!
//! # Environment Variables
//!
//! The full API configuration is loaded (`RECIPE_API_DATABASE_URL`,
//! `RECIPE_API_TOKEN_SECRET`, ...), since accounts go through the same
//! validation and hashing as registration.

use recipe_book_api::config::{ApiConfig, ConfigError};
use recipe_book_api::db;
use recipe_book_api::services::{AuthError, AuthService};
use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserCommandError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Account validation or creation failed.
    #[error("Could not create user: {0}")]
    Auth(#[from] AuthError),
}

/// Create an active staff superuser.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the email, password or name is invalid, or the email
/// is already registered.
pub async fn create_superuser(
    email: &str,
    password: &str,
    name: &str,
) -> Result<i32, UserCommandError> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    let user = AuthService::new(&pool, &config)
        .create_superuser(email, password, name)
        .await?;

    tracing::info!(
        "Superuser created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id.as_i32())
}
