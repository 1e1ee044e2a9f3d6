//! Database readiness command.
//!
//! Used by container entrypoints to hold off until `PostgreSQL` is up.

use std::time::Duration;

use recipe_book_api::config::{ConfigError, get_database_url};
use recipe_book_api::db;
use thiserror::Error;

use super::DATABASE_URL_VAR;

/// Errors from the wait command.
#[derive(Debug, Error)]
pub enum WaitError {
    /// Database URL is missing.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Every attempt failed.
    #[error("Database unavailable after {attempts} attempts: {last}")]
    Unavailable { attempts: u32, last: sqlx::Error },
}

/// Poll the database with `SELECT 1` until it answers.
///
/// # Errors
///
/// Returns `WaitError::Unavailable` once `attempts` consecutive attempts fail.
pub async fn wait(attempts: u32, interval_secs: u64) -> Result<(), WaitError> {
    dotenvy::dotenv().ok();

    let database_url = get_database_url(DATABASE_URL_VAR)?;
    let interval = Duration::from_secs(interval_secs);
    let attempts = attempts.max(1);

    let mut attempt = 1;
    loop {
        let result = match db::create_pool(&database_url).await {
            Ok(pool) => sqlx::query("SELECT 1").execute(&pool).await.map(|_| ()),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                tracing::info!(attempt, "Database available!");
                return Ok(());
            }
            Err(last) if attempt >= attempts => {
                return Err(WaitError::Unavailable { attempts, last });
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "Database unavailable, waiting...");
                tokio::time::sleep(interval).await;
                attempt += 1;
            }
        }
    }
}
