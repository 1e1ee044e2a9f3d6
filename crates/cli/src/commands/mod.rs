//! CLI command implementations.

pub mod db;
pub mod migrate;
pub mod user;

/// Environment variable holding the database connection string.
pub const DATABASE_URL_VAR: &str = "RECIPE_API_DATABASE_URL";
