//! Business logic services for the recipe API.
//!
//! # Services
//!
//! - `auth` - Registration, password login, token issuance and resolution
//! - `recipes` - Recipe writes with nested tag/ingredient reconciliation
//! - `images` - Validation and filesystem storage of recipe images

pub mod auth;
pub mod images;
pub mod recipes;

pub use auth::{AuthError, AuthService, ProfileUpdate};
pub use images::{ImageError, ImageStore};
pub use recipes::{RecipeError, RecipeService};
