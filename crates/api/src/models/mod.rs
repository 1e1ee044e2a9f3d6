//! Domain models for the recipe API.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`] and the wire types in [`crate::routes`].

pub mod attribute;
pub mod recipe;
pub mod user;

pub use attribute::Attribute;
pub use recipe::{NewRecipe, Recipe, RecipeChanges, RecipeFilter};
pub use user::{NewUser, User, UserChanges};
