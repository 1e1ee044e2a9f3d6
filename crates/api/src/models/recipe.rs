//! Recipe domain types.

use chrono::{DateTime, Utc};

use recipe_book_core::{AttributeName, Price, RecipeId, TimeMinutes, UserId};

use super::Attribute;

/// A recipe with its resolved associations.
#[derive(Debug, Clone)]
pub struct Recipe {
    pub id: RecipeId,
    pub user_id: UserId,
    pub title: String,
    pub description: String,
    pub time_minutes: TimeMinutes,
    pub price: Price,
    pub link: Option<String>,
    /// Path of the uploaded image, relative to the media root.
    pub image: Option<String>,
    pub tags: Vec<Attribute>,
    pub ingredients: Vec<Attribute>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for creating a recipe.
///
/// Attribute lists are names to get-or-create for the owner; `None` and an
/// empty list both leave the recipe without associations of that kind.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: TimeMinutes,
    pub price: Price,
    pub description: String,
    pub link: Option<String>,
    pub tags: Option<Vec<AttributeName>>,
    pub ingredients: Option<Vec<AttributeName>>,
}

/// Validated fields for updating a recipe. `None` keeps the stored value.
///
/// `link: Some(None)` clears the link. A present attribute list replaces the
/// recipe's associations of that kind, even when empty.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub time_minutes: Option<TimeMinutes>,
    pub price: Option<Price>,
    pub description: Option<String>,
    pub link: Option<Option<String>>,
    pub tags: Option<Vec<AttributeName>>,
    pub ingredients: Option<Vec<AttributeName>>,
}

/// Association filters for listing recipes.
///
/// A recipe matches when it carries at least one of the given tag ids and at
/// least one of the given ingredient ids. `None` disables that filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tag_ids: Option<Vec<i32>>,
    pub ingredient_ids: Option<Vec<i32>>,
}
