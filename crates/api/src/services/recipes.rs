//! Recipe service: owner-scoped writes with nested attribute reconciliation.
//!
//! Reconciliation turns a list of attribute names into associations: names
//! are deduplicated (first occurrence wins), each one is fetched or created
//! for the owner, then attached to the recipe. Rows are taken in name order
//! so that concurrent requests sharing names can't deadlock; the recipe keeps
//! the order the client listed them in. On update a present list
//! replaces the recipe's associations of that kind; an absent list leaves
//! them alone. Attribute rows are never deleted here.

use sqlx::{PgConnection, PgPool};

use recipe_book_core::{AttributeKind, AttributeName, RecipeId, UserId};

use crate::db::{AttributeRepository, RecipeRepository, RepositoryError};
use crate::models::{NewRecipe, Recipe, RecipeChanges, RecipeFilter};
use crate::services::images::{ImageError, ImageStore};

/// Errors from recipe operations.
#[derive(Debug, thiserror::Error)]
pub enum RecipeError {
    /// Storage failed, or the recipe doesn't belong to the caller.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The uploaded image could not be validated or stored.
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl From<sqlx::Error> for RecipeError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Recipe service bound to one owner's requests.
pub struct RecipeService<'a> {
    pool: &'a PgPool,
    recipes: RecipeRepository<'a>,
    tags: AttributeRepository<'a>,
    ingredients: AttributeRepository<'a>,
}

impl<'a> RecipeService<'a> {
    /// Create a new recipe service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            recipes: RecipeRepository::new(pool),
            tags: AttributeRepository::new(pool, AttributeKind::Tag),
            ingredients: AttributeRepository::new(pool, AttributeKind::Ingredient),
        }
    }

    /// List the owner's recipes matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, owner: UserId, filter: &RecipeFilter) -> Result<Vec<Recipe>, RecipeError> {
        Ok(self.recipes.list(owner, filter).await?)
    }

    /// Get one of the owner's recipes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no recipe `id`.
    pub async fn get(&self, id: RecipeId, owner: UserId) -> Result<Recipe, RecipeError> {
        Ok(self
            .recipes
            .get(id, owner)
            .await?
            .ok_or(RepositoryError::NotFound)?)
    }

    /// Create a recipe and its associations in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any write fails; nothing is
    /// persisted in that case.
    #[tracing::instrument(skip(self, owner, recipe), fields(user_id = %owner))]
    pub async fn create(&self, owner: UserId, recipe: NewRecipe) -> Result<Recipe, RecipeError> {
        let mut tx = self.pool.begin().await?;

        let id = self.recipes.insert(&mut tx, owner, &recipe).await?;
        if let Some(names) = recipe.tags {
            reconcile(&mut tx, &self.tags, owner, id, names).await?;
        }
        if let Some(names) = recipe.ingredients {
            reconcile(&mut tx, &self.ingredients, owner, id, names).await?;
        }

        tx.commit().await?;
        tracing::info!(recipe_id = %id, "recipe created");

        self.get(id, owner).await
    }

    /// Apply a partial update in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no recipe `id`.
    /// On any error the previous fields and associations are kept.
    #[tracing::instrument(skip(self, id, owner, changes), fields(user_id = %owner, recipe_id = %id))]
    pub async fn update(
        &self,
        id: RecipeId,
        owner: UserId,
        changes: RecipeChanges,
    ) -> Result<Recipe, RecipeError> {
        let mut tx = self.pool.begin().await?;

        self.recipes.update(&mut tx, id, owner, &changes).await?;
        if let Some(names) = changes.tags {
            self.tags.clear_for_recipe(&mut tx, id).await?;
            reconcile(&mut tx, &self.tags, owner, id, names).await?;
        }
        if let Some(names) = changes.ingredients {
            self.ingredients.clear_for_recipe(&mut tx, id).await?;
            reconcile(&mut tx, &self.ingredients, owner, id, names).await?;
        }

        tx.commit().await?;
        self.get(id, owner).await
    }

    /// Delete one of the owner's recipes and its stored image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no recipe `id`.
    #[tracing::instrument(skip(self, id, owner, images), fields(user_id = %owner, recipe_id = %id))]
    pub async fn delete(
        &self,
        id: RecipeId,
        owner: UserId,
        images: &ImageStore,
    ) -> Result<(), RecipeError> {
        if let Some(image) = self.recipes.delete(id, owner).await? {
            images.remove(&image).await;
        }
        tracing::info!("recipe deleted");
        Ok(())
    }

    /// Store an uploaded image and point the recipe at it.
    ///
    /// Ownership is checked before anything is written. A replaced image
    /// file is removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no recipe `id`,
    /// or an `ImageError` if the payload is missing or not an image.
    #[tracing::instrument(skip(self, id, owner, data, images), fields(user_id = %owner, recipe_id = %id))]
    pub async fn attach_image(
        &self,
        id: RecipeId,
        owner: UserId,
        data: Vec<u8>,
        images: &ImageStore,
    ) -> Result<Recipe, RecipeError> {
        let previous = self.get(id, owner).await?.image;

        let stored = images.save(data).await?;
        if let Err(e) = self.recipes.set_image(id, owner, Some(&stored)).await {
            images.remove(&stored).await;
            return Err(e.into());
        }

        if let Some(old) = previous {
            images.remove(&old).await;
        }

        self.get(id, owner).await
    }
}

/// Get-or-create each named attribute and attach it to the recipe.
async fn reconcile(
    conn: &mut PgConnection,
    repo: &AttributeRepository<'_>,
    owner: UserId,
    recipe_id: RecipeId,
    names: Vec<AttributeName>,
) -> Result<(), RepositoryError> {
    let names = AttributeName::dedup_first(names);

    for (position, name) in lock_order(&names) {
        let attribute = repo.get_or_create(conn, owner, name).await?;
        repo.associate(conn, recipe_id, attribute.id, position).await?;
    }

    tracing::debug!(
        kind = %repo.kind(),
        recipe_id = %recipe_id,
        count = names.len(),
        "attributes reconciled"
    );
    Ok(())
}

/// Pair each name with its list position, sorted by name.
fn lock_order(names: &[AttributeName]) -> Vec<(i32, &AttributeName)> {
    let mut ordered: Vec<(i32, &AttributeName)> = (0..).zip(names).collect();
    ordered.sort_by(|a, b| a.1.cmp(b.1));
    ordered
}
