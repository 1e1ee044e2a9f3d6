//! Recipe repository for database operations.
//!
//! Every query is scoped by owner: a recipe belonging to someone else behaves
//! exactly like one that doesn't exist.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use recipe_book_core::{AttributeKind, Price, RecipeId, TimeMinutes, UserId};

use super::{AttributeRepository, RepositoryError};
use crate::models::recipe::{NewRecipe, Recipe, RecipeChanges, RecipeFilter};

const RECIPE_COLUMNS: &str = "r.id, r.user_id, r.title, r.description, r.time_minutes, r.price, \
                              r.link, r.image, r.created_at, r.updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` recipe queries.
#[derive(Debug, sqlx::FromRow)]
struct RecipeRow {
    id: i32,
    user_id: i32,
    title: String,
    description: String,
    time_minutes: i32,
    price: Decimal,
    link: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = RepositoryError;

    fn try_from(row: RecipeRow) -> Result<Self, Self::Error> {
        let time_minutes = TimeMinutes::new(row.time_minutes).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid time_minutes in database: {e}"))
        })?;
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price in database: {e}"))
        })?;

        Ok(Self {
            id: RecipeId::new(row.id),
            user_id: UserId::new(row.user_id),
            title: row.title,
            description: row.description,
            time_minutes,
            price,
            link: row.link,
            image: row.image,
            tags: Vec::new(),
            ingredients: Vec::new(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for recipe database operations.
pub struct RecipeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RecipeRepository<'a> {
    /// Create a new recipe repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fill in tags and ingredients for a batch of recipes.
    async fn with_attributes(&self, rows: Vec<RecipeRow>) -> Result<Vec<Recipe>, RepositoryError> {
        let mut recipes = rows
            .into_iter()
            .map(Recipe::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let ids: Vec<RecipeId> = recipes.iter().map(|r| r.id).collect();

        let mut tags = AttributeRepository::new(self.pool, AttributeKind::Tag)
            .for_recipes(&ids)
            .await?;
        let mut ingredients = AttributeRepository::new(self.pool, AttributeKind::Ingredient)
            .for_recipes(&ids)
            .await?;

        for recipe in &mut recipes {
            recipe.tags = tags.remove(&recipe.id).unwrap_or_default();
            recipe.ingredients = ingredients.remove(&recipe.id).unwrap_or_default();
        }
        Ok(recipes)
    }

    /// Get an owner's recipe with its associations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn get(&self, id: RecipeId, owner: UserId) -> Result<Option<Recipe>, RepositoryError> {
        let sql = format!("SELECT {RECIPE_COLUMNS} FROM recipe r WHERE r.id = $1 AND r.user_id = $2");
        let row = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(self.with_attributes(vec![row]).await?.pop())
    }

    /// List an owner's recipes, newest first.
    ///
    /// The association filters use `EXISTS`, so a recipe matching several
    /// ids still appears once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        owner: UserId,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {RECIPE_COLUMNS}
            FROM recipe r
            WHERE r.user_id = $1
              AND ($2::int4[] IS NULL OR EXISTS (
                  SELECT 1 FROM recipe_tag rt
                  WHERE rt.recipe_id = r.id AND rt.tag_id = ANY($2)
              ))
              AND ($3::int4[] IS NULL OR EXISTS (
                  SELECT 1 FROM recipe_ingredient ri
                  WHERE ri.recipe_id = r.id AND ri.ingredient_id = ANY($3)
              ))
            ORDER BY r.id DESC
            "
        );
        let rows = sqlx::query_as::<_, RecipeRow>(&sql)
            .bind(owner)
            .bind(filter.tag_ids.as_deref())
            .bind(filter.ingredient_ids.as_deref())
            .fetch_all(self.pool)
            .await?;

        self.with_attributes(rows).await
    }

    /// Insert the scalar fields of a recipe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        owner: UserId,
        recipe: &NewRecipe,
    ) -> Result<RecipeId, RepositoryError> {
        let id: RecipeId = sqlx::query_scalar(
            r"
            INSERT INTO recipe (user_id, title, description, time_minutes, price, link)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            ",
        )
        .bind(owner)
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(recipe.time_minutes)
        .bind(recipe.price)
        .bind(recipe.link.as_deref())
        .fetch_one(&mut *conn)
        .await?;

        Ok(id)
    }

    /// Overwrite the supplied scalar fields of an owner's recipe.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no recipe `id`.
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        id: RecipeId,
        owner: UserId,
        changes: &RecipeChanges,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE recipe
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                time_minutes = COALESCE($5, time_minutes),
                price = COALESCE($6, price),
                link = CASE WHEN $7 THEN $8 ELSE link END,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(id)
        .bind(owner)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.time_minutes)
        .bind(changes.price)
        .bind(changes.link.is_some())
        .bind(changes.link.as_ref().and_then(Option::as_deref))
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Point an owner's recipe at a new image path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no recipe `id`.
    pub async fn set_image(
        &self,
        id: RecipeId,
        owner: UserId,
        image: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE recipe SET image = $3, updated_at = NOW() WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .bind(image)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete an owner's recipe. Associations cascade, attributes remain.
    ///
    /// # Returns
    ///
    /// The image path the recipe pointed at, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no recipe `id`.
    pub async fn delete(&self, id: RecipeId, owner: UserId) -> Result<Option<String>, RepositoryError> {
        let image: Option<Option<String>> =
            sqlx::query_scalar("DELETE FROM recipe WHERE id = $1 AND user_id = $2 RETURNING image")
                .bind(id)
                .bind(owner)
                .fetch_optional(self.pool)
                .await?;

        image.ok_or(RepositoryError::NotFound)
    }
}
