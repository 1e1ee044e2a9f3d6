//! Tag and ingredient repository.
//!
//! Both kinds live in structurally identical tables, so one repository serves
//! both and picks its tables from the [`AttributeKind`]. Table names are
//! compile-time constants; user input only ever reaches the queries as binds.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

use recipe_book_core::{AttributeId, AttributeKind, AttributeName, RecipeId, UserId};

use super::RepositoryError;
use crate::models::Attribute;

/// Table layout for one attribute kind.
struct Tables {
    /// Attribute table (`tag`, `ingredient`).
    table: &'static str,
    /// Join table to `recipe`.
    join_table: &'static str,
    /// Attribute foreign key column in the join table.
    join_column: &'static str,
}

const fn tables(kind: AttributeKind) -> Tables {
    match kind {
        AttributeKind::Tag => Tables {
            table: "tag",
            join_table: "recipe_tag",
            join_column: "tag_id",
        },
        AttributeKind::Ingredient => Tables {
            table: "ingredient",
            join_table: "recipe_ingredient",
            join_column: "ingredient_id",
        },
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AttributeRow {
    id: i32,
    user_id: i32,
    name: String,
}

impl AttributeRow {
    fn into_attribute(self, kind: AttributeKind) -> Result<Attribute, RepositoryError> {
        let name = AttributeName::parse(&self.name).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid {kind} name in database: {e}"))
        })?;

        Ok(Attribute {
            id: AttributeId::new(self.id),
            kind,
            user_id: UserId::new(self.user_id),
            name,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecipeAttributeRow {
    recipe_id: i32,
    #[sqlx(flatten)]
    attribute: AttributeRow,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for one kind of recipe attribute.
pub struct AttributeRepository<'a> {
    pool: &'a PgPool,
    kind: AttributeKind,
}

impl<'a> AttributeRepository<'a> {
    /// Create a repository for `kind`.
    #[must_use]
    pub const fn new(pool: &'a PgPool, kind: AttributeKind) -> Self {
        Self { pool, kind }
    }

    /// The attribute kind this repository serves.
    #[must_use]
    pub const fn kind(&self) -> AttributeKind {
        self.kind
    }

    fn rows_into(&self, rows: Vec<AttributeRow>) -> Result<Vec<Attribute>, RepositoryError> {
        rows.into_iter()
            .map(|row| row.into_attribute(self.kind))
            .collect()
    }

    /// List an owner's attributes, ordered by name descending.
    ///
    /// With `assigned_only`, only attributes attached to at least one recipe
    /// are returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        owner: UserId,
        assigned_only: bool,
    ) -> Result<Vec<Attribute>, RepositoryError> {
        let Tables {
            table,
            join_table,
            join_column,
        } = tables(self.kind);
        let sql = format!(
            r"
            SELECT a.id, a.user_id, a.name
            FROM {table} a
            WHERE a.user_id = $1
              AND (NOT $2 OR EXISTS (
                  SELECT 1 FROM {join_table} j WHERE j.{join_column} = a.id
              ))
            ORDER BY a.name DESC, a.id DESC
            "
        );
        let rows = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(owner)
            .bind(assigned_only)
            .fetch_all(self.pool)
            .await?;

        self.rows_into(rows)
    }

    /// Create an attribute.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the owner already has one with this name.
    pub async fn create(
        &self,
        owner: UserId,
        name: &AttributeName,
    ) -> Result<Attribute, RepositoryError> {
        let table = tables(self.kind).table;
        let sql = format!(
            "INSERT INTO {table} (user_id, name) VALUES ($1, $2) RETURNING id, user_id, name"
        );
        let row = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(owner)
            .bind(name)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::conflict_on_unique(e, "name already exists"))?;

        row.into_attribute(self.kind)
    }

    /// Rename an owner's attribute.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no attribute `id`.
    /// Returns `RepositoryError::Conflict` if the name is already taken.
    pub async fn rename(
        &self,
        id: AttributeId,
        owner: UserId,
        name: &AttributeName,
    ) -> Result<Attribute, RepositoryError> {
        let table = tables(self.kind).table;
        let sql = format!(
            "UPDATE {table} SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING id, user_id, name"
        );
        let row = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(id)
            .bind(owner)
            .bind(name)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::conflict_on_unique(e, "name already exists"))?
            .ok_or(RepositoryError::NotFound)?;

        row.into_attribute(self.kind)
    }

    /// Delete an owner's attribute and its recipe associations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the owner has no attribute `id`.
    pub async fn delete(&self, id: AttributeId, owner: UserId) -> Result<(), RepositoryError> {
        let table = tables(self.kind).table;
        let sql = format!("DELETE FROM {table} WHERE id = $1 AND user_id = $2");
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(owner)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Load the attributes of several recipes, keyed by recipe.
    ///
    /// Each recipe's attributes are in the order they were attached.
    /// Recipes without any are absent from the map.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_recipes(
        &self,
        recipe_ids: &[RecipeId],
    ) -> Result<HashMap<RecipeId, Vec<Attribute>>, RepositoryError> {
        if recipe_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let Tables {
            table,
            join_table,
            join_column,
        } = tables(self.kind);
        let sql = format!(
            r"
            SELECT j.recipe_id, a.id, a.user_id, a.name
            FROM {join_table} j
            JOIN {table} a ON a.id = j.{join_column}
            WHERE j.recipe_id = ANY($1)
            ORDER BY j.recipe_id, j.position, a.id
            "
        );
        let ids: Vec<i32> = recipe_ids.iter().map(RecipeId::as_i32).collect();
        let rows = sqlx::query_as::<_, RecipeAttributeRow>(&sql)
            .bind(ids)
            .fetch_all(self.pool)
            .await?;

        let mut by_recipe: HashMap<RecipeId, Vec<Attribute>> = HashMap::new();
        for row in rows {
            by_recipe
                .entry(RecipeId::new(row.recipe_id))
                .or_default()
                .push(row.attribute.into_attribute(self.kind)?);
        }
        Ok(by_recipe)
    }

    // =========================================================================
    // Transactional helpers (used during recipe reconciliation)
    // =========================================================================

    /// Fetch the owner's attribute with this name, creating it if absent.
    ///
    /// Atomic under concurrent writers thanks to the `(user_id, name)`
    /// unique constraint. The row stays locked until the transaction ends,
    /// so callers taking several names must take them in a fixed order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(
        &self,
        conn: &mut PgConnection,
        owner: UserId,
        name: &AttributeName,
    ) -> Result<Attribute, RepositoryError> {
        let table = tables(self.kind).table;
        // The no-op update makes RETURNING yield the existing row on conflict
        let sql = format!(
            r"
            INSERT INTO {table} (user_id, name)
            VALUES ($1, $2)
            ON CONFLICT (user_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, user_id, name
            "
        );
        let row = sqlx::query_as::<_, AttributeRow>(&sql)
            .bind(owner)
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;

        row.into_attribute(self.kind)
    }

    /// Attach an attribute to a recipe at `position` in its list.
    /// Attaching twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn associate(
        &self,
        conn: &mut PgConnection,
        recipe_id: RecipeId,
        attribute_id: AttributeId,
        position: i32,
    ) -> Result<(), RepositoryError> {
        let Tables {
            join_table,
            join_column,
            ..
        } = tables(self.kind);
        let sql = format!(
            "INSERT INTO {join_table} (recipe_id, {join_column}, position) VALUES ($1, $2, $3) ON CONFLICT DO NOTHING"
        );
        sqlx::query(&sql)
            .bind(recipe_id)
            .bind(attribute_id)
            .bind(position)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Detach every attribute of this kind from a recipe.
    ///
    /// The attribute rows themselves are kept.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_for_recipe(
        &self,
        conn: &mut PgConnection,
        recipe_id: RecipeId,
    ) -> Result<(), RepositoryError> {
        let join_table = tables(self.kind).join_table;
        let sql = format!("DELETE FROM {join_table} WHERE recipe_id = $1");
        sqlx::query(&sql)
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }
}
