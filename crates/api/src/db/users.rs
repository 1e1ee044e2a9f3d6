//! User repository for database operations.
//!
//! Email lookups compare `LOWER(email)`, matching the unique index, so
//! addresses that differ only in case resolve to the same account.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use recipe_book_core::{Email, UserId};

use super::RepositoryError;
use crate::models::user::{NewUser, User, UserChanges};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Column list shared by every query returning a [`UserRow`].
pub(super) const USER_COLUMNS: &str =
    "u.id, u.email, u.name, u.is_active, u.is_staff, u.is_superuser, u.created_at, u.updated_at";

/// Internal row type for `PostgreSQL` user queries.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserRow {
    id: i32,
    email: String,
    name: String,
    is_active: bool,
    is_staff: bool,
    is_superuser: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            is_active: row.is_active,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM app_user u WHERE u.id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by email, compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM app_user u WHERE LOWER(u.email) = LOWER($1)");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, u.password_hash FROM app_user u WHERE LOWER(u.email) = LOWER($1)"
        );
        let row = sqlx::query_as::<_, UserWithHashRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some((row.user.try_into()?, row.password_hash)))
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists (in any case).
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: &NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO app_user AS u (email, name, password_hash, is_staff, is_superuser)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new_user.email)
            .bind(&new_user.name)
            .bind(&new_user.password_hash)
            .bind(new_user.is_staff)
            .bind(new_user.is_superuser)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::conflict_on_unique(e, "email already exists"))?;

        row.try_into()
    }

    /// Overwrite the supplied profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new email belongs to another account.
    pub async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError> {
        let sql = format!(
            r"
            UPDATE app_user AS u
            SET email = COALESCE($2, u.email),
                name = COALESCE($3, u.name),
                password_hash = COALESCE($4, u.password_hash),
                updated_at = NOW()
            WHERE u.id = $1
            RETURNING {USER_COLUMNS}
            "
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(changes.email.as_ref())
            .bind(changes.name.as_deref())
            .bind(changes.password_hash.as_deref())
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::conflict_on_unique(e, "email already exists"))?
            .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
