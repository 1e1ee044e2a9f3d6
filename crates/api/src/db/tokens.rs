//! Auth token repository.
//!
//! Only HMAC digests of tokens are stored; the raw value never reaches the
//! database.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use recipe_book_core::{TokenId, UserId};

use super::RepositoryError;
use super::users::{USER_COLUMNS, UserRow};
use crate::models::user::User;

/// Repository for auth token database operations.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a token digest for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a digest collision.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, user_id: UserId, token_hash: &str) -> Result<TokenId, RepositoryError> {
        let id: TokenId = sqlx::query_scalar(
            r"
            INSERT INTO auth_token (user_id, token_hash)
            VALUES ($1, $2)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(token_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "token already exists"))?;

        Ok(id)
    }

    /// Resolve a token digest to its owner.
    ///
    /// Tokens created before `issued_after` are treated as unknown.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_user(
        &self,
        token_hash: &str,
        issued_after: Option<DateTime<Utc>>,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {USER_COLUMNS}
            FROM auth_token t
            JOIN app_user u ON u.id = t.user_id
            WHERE t.token_hash = $1
              AND ($2::timestamptz IS NULL OR t.created_at > $2)
            "
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(token_hash)
            .bind(issued_after)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Remove every token of a user created before `cutoff`.
    ///
    /// # Returns
    ///
    /// The number of tokens removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_for_user_before(
        &self,
        user_id: UserId,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM auth_token WHERE user_id = $1 AND created_at < $2")
            .bind(user_id)
            .bind(cutoff)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
