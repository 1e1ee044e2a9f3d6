//! User domain types.

use chrono::{DateTime, Utc};

use recipe_book_core::{Email, UserId};

/// An API account.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized email address.
    pub email: Email,
    /// Display name (may be empty).
    pub name: String,
    /// Inactive users cannot log in or use existing tokens.
    pub is_active: bool,
    /// Staff flag, set for provisioned operators.
    pub is_staff: bool,
    /// Superuser flag, set for provisioned operators.
    pub is_superuser: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub name: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Profile fields to overwrite. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<Email>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}
