//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] recipe_book_core::EmailError),

    /// Wrong email or password, blank password, or inactive account.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No `Authorization` header, or one without a usable token.
    #[error("missing token")]
    MissingToken,

    /// Token is unknown, expired, or belongs to an inactive user.
    #[error("invalid token")]
    InvalidToken,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Display name failed validation.
    #[error("name validation failed: {0}")]
    InvalidName(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token digest could not be computed.
    #[error("token hashing error")]
    TokenHash,
}
