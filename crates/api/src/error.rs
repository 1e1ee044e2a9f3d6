//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return `Result<T, AppError>`.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::images::ImageError;
use crate::services::recipes::RecipeError;

/// Per-field validation messages, rendered as
/// `{"error": "validation failed", "fields": {"<field>": ["msg", ...]}}`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection holding one message.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Returns `true` if no messages were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when empty, otherwise a validation error.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` carrying every recorded message.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

/// Application-level error type for the recipe API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Image upload failed.
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// Request payload failed validation.
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Resource not found (or owned by someone else).
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body is not JSON.
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Shorthand for a single-field validation error.
    #[must_use]
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    fn is_server_error(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Database(err) => !matches!(err, RepositoryError::NotFound),
            Self::Auth(err) => matches!(
                err,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenHash
            ),
            Self::Image(err) => matches!(err, ImageError::Io(_) | ImageError::Task(_)),
            _ => false,
        }
    }
}

impl From<RecipeError> for AppError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::Repository(e) => Self::Database(e),
            RecipeError::Image(e) => Self::Image(e),
        }
    }
}

fn message_body(message: &str) -> serde_json::Value {
    json!({ "error": message })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, body) = match self {
            Self::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "validation failed", "fields": fields }),
            ),
            Self::NotFound(_) | Self::Database(RepositoryError::NotFound) => {
                (StatusCode::NOT_FOUND, message_body("Not found"))
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, message_body(&msg)),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, message_body(&msg)),
            Self::UnsupportedMediaType(msg) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, message_body(&msg))
            }
            Self::Auth(err) => auth_error_response(&err),
            Self::Image(err) => match err {
                ImageError::Missing => (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "validation failed", "fields": FieldErrors::single("image", "No file was submitted.") }),
                ),
                ImageError::Invalid(_) => (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "validation failed", "fields": FieldErrors::single("image", "Upload a valid image.") }),
                ),
                ImageError::Io(_) | ImageError::Task(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message_body("Internal server error"),
                ),
            },
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                message_body("Internal server error"),
            ),
        };

        (status, Json(body)).into_response()
    }
}

fn auth_error_response(err: &AuthError) -> (StatusCode, serde_json::Value) {
    let validation = |field: &str, message: String| {
        (
            StatusCode::BAD_REQUEST,
            json!({ "error": "validation failed", "fields": FieldErrors::single(field, message) }),
        )
    };

    match err {
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            message_body("Unable to authenticate with provided credentials"),
        ),
        AuthError::MissingToken => (
            StatusCode::UNAUTHORIZED,
            message_body("Authentication credentials were not provided"),
        ),
        AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, message_body("Invalid token")),
        AuthError::InvalidEmail(e) => validation("email", e.to_string()),
        AuthError::UserAlreadyExists => {
            validation("email", "A user with this email already exists".to_owned())
        }
        AuthError::WeakPassword(msg) => validation("password", msg.clone()),
        AuthError::InvalidName(msg) => validation("name", msg.clone()),
        AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenHash => (
            StatusCode::INTERNAL_SERVER_ERROR,
            message_body("Internal server error"),
        ),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
