//! Authentication extractor.
//!
//! Resolves the `Authorization` header to the calling user. Both the
//! `Token <key>` and `Bearer <key>` schemes are accepted.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::Span;

use crate::error::{AppError, set_sentry_user};
use crate::models::user::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Extractor that requires a valid auth token.
///
/// Rejects with 401 when the header is missing or the token does not
/// resolve to an active user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(token_from_header)
            .ok_or(AuthError::MissingToken)?;

        let user = AuthService::new(state.pool(), state.config())
            .current_user(token)
            .await?;

        Span::current().record("user_id", user.id.as_i32());
        set_sentry_user(&user.id, Some(user.email.as_str()));

        Ok(Self(user))
    }
}

/// Extract the key from a `Token <key>` or `Bearer <key>` header value.
///
/// The scheme is matched case-insensitively. Returns `None` for other
/// schemes or an empty key.
fn token_from_header(value: &str) -> Option<&str> {
    let (scheme, key) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let key = key.trim();
    (!key.is_empty()).then_some(key)
}
