//! Account route handlers: registration, token issuance and the own profile.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::{RequireAuth, ValidJson};
use crate::models::User;
use crate::services::{AuthService, ProfileUpdate};
use crate::state::AppState;

const REQUIRED: &str = "This field is required.";

/// Public view of an account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email.into_inner(),
            name: user.name,
        }
    }
}

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub name: String,
}

/// Token request payload.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Issued token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Profile update payload. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// Register a new account.
///
/// POST /api/user/create
///
/// # Errors
///
/// Returns a validation error for a missing or malformed email, a short
/// password, or an email that is already registered.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let mut errors = FieldErrors::new();
    if req.email.is_none() {
        errors.add("email", REQUIRED);
    }
    if req.password.is_none() {
        errors.add("password", REQUIRED);
    }
    errors.into_result()?;

    let auth = AuthService::new(state.pool(), state.config());
    let user = auth
        .register(
            req.email.as_deref().unwrap_or_default(),
            req.password.as_deref().unwrap_or_default(),
            &req.name,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Exchange credentials for a bearer token.
///
/// POST /api/user/token
///
/// # Errors
///
/// Returns 401 if the credentials don't identify an active account.
#[tracing::instrument(skip(state, req))]
pub async fn token(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<TokenRequest>,
) -> Result<Json<TokenResponse>> {
    let (email, password) = match (req.email, req.password) {
        (Some(email), Some(password)) => (email, password),
        (email, password) => {
            let mut errors = FieldErrors::new();
            if email.is_none() {
                errors.add("email", REQUIRED);
            }
            if password.is_none() {
                errors.add("password", REQUIRED);
            }
            return Err(AppError::Validation(errors));
        }
    };

    let auth = AuthService::new(state.pool(), state.config());
    let token = auth.authenticate(&email, &password).await?;

    Ok(Json(TokenResponse { token }))
}

/// Show the caller's profile.
///
/// GET /api/user/me
pub async fn me(RequireAuth(user): RequireAuth) -> Json<UserResponse> {
    Json(user.into())
}

/// Replace the caller's profile. `email` and `name` are required.
///
/// PUT /api/user/me
///
/// # Errors
///
/// Returns a validation error for missing or invalid fields.
pub async fn replace_me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let mut errors = FieldErrors::new();
    if req.email.is_none() {
        errors.add("email", REQUIRED);
    }
    if req.name.is_none() {
        errors.add("name", REQUIRED);
    }
    errors.into_result()?;

    apply_profile(&state, &user, &req).await
}

/// Update some of the caller's profile fields.
///
/// PATCH /api/user/me
///
/// # Errors
///
/// Returns a validation error for invalid fields.
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    apply_profile(&state, &user, &req).await
}

async fn apply_profile(
    state: &AppState,
    user: &User,
    req: &UpdateUserRequest,
) -> Result<Json<UserResponse>> {
    let auth = AuthService::new(state.pool(), state.config());
    let updated = auth
        .update_profile(
            user,
            ProfileUpdate {
                email: req.email.as_deref(),
                name: req.name.as_deref(),
                password: req.password.as_deref(),
            },
        )
        .await?;

    Ok(Json(updated.into()))
}
