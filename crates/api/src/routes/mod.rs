//! HTTP route handlers for the recipe API.
//!
//! # Route Structure
//!
//! ```text
//! # Users
//! POST   /api/user/create                      - Register an account
//! POST   /api/user/token                       - Issue a token (rate limited)
//! GET    /api/user/me                          - Own profile
//! PUT    /api/user/me                          - Replace own profile
//! PATCH  /api/user/me                          - Update own profile
//!
//! # Recipes (requires auth)
//! GET    /api/recipe/recipes                   - List (?tags=1,2&ingredients=3)
//! POST   /api/recipe/recipes                   - Create
//! GET    /api/recipe/recipes/{id}              - Detail
//! PUT    /api/recipe/recipes/{id}              - Replace
//! PATCH  /api/recipe/recipes/{id}              - Partial update
//! DELETE /api/recipe/recipes/{id}              - Delete
//! POST   /api/recipe/recipes/{id}/upload-image - Upload image (multipart)
//!
//! # Tags and ingredients (requires auth)
//! GET    /api/recipe/{tags,ingredients}        - List (?assigned_only=1)
//! POST   /api/recipe/{tags,ingredients}        - Create
//! PUT    /api/recipe/{tags,ingredients}/{id}   - Rename
//! PATCH  /api/recipe/{tags,ingredients}/{id}   - Rename
//! DELETE /api/recipe/{tags,ingredients}/{id}   - Delete
//! ```

pub mod attributes;
pub mod recipes;
pub mod users;

use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use recipe_book_core::AttributeKind;

use crate::config::ApiConfig;
use crate::middleware::token_rate_limiter;
use crate::state::AppState;

/// Create the user routes router.
pub fn user_routes(config: &ApiConfig) -> Router<AppState> {
    let token = Router::new().route("/token", post(users::token));
    let token = if config.rate_limit_enabled {
        token.layer(token_rate_limiter())
    } else {
        token
    };

    Router::new()
        .route("/create", post(users::create))
        .route(
            "/me",
            get(users::me).put(users::replace_me).patch(users::update_me),
        )
        .merge(token)
}

/// Create the recipe routes router.
pub fn recipe_routes(config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .route("/recipes", get(recipes::index).post(recipes::create))
        .route(
            "/recipes/{id}",
            get(recipes::show)
                .put(recipes::replace)
                .patch(recipes::update)
                .delete(recipes::destroy),
        )
        .route(
            "/recipes/{id}/upload-image",
            post(recipes::upload_image).layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        )
        .merge(attribute_routes(AttributeKind::Tag))
        .merge(attribute_routes(AttributeKind::Ingredient))
}

/// Create the routes for one attribute kind (`/tags` or `/ingredients`).
pub fn attribute_routes(kind: AttributeKind) -> Router<AppState> {
    let collection = format!("/{}", kind.plural());
    let member = format!("/{}/{{id}}", kind.plural());

    Router::new()
        .route(&collection, get(attributes::index).post(attributes::create))
        .route(
            &member,
            put(attributes::update)
                .patch(attributes::update)
                .delete(attributes::destroy),
        )
        .layer(Extension(kind))
}

/// Create all API routes.
pub fn routes(config: &ApiConfig) -> Router<AppState> {
    Router::new()
        .nest("/api/user", user_routes(config))
        .nest("/api/recipe", recipe_routes(config))
}
