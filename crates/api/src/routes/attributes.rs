//! Tag and ingredient route handlers.
//!
//! One handler set serves both kinds; the router supplies the
//! [`AttributeKind`] as an extension.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use recipe_book_core::{AttributeId, AttributeKind, AttributeName};

use crate::db::{AttributeRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAuth, ValidJson};
use crate::models::Attribute;
use crate::state::AppState;

/// A tag or ingredient on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeResponse {
    pub id: AttributeId,
    pub name: String,
}

impl From<Attribute> for AttributeResponse {
    fn from(attribute: Attribute) -> Self {
        Self {
            id: attribute.id,
            name: attribute.name.into_inner(),
        }
    }
}

/// Create and rename payload.
#[derive(Debug, Deserialize)]
pub struct AttributePayload {
    pub name: Option<String>,
}

/// Listing options.
#[derive(Debug, Default, Deserialize)]
pub struct AttributeListQuery {
    pub assigned_only: Option<String>,
}

fn parse_assigned_only(raw: Option<&str>) -> Result<bool> {
    match raw.map(str::trim) {
        None | Some("" | "0" | "false" | "False") => Ok(false),
        Some("1" | "true" | "True") => Ok(true),
        Some(_) => Err(AppError::field("assigned_only", "Must be 0 or 1.")),
    }
}

fn parse_name(payload: AttributePayload) -> Result<AttributeName> {
    let name = payload
        .name
        .ok_or_else(|| AppError::field("name", "This field is required."))?;
    AttributeName::parse(&name).map_err(|e| AppError::field("name", e.to_string()))
}

fn duplicate_name(kind: AttributeKind, err: RepositoryError) -> AppError {
    match err {
        RepositoryError::Conflict(_) => {
            AppError::field("name", format!("A {kind} with this name already exists."))
        }
        other => AppError::Database(other),
    }
}

/// List the caller's tags or ingredients, by name descending.
///
/// GET /api/recipe/{tags,ingredients}?assigned_only=1
///
/// # Errors
///
/// Returns a validation error for an unrecognised `assigned_only` value.
pub async fn index(
    State(state): State<AppState>,
    Extension(kind): Extension<AttributeKind>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<AttributeListQuery>,
) -> Result<Json<Vec<AttributeResponse>>> {
    let assigned_only = parse_assigned_only(query.assigned_only.as_deref())?;
    let attributes = AttributeRepository::new(state.pool(), kind)
        .list(user.id, assigned_only)
        .await?;

    Ok(Json(attributes.into_iter().map(Into::into).collect()))
}

/// Create a tag or ingredient.
///
/// POST /api/recipe/{tags,ingredients}
///
/// # Errors
///
/// Returns a validation error for a blank or duplicate name.
#[tracing::instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<AttributeKind>,
    RequireAuth(user): RequireAuth,
    ValidJson(payload): ValidJson<AttributePayload>,
) -> Result<(StatusCode, Json<AttributeResponse>)> {
    let name = parse_name(payload)?;
    let attribute = AttributeRepository::new(state.pool(), kind)
        .create(user.id, &name)
        .await
        .map_err(|e| duplicate_name(kind, e))?;

    tracing::info!(attribute_id = %attribute.id, "{kind} created");
    Ok((StatusCode::CREATED, Json(attribute.into())))
}

/// Rename one of the caller's tags or ingredients.
///
/// PUT/PATCH /api/recipe/{tags,ingredients}/{id}
///
/// # Errors
///
/// Returns a validation error for a blank or duplicate name, 404 if the
/// caller has no such attribute.
pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<AttributeKind>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AttributeId>,
    ValidJson(payload): ValidJson<AttributePayload>,
) -> Result<Json<AttributeResponse>> {
    let name = parse_name(payload)?;
    let attribute = AttributeRepository::new(state.pool(), kind)
        .rename(id, user.id, &name)
        .await
        .map_err(|e| duplicate_name(kind, e))?;

    Ok(Json(attribute.into()))
}

/// Delete one of the caller's tags or ingredients.
///
/// DELETE /api/recipe/{tags,ingredients}/{id}
///
/// # Errors
///
/// Returns 404 if the caller has no such attribute.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(kind): Extension<AttributeKind>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AttributeId>,
) -> Result<StatusCode> {
    AttributeRepository::new(state.pool(), kind)
        .delete(id, user.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assigned_only() {
        assert!(!parse_assigned_only(None).unwrap_or(true));
        assert!(!parse_assigned_only(Some("0")).unwrap_or(true));
        assert!(parse_assigned_only(Some("1")).unwrap_or(false));
        assert!(parse_assigned_only(Some("true")).unwrap_or(false));
        assert!(parse_assigned_only(Some("yes")).is_err());
    }

    #[test]
    fn test_parse_name() {
        let name = parse_name(AttributePayload {
            name: Some(" Vegan ".to_owned()),
        });
        assert!(name.is_ok_and(|n| n.as_str() == "Vegan"));

        assert!(parse_name(AttributePayload { name: None }).is_err());
        assert!(
            parse_name(AttributePayload {
                name: Some("  ".to_owned()),
            })
            .is_err()
        );
    }

    #[test]
    fn test_duplicate_name_maps_to_field_error() {
        let err = duplicate_name(
            AttributeKind::Tag,
            RepositoryError::Conflict("name already exists".to_owned()),
        );
        match err {
            AppError::Validation(fields) => {
                assert_eq!(
                    fields.get("name").unwrap_or_default(),
                    ["A tag with this name already exists."]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(matches!(
            duplicate_name(AttributeKind::Tag, RepositoryError::NotFound),
            AppError::Database(RepositoryError::NotFound)
        ));
    }
}
