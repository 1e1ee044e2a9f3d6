//! Recipe route handlers.
//!
//! All handlers are owner-scoped through [`RequireAuth`]: another user's
//! recipe is reported as not found.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use recipe_book_core::{AttributeName, IdList, Price, RecipeId, TimeMinutes};

use super::attributes::AttributeResponse;
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::{RequireAuth, ValidJson};
use crate::models::{NewRecipe, Recipe, RecipeChanges, RecipeFilter, User};
use crate::services::images::public_url;
use crate::services::{ImageError, RecipeService};
use crate::state::AppState;

const REQUIRED: &str = "This field is required.";
const MAX_TITLE_LENGTH: usize = 255;
const MAX_LINK_LENGTH: usize = 255;

// =============================================================================
// Wire types
// =============================================================================

/// Recipe as shown in listings.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub title: String,
    pub time_minutes: TimeMinutes,
    pub price: Price,
    pub link: Option<String>,
    pub tags: Vec<AttributeResponse>,
    pub ingredients: Vec<AttributeResponse>,
}

/// Recipe detail view.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub summary: RecipeSummary,
    pub description: String,
    /// Public URL path of the image.
    pub image: Option<String>,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            tags: recipe.tags.into_iter().map(Into::into).collect(),
            ingredients: recipe.ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Recipe> for RecipeDetail {
    fn from(mut recipe: Recipe) -> Self {
        let description = std::mem::take(&mut recipe.description);
        let image = recipe.image.take().map(|path| public_url(&path));
        Self {
            summary: recipe.into(),
            description,
            image,
        }
    }
}

/// Response of an image upload.
#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub id: RecipeId,
    pub image: Option<String>,
}

/// A nested `{name}` entry in a recipe payload.
#[derive(Debug, Deserialize)]
pub struct NamePayload {
    pub name: String,
}

/// Recipe write payload. Every field is optional at this level; which ones
/// are required depends on the verb. Unknown fields (such as `user`) are
/// ignored.
#[derive(Debug, Default, Deserialize)]
pub struct RecipePayload {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    /// `None` when absent, `Some(None)` when explicitly `null`.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub link: Option<Option<String>>,
    pub tags: Option<Vec<NamePayload>>,
    pub ingredients: Option<Vec<NamePayload>>,
}

fn deserialize_some<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Listing filters: comma-separated id lists.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    pub tags: Option<String>,
    pub ingredients: Option<String>,
}

// =============================================================================
// Validation
// =============================================================================

impl RecipePayload {
    /// Validate a create payload. `title`, `time_minutes` and `price` are required.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn into_new_recipe(self) -> std::result::Result<NewRecipe, FieldErrors> {
        let mut errors = FieldErrors::new();
        require_core_fields(&self, &mut errors);
        let changes = self.validate(errors)?;

        match (changes.title, changes.time_minutes, changes.price) {
            (Some(title), Some(time_minutes), Some(price)) => Ok(NewRecipe {
                title,
                time_minutes,
                price,
                description: changes.description.unwrap_or_default(),
                link: changes.link.flatten(),
                tags: changes.tags,
                ingredients: changes.ingredients,
            }),
            _ => Err(FieldErrors::single("recipe", "Incomplete recipe.")),
        }
    }

    /// Validate an update payload. With `full`, the fields a create requires
    /// are required here too.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn into_changes(self, full: bool) -> std::result::Result<RecipeChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        if full {
            require_core_fields(&self, &mut errors);
        }
        self.validate(errors)
    }

    fn validate(self, mut errors: FieldErrors) -> std::result::Result<RecipeChanges, FieldErrors> {
        let title = self.title.and_then(|t| validate_title(&t, &mut errors));

        let time_minutes = self.time_minutes.and_then(|m| match TimeMinutes::new(m) {
            Ok(time) => Some(time),
            Err(e) => {
                errors.add("time_minutes", e.to_string());
                None
            }
        });

        let price = self.price.and_then(|p| match Price::new(p) {
            Ok(price) => Some(price),
            Err(e) => {
                errors.add("price", e.to_string());
                None
            }
        });

        let link = self.link.map(|link| validate_link(link, &mut errors));
        let tags = self.tags.map(|t| validate_names("tags", t, &mut errors));
        let ingredients = self
            .ingredients
            .map(|i| validate_names("ingredients", i, &mut errors));

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(RecipeChanges {
            title,
            time_minutes,
            price,
            description: self.description,
            link,
            tags,
            ingredients,
        })
    }
}

fn require_core_fields(payload: &RecipePayload, errors: &mut FieldErrors) {
    if payload.title.is_none() {
        errors.add("title", REQUIRED);
    }
    if payload.time_minutes.is_none() {
        errors.add("time_minutes", REQUIRED);
    }
    if payload.price.is_none() {
        errors.add("price", REQUIRED);
    }
}

fn validate_title(title: &str, errors: &mut FieldErrors) -> Option<String> {
    let title = title.trim();
    if title.is_empty() {
        errors.add("title", "This field may not be blank.");
        return None;
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        errors.add(
            "title",
            format!("Ensure this field has no more than {MAX_TITLE_LENGTH} characters."),
        );
        return None;
    }
    Some(title.to_owned())
}

/// An empty or `null` link clears it.
fn validate_link(link: Option<String>, errors: &mut FieldErrors) -> Option<String> {
    let link = link.map(|l| l.trim().to_owned()).filter(|l| !l.is_empty())?;

    if link.chars().count() > MAX_LINK_LENGTH {
        errors.add(
            "link",
            format!("Ensure this field has no more than {MAX_LINK_LENGTH} characters."),
        );
        return None;
    }
    match url::Url::parse(&link) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(link),
        _ => {
            errors.add("link", "Enter a valid URL.");
            None
        }
    }
}

fn validate_names(
    field: &str,
    entries: Vec<NamePayload>,
    errors: &mut FieldErrors,
) -> Vec<AttributeName> {
    let mut names = Vec::with_capacity(entries.len());
    for entry in entries {
        match AttributeName::parse(&entry.name) {
            Ok(name) => names.push(name),
            Err(e) => errors.add(field, e.to_string()),
        }
    }
    names
}

/// Parse one id-list query parameter. An empty value means no filter.
fn parse_filter(
    field: &str,
    raw: Option<&str>,
    errors: &mut FieldErrors,
) -> Option<Vec<i32>> {
    match IdList::parse(raw?) {
        Ok(ids) if ids.is_empty() => None,
        Ok(ids) => Some(ids.into_inner()),
        Err(e) => {
            errors.add(field, e.to_string());
            None
        }
    }
}

impl RecipeListQuery {
    /// Parse into a repository filter.
    ///
    /// # Errors
    ///
    /// Returns a field error for each malformed list.
    pub fn into_filter(self) -> std::result::Result<RecipeFilter, FieldErrors> {
        let mut errors = FieldErrors::new();
        let tag_ids = parse_filter("tags", self.tags.as_deref(), &mut errors);
        let ingredient_ids = parse_filter("ingredients", self.ingredients.as_deref(), &mut errors);

        if errors.is_empty() {
            Ok(RecipeFilter {
                tag_ids,
                ingredient_ids,
            })
        } else {
            Err(errors)
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List the caller's recipes.
///
/// GET /api/recipe/recipes?tags=1,2&ingredients=3
///
/// # Errors
///
/// Returns a validation error for a malformed id list.
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<Vec<RecipeSummary>>> {
    let filter = query.into_filter().map_err(AppError::Validation)?;
    let recipes = RecipeService::new(state.pool()).list(user.id, &filter).await?;

    Ok(Json(recipes.into_iter().map(Into::into).collect()))
}

/// Create a recipe for the caller.
///
/// POST /api/recipe/recipes
///
/// # Errors
///
/// Returns a validation error for missing or invalid fields.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ValidJson(payload): ValidJson<RecipePayload>,
) -> Result<(StatusCode, Json<RecipeDetail>)> {
    let recipe = payload.into_new_recipe().map_err(AppError::Validation)?;
    let created = RecipeService::new(state.pool()).create(user.id, recipe).await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Show one of the caller's recipes.
///
/// GET /api/recipe/recipes/{id}
///
/// # Errors
///
/// Returns 404 if the caller has no such recipe.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
) -> Result<Json<RecipeDetail>> {
    let recipe = RecipeService::new(state.pool()).get(id, user.id).await?;
    Ok(Json(recipe.into()))
}

/// Replace a recipe. `title`, `time_minutes` and `price` are required.
///
/// PUT /api/recipe/recipes/{id}
///
/// # Errors
///
/// Returns a validation error for missing or invalid fields, 404 if the
/// caller has no such recipe.
pub async fn replace(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
    ValidJson(payload): ValidJson<RecipePayload>,
) -> Result<Json<RecipeDetail>> {
    apply_update(&state, &user, id, payload, true).await
}

/// Partially update a recipe.
///
/// PATCH /api/recipe/recipes/{id}
///
/// # Errors
///
/// Returns a validation error for invalid fields, 404 if the caller has no
/// such recipe.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
    ValidJson(payload): ValidJson<RecipePayload>,
) -> Result<Json<RecipeDetail>> {
    apply_update(&state, &user, id, payload, false).await
}

async fn apply_update(
    state: &AppState,
    user: &User,
    id: RecipeId,
    payload: RecipePayload,
    full: bool,
) -> Result<Json<RecipeDetail>> {
    let changes = payload.into_changes(full).map_err(AppError::Validation)?;
    let recipe = RecipeService::new(state.pool())
        .update(id, user.id, changes)
        .await?;

    Ok(Json(recipe.into()))
}

/// Delete one of the caller's recipes.
///
/// DELETE /api/recipe/recipes/{id}
///
/// # Errors
///
/// Returns 404 if the caller has no such recipe.
pub async fn destroy(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
) -> Result<StatusCode> {
    RecipeService::new(state.pool())
        .delete(id, user.id, state.images())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Upload an image for one of the caller's recipes.
///
/// POST /api/recipe/recipes/{id}/upload-image (multipart, field `image`)
///
/// # Errors
///
/// Returns a validation error if no image was submitted or the file is not
/// an image, 404 if the caller has no such recipe.
pub async fn upload_image(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<RecipeId>,
    mut multipart: Multipart,
) -> Result<Json<ImageResponse>> {
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            data = Some(bytes.to_vec());
            break;
        }
    }
    let data = data.ok_or(ImageError::Missing)?;

    let recipe = RecipeService::new(state.pool())
        .attach_image(id, user.id, data, state.images())
        .await?;

    Ok(Json(ImageResponse {
        id: recipe.id,
        image: recipe.image.as_deref().map(public_url),
    }))
}
