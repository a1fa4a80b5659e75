use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::images;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use foodgram_core::{update_recipe as update, IngredientLine, RecipePatch, RecipeView, Store};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Omitted fields are left as they are. Sending `tags` or `ingredients`
/// replaces the whole set.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRecipeRequest {
    pub ingredients: Option<Vec<IngredientLine>>,
    pub tags: Option<Vec<Uuid>>,
    /// `data:image/<format>;base64,<payload>`
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    request_body = UpdateRecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeView),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRecipeRequest>,
) -> Result<Json<RecipeView>, ApiError> {
    let (image, previous) = match req.image.as_deref() {
        Some(data_url) => {
            let previous = app.store.recipe(id)?.map(|recipe| recipe.image);
            let image = images::intake(&app.store, data_url, app.config.max_image_bytes)?;
            (Some(image), previous)
        }
        None => (None, None),
    };

    let patch = RecipePatch {
        name: req.name,
        text: req.text,
        cooking_time: req.cooking_time,
        image: image.clone(),
        tags: req.tags,
        ingredients: req.ingredients,
    };

    match update(&app.store, id, user.id, patch) {
        Ok(view) => {
            if let Some(old) = previous {
                images::release(&app.store, &old);
            }
            Ok(Json(view))
        }
        Err(e) => {
            if let Some(new) = image {
                images::release(&app.store, &new);
            }
            Err(e.into())
        }
    }
}
