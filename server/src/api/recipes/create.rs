use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::images;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use foodgram_core::{create_recipe as create, IngredientLine, RecipeInput, RecipeView};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateRecipeRequest {
    pub ingredients: Vec<IngredientLine>,
    /// Tag IDs
    pub tags: Vec<Uuid>,
    /// `data:image/<format>;base64,<payload>`
    pub image: String,
    pub name: String,
    pub text: String,
    /// Minutes
    pub cooking_time: i32,
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = CreateRecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeView),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
    Json(req): Json<CreateRecipeRequest>,
) -> Result<(StatusCode, Json<RecipeView>), ApiError> {
    let image = images::intake(&app.store, &req.image, app.config.max_image_bytes)?;

    let input = RecipeInput {
        name: req.name,
        text: req.text,
        cooking_time: req.cooking_time,
        image: image.clone(),
        tags: req.tags,
        ingredients: req.ingredients,
    };

    match create(&app.store, user.id, input) {
        Ok(view) => Ok((StatusCode::CREATED, Json(view))),
        Err(e) => {
            images::release(&app.store, &image);
            Err(e.into())
        }
    }
}
