use crate::api::ErrorResponse;
use crate::auth::MaybeAuthUser;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use foodgram_core::{get_recipe as fetch, RecipeView};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe", body = RecipeView),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    )
)]
pub async fn get_recipe(
    viewer: MaybeAuthUser,
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecipeView>, ApiError> {
    Ok(Json(fetch(&app.store, viewer.viewer(), id)?))
}
