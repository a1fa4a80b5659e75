use crate::api::ErrorResponse;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use foodgram_core::{Error, Ingredient};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    tag = "ingredients",
    params(
        ("id" = Uuid, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient", body = Ingredient),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    )
)]
pub async fn get_ingredient(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ingredient>, ApiError> {
    let ingredient = app
        .store
        .ingredient(id)?
        .ok_or_else(|| Error::not_found("Ingredient not found"))?;
    Ok(Json(ingredient))
}
