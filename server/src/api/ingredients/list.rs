use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use foodgram_core::Ingredient;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct IngredientSearch {
    /// Case-insensitive name prefix
    pub name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "ingredients",
    params(IngredientSearch),
    responses(
        (status = 200, description = "Matching ingredients ordered by name", body = Vec<Ingredient>)
    )
)]
pub async fn list_ingredients(
    State(app): State<AppState>,
    Query(search): Query<IngredientSearch>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let prefix = search.name.as_deref().map(str::trim).filter(|p| !p.is_empty());
    Ok(Json(app.store.search_ingredients(prefix)?))
}
