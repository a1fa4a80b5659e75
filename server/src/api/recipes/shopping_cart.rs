use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use foodgram_core::{add_relation, remove_relation, RecipeMini, Relation};
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to the shopping cart", body = RecipeMini),
        (status = 400, description = "Already in the shopping cart", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_to_cart(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<RecipeMini>), ApiError> {
    let mini = add_relation(&app.store, Relation::ShoppingCart, user.id, id)?;
    Ok((StatusCode::CREATED, Json(mini)))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from the shopping cart"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found or not in the cart", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_from_cart(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    remove_relation(&app.store, Relation::ShoppingCart, user.id, id)?;
    Ok(StatusCode::NO_CONTENT)
}
