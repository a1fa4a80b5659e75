use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::images;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use foodgram_core::{delete_recipe as delete, Store};
use uuid::Uuid;

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = Uuid, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_recipe(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let image = app.store.recipe(id)?.map(|recipe| recipe.image);

    delete(&app.store, id, user.id)?;

    if let Some(image) = image {
        images::release(&app.store, &image);
    }
    Ok(StatusCode::NO_CONTENT)
}
