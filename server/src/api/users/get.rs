use crate::api::ErrorResponse;
use crate::auth::MaybeAuthUser;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use foodgram_core::{annotate_user, Error, Store, UserView};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserView),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    viewer: MaybeAuthUser,
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, ApiError> {
    let user = app
        .store
        .user(id)?
        .ok_or_else(|| Error::not_found("User not found"))?;
    let is_subscribed = annotate_user(&app.store, user.id, viewer.viewer())?;
    Ok(Json(UserView::new(user, is_subscribed)))
}
