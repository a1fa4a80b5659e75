use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use foodgram_core::SubscriptionView;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
pub struct RecipesLimit {
    /// Cap on the recipes listed under the author
    pub recipes_limit: Option<usize>,
}

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "Author ID"),
        RecipesLimit
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionView),
        (status = 400, description = "Already subscribed or subscribing to yourself", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
    Path(author_id): Path<Uuid>,
    Query(params): Query<RecipesLimit>,
) -> Result<(StatusCode, Json<SubscriptionView>), ApiError> {
    let view = foodgram_core::subscribe(&app.store, user.id, author_id, params.recipes_limit)?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "User not found or not subscribed", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
    Path(author_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    foodgram_core::unsubscribe(&app.store, user.id, author_id)?;
    Ok(StatusCode::NO_CONTENT)
}
