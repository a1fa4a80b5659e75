use crate::error::ApiError;
use crate::AppState;
use axum::{extract::State, Json};
use foodgram_core::Tag;

#[utoipa::path(
    get,
    path = "/api/tags",
    tag = "tags",
    responses(
        (status = 200, description = "All tags ordered by name", body = Vec<Tag>)
    )
)]
pub async fn list_tags(State(app): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(app.store.list_tags()?))
}
