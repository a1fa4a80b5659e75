use crate::api::ErrorResponse;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use foodgram_core::{Error, Tag};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/tags/{id}",
    tag = "tags",
    params(
        ("id" = Uuid, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Tag", body = Tag),
        (status = 404, description = "Tag not found", body = ErrorResponse)
    )
)]
pub async fn get_tag(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Tag>, ApiError> {
    let tag = app
        .store
        .tag(id)?
        .ok_or_else(|| Error::not_found("Tag not found"))?;
    Ok(Json(tag))
}
