use crate::api::ErrorResponse;
use crate::error::ApiError;
use crate::images::load_image;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};
use foodgram_core::Error;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/images/{id}",
    tag = "images",
    params(
        ("id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn get_image(
    State(app): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let image = load_image(&app.store, id)?.ok_or_else(|| Error::not_found("Image not found"))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, image.content_type)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(image.data))
        .map_err(|e| ApiError::Internal(format!("failed to build image response: {e}")))
}
