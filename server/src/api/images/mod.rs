pub mod get;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/images endpoints (mounted at /api/images)
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(get::get_image))
}

#[derive(OpenApi)]
#[openapi(paths(get::get_image))]
pub struct ApiDoc;
