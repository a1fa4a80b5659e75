use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
};
use foodgram_core::{compute_shopping_list, render_shopping_list, SHOPPING_LIST_FILENAME};

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart",
    tag = "recipes",
    responses(
        (status = 200, description = "Consolidated shopping list, one `name - amount unit` per line", content_type = "text/plain"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
) -> Result<Response, ApiError> {
    let lines = compute_shopping_list(&app.store, user.id)?;
    let body = render_shopping_list(&lines);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
        )
        .body(Body::from(body))
        .map_err(|e| ApiError::Internal(format!("failed to build shopping list response: {e}")))
}
