use crate::api::ErrorResponse;
use crate::auth::{bearer_token, delete_session, AuthUser};
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};

#[utoipa::path(
    post,
    path = "/api/auth/token/logout",
    tag = "auth",
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    if let Some(token) = bearer_token(&headers)? {
        delete_session(&app.store, token)?;
    }
    tracing::info!(user_id = %user.id, "user logged out");
    Ok(StatusCode::NO_CONTENT)
}
