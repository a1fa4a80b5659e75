use crate::api::ErrorResponse;
use crate::auth::{hash_password, password_hash, set_password_hash, verify_password, AuthUser};
use crate::error::ApiError;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use foodgram_core::validation::validate_password;
use foodgram_core::Error;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SetPasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[utoipa::path(
    post,
    path = "/api/users/set_password",
    tag = "users",
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password or weak new one", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_password(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
    Json(req): Json<SetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let stored = password_hash(&app.store, user.id)?;
    if !verify_password(&req.current_password, &stored) {
        return Err(Error::validation("Current password is incorrect").into());
    }
    validate_password(&req.new_password)?;

    let hash = hash_password(&req.new_password, app.config.insecure_password_hashing)
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))?;
    set_password_hash(&app.store, user.id, &hash)?;

    tracing::info!(user_id = %user.id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}
