use crate::api::ErrorResponse;
use crate::auth::{create_session, find_by_email, verify_password};
use crate::error::ApiError;
use crate::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const BAD_CREDENTIALS: &str = "Unable to log in with provided credentials";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub auth_token: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/token/login",
    tag = "auth",
    request_body(content = LoginRequest, example = json!({"email": "cook@example.com", "password": "correct-horse"})),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(app): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Some(user) = find_by_email(&app.store, req.email.trim())? else {
        return Err(ApiError::bad_request(BAD_CREDENTIALS));
    };
    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::bad_request(BAD_CREDENTIALS));
    }

    let auth_token = create_session(&app.store, user.id, app.config.session_ttl_days)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(LoginResponse { auth_token }))
}
