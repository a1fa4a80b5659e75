use crate::api::ErrorResponse;
use crate::auth::{create_user, find_by_email, hash_password, username_taken};
use crate::error::ApiError;
use crate::models::NewUser;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use foodgram_core::validation::{validate_new_account, NewAccount};
use foodgram_core::{Error, StoreError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body(content = RegisterRequest, example = json!({
        "email": "cook@example.com",
        "username": "cook",
        "first_name": "Anna",
        "last_name": "Petrova",
        "password": "correct-horse"
    })),
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid or duplicate fields", body = ErrorResponse)
    )
)]
pub async fn register(
    State(app): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let email = req.email.trim();
    let username = req.username.trim();

    validate_new_account(&NewAccount {
        email,
        username,
        first_name: req.first_name.trim(),
        last_name: req.last_name.trim(),
        password: &req.password,
    })?;

    if find_by_email(&app.store, email)?.is_some() {
        return Err(Error::validation("A user with this email already exists").into());
    }
    if username_taken(&app.store, username)? {
        return Err(Error::validation("A user with this username already exists").into());
    }

    let password_hash = hash_password(&req.password, app.config.insecure_password_hashing)
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))?;

    let new_user = NewUser {
        email,
        username,
        first_name: req.first_name.trim(),
        last_name: req.last_name.trim(),
        password_hash: &password_hash,
    };
    let user = create_user(&app.store, &new_user).map_err(|err| match err {
        StoreError::UniqueViolation(_) => {
            ApiError::from(Error::validation("A user with these credentials already exists"))
        }
        other => other.into(),
    })?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }),
    ))
}
