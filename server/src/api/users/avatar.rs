use crate::api::ErrorResponse;
use crate::auth::{set_avatar as store_avatar, AuthUser};
use crate::error::ApiError;
use crate::images;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use foodgram_core::User;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AvatarRequest {
    /// `data:image/<format>;base64,<payload>`
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AvatarResponse {
    /// Null when no avatar is set
    pub avatar: Option<String>,
}

impl From<&User> for AvatarResponse {
    fn from(user: &User) -> Self {
        Self {
            avatar: user.avatar.clone(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/users/me/avatar",
    tag = "users",
    responses(
        (status = 200, description = "Current avatar", body = AvatarResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_avatar(AuthUser(user): AuthUser) -> Json<AvatarResponse> {
    Json(AvatarResponse::from(&user))
}

#[utoipa::path(
    put,
    path = "/api/users/me/avatar",
    tag = "users",
    request_body = AvatarRequest,
    responses(
        (status = 200, description = "Avatar stored", body = AvatarResponse),
        (status = 400, description = "Invalid image", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_avatar(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
    Json(req): Json<AvatarRequest>,
) -> Result<Json<AvatarResponse>, ApiError> {
    let avatar = images::intake(&app.store, &req.avatar, app.config.max_image_bytes)?;

    if let Err(e) = store_avatar(&app.store, user.id, Some(&avatar)) {
        images::release(&app.store, &avatar);
        return Err(e.into());
    }
    if let Some(old) = user.avatar.as_deref() {
        images::release(&app.store, old);
    }

    Ok(Json(AvatarResponse {
        avatar: Some(avatar),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/users/me/avatar",
    tag = "users",
    responses(
        (status = 204, description = "Avatar removed"),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_avatar(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
) -> Result<StatusCode, ApiError> {
    store_avatar(&app.store, user.id, None)?;
    if let Some(old) = user.avatar.as_deref() {
        images::release(&app.store, old);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(avatar: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            avatar: avatar.map(str::to_string),
        }
    }

    #[test]
    fn test_avatar_response_is_null_when_unset() {
        let body = serde_json::to_value(AvatarResponse::from(&user(None))).unwrap();
        assert_eq!(body, serde_json::json!({ "avatar": null }));
    }

    #[test]
    fn test_avatar_response_carries_reference() {
        let reference = "/api/images/00000000-0000-0000-0000-000000000001";
        let response = AvatarResponse::from(&user(Some(reference)));
        assert_eq!(response.avatar.as_deref(), Some(reference));
    }
}
