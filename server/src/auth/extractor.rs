use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use foodgram_core::{User, Viewer};

use super::db::get_user_from_token;
use crate::error::ApiError;
use crate::AppState;

/// The authenticated user. Rejects with 401 when no valid token is sent.
pub struct AuthUser(pub User);

/// The user behind the request's token, if one was sent. A token that is
/// present but unknown or expired is still a 401.
pub struct MaybeAuthUser(pub Option<User>);

impl MaybeAuthUser {
    pub fn viewer(&self) -> Viewer {
        self.0.as_ref().map(|user| user.id).into()
    }
}

/// Accepts both `Token <t>` and `Bearer <t>`.
pub fn parse_authorization(value: &str) -> Option<&str> {
    let token = value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header"))?;
    parse_authorization(value)
        .map(Some)
        .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers)? else {
            return Ok(MaybeAuthUser(None));
        };
        match get_user_from_token(&state.store, token)? {
            Some(user) => Ok(MaybeAuthUser(Some(user))),
            None => Err(ApiError::unauthorized("Invalid or expired token")),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        MaybeAuthUser::from_request_parts(parts, state)
            .await?
            .0
            .map(AuthUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided"))
    }
}
