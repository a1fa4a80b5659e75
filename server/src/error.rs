use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use foodgram_core::StoreError;
use thiserror::Error;

use crate::api::ErrorResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] foodgram_core::Error),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Core(err.into())
    }
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        use foodgram_core::Error as Core;
        match self {
            ApiError::Core(Core::Validation(_) | Core::Conflict(_)) => StatusCode::BAD_REQUEST,
            ApiError::Core(Core::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Core(Core::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            ApiError::Core(Core::Store(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = if status.is_server_error() {
            tracing::error!(error = %self, "internal error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foodgram_core::Error as Core;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(Core::validation("bad")), StatusCode::BAD_REQUEST),
            (
                ApiError::from(Core::Conflict("dup".into())),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::from(Core::not_found("gone")), StatusCode::NOT_FOUND),
            (
                ApiError::from(Core::PermissionDenied("no".into())),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::from(StoreError::Backend("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::unauthorized("who"), StatusCode::UNAUTHORIZED),
            (ApiError::bad_request("what"), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{err:?}");
        }
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response =
            ApiError::from(StoreError::Backend("password=hunter2".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }

    #[test]
    fn test_client_errors_keep_message() {
        let err = ApiError::from(Core::validation("Cooking time must be between 1 and 32000"));
        assert_eq!(err.to_string(), "Cooking time must be between 1 and 32000");
    }
}
