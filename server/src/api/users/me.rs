use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use axum::Json;
use foodgram_core::UserView;

#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "users",
    responses(
        (status = 200, description = "The authenticated user", body = UserView),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn me(AuthUser(user): AuthUser) -> Json<UserView> {
    // Nobody can subscribe to themselves.
    Json(UserView::new(user, false))
}
