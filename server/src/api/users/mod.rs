pub mod avatar;
pub mod get;
pub mod list;
pub mod me;
pub mod register;
pub mod set_password;
pub mod subscribe;
pub mod subscriptions;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/users endpoints (mounted at /api/users)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_users).post(register::register))
        .route("/me", get(me::me))
        .route(
            "/me/avatar",
            get(avatar::get_avatar)
                .put(avatar::set_avatar)
                .delete(avatar::delete_avatar),
        )
        .route("/set_password", post(set_password::set_password))
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route("/{id}", get(get::get_user))
        .route(
            "/{id}/subscribe",
            post(subscribe::subscribe).delete(subscribe::unsubscribe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_users,
        register::register,
        get::get_user,
        me::me,
        set_password::set_password,
        avatar::get_avatar,
        avatar::set_avatar,
        avatar::delete_avatar,
        subscriptions::list_subscriptions,
        subscribe::subscribe,
        subscribe::unsubscribe,
    ),
    components(schemas(
        foodgram_core::UserView,
        foodgram_core::SubscriptionView,
        foodgram_core::RecipeMini,
        register::RegisterRequest,
        register::RegisterResponse,
        set_password::SetPasswordRequest,
        avatar::AvatarRequest,
        avatar::AvatarResponse,
    ))
)]
pub struct ApiDoc;
