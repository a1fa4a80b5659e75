use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use foodgram_core::{paginate, subscription_views, Page, PageParams, Store, SubscriptionView};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
pub struct SubscriptionParams {
    /// 1-based page number (default: 1)
    pub page: Option<usize>,
    /// Authors per page (default: 6, max: 100)
    pub limit: Option<usize>,
    /// Cap on the recipes listed under each author
    pub recipes_limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions",
    tag = "users",
    params(SubscriptionParams),
    responses(
        (status = 200, description = "Followed authors ordered by username", body = Page<SubscriptionView>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_subscriptions(
    AuthUser(user): AuthUser,
    State(app): State<AppState>,
    Query(params): Query<SubscriptionParams>,
) -> Result<Json<Page<SubscriptionView>>, ApiError> {
    let page_params = PageParams {
        page: params.page,
        limit: params.limit,
    };
    // Only the served page gets its recipes loaded.
    let page = paginate(app.store.subscriptions(user.id)?, &page_params)
        .try_map(|authors| subscription_views(&app.store, authors, params.recipes_limit))?;
    Ok(Json(page))
}
