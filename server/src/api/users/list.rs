use crate::api::ErrorResponse;
use crate::auth::MaybeAuthUser;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use foodgram_core::{annotate_users, paginate, Page, PageParams, UserView};
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(PageParams),
    responses(
        (status = 200, description = "Page of users ordered by username", body = Page<UserView>),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    )
)]
pub async fn list_users(
    viewer: MaybeAuthUser,
    State(app): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<UserView>>, ApiError> {
    let page = paginate(app.store.list_users()?, &params);

    let ids: Vec<Uuid> = page.results.iter().map(|u| u.id).collect();
    let subscribed = annotate_users(&app.store, viewer.viewer(), &ids)?;

    let page = page.try_map(|users| {
        Ok::<_, ApiError>(
            users
                .into_iter()
                .map(|user| {
                    let is_subscribed = subscribed.contains(&user.id);
                    UserView::new(user, is_subscribed)
                })
                .collect(),
        )
    })?;
    Ok(Json(page))
}
