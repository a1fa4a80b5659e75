use crate::api::ErrorResponse;
use crate::auth::MaybeAuthUser;
use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use foodgram_core::{list_recipes as query_recipes, paginate, recipe_views, Page, PageParams};
use foodgram_core::{RecipeQuery, RecipeView};
use std::fmt::Display;
use std::str::FromStr;
use utoipa::IntoParams;
use uuid::Uuid;

/// Query parameters for the recipe list. Parsed by hand from the raw pairs
/// because `tags` may repeat.
#[derive(Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListRecipesParams {
    /// 1-based page number (default: 1)
    pub page: Option<usize>,
    /// Items per page (default: 6, max: 100)
    pub limit: Option<usize>,
    /// Only recipes by this author
    pub author: Option<Uuid>,
    /// Tag slug; repeat to match any of several
    pub tags: Option<Vec<String>>,
    /// 1 to list only the caller's favorites
    pub is_favorited: Option<u8>,
    /// 1 to list only recipes in the caller's shopping cart
    pub is_in_shopping_cart: Option<u8>,
}

fn number<T>(key: &str, value: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| ApiError::bad_request(format!("Invalid {key}: {e}")))
}

fn flag(key: &str, value: &str) -> Result<bool, ApiError> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ApiError::bad_request(format!("{key} must be 0 or 1"))),
    }
}

pub fn parse_list_query(pairs: &[(String, String)]) -> Result<(RecipeQuery, PageParams), ApiError> {
    let mut query = RecipeQuery::default();
    let mut page = PageParams::default();

    for (key, value) in pairs {
        match key.as_str() {
            "page" => page.page = Some(number(key, value)?),
            "limit" => page.limit = Some(number(key, value)?),
            "author" => query.author = Some(number(key, value)?),
            "tags" if !value.is_empty() => query.tags.push(value.clone()),
            "is_favorited" => query.is_favorited = flag(key, value)?,
            "is_in_shopping_cart" => query.is_in_shopping_cart = flag(key, value)?,
            _ => {}
        }
    }

    Ok((query, page))
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    params(ListRecipesParams),
    responses(
        (status = 200, description = "Page of recipes, newest first", body = Page<RecipeView>),
        (status = 400, description = "Malformed query parameter", body = ErrorResponse)
    )
)]
pub async fn list_recipes(
    viewer: MaybeAuthUser,
    State(app): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Page<RecipeView>>, ApiError> {
    let (query, page_params) = parse_list_query(&pairs)?;
    let viewer = viewer.viewer();

    let recipes = query_recipes(&app.store, viewer, &query)?;
    let page = paginate(recipes, &page_params)
        .try_map(|recipes| recipe_views(&app.store, viewer, recipes))?;

    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_repeated_tags() {
        let (query, _) =
            parse_list_query(&pairs(&[("tags", "breakfast"), ("tags", "lunch")])).unwrap();
        assert_eq!(query.tags, vec!["breakfast", "lunch"]);
    }

    #[test]
    fn test_flags_and_paging() {
        let (query, page) = parse_list_query(&pairs(&[
            ("is_favorited", "1"),
            ("is_in_shopping_cart", "0"),
            ("page", "3"),
            ("limit", "10"),
        ]))
        .unwrap();
        assert!(query.is_favorited);
        assert!(!query.is_in_shopping_cart);
        assert_eq!(page.page(), 3);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn test_author() {
        let id = Uuid::new_v4();
        let (query, _) = parse_list_query(&pairs(&[("author", id.to_string().as_str())])).unwrap();
        assert_eq!(query.author, Some(id));
    }

    #[test]
    fn test_defaults() {
        let (query, page) = parse_list_query(&[]).unwrap();
        assert!(query.tags.is_empty());
        assert_eq!(query.author, None);
        assert!(!query.is_favorited);
        assert_eq!(page.page(), 1);
        assert_eq!(page.limit(), 6);
    }

    #[test]
    fn test_rejects_malformed_values() {
        assert!(parse_list_query(&pairs(&[("author", "bob")])).is_err());
        assert!(parse_list_query(&pairs(&[("page", "two")])).is_err());
        assert!(parse_list_query(&pairs(&[("is_favorited", "yes")])).is_err());
    }

    #[test]
    fn test_ignores_unknown_keys() {
        assert!(parse_list_query(&pairs(&[("format", "json")])).is_ok());
    }
}
