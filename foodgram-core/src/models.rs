//! Entities shared by every store implementation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Reference handed out by the image intake, if an avatar is set.
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    /// Opaque image reference; never decoded here.
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
}

/// Write-side ingredient line: which ingredient and how much of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IngredientLine {
    #[serde(rename = "id")]
    pub ingredient_id: Uuid,
    pub amount: i32,
}

/// Read-side ingredient row joined with its ingredient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredient {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub ingredient: Ingredient,
    pub amount: i32,
}

#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Scalar recipe fields to overwrite; `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

/// Store-level recipe filter, with every viewer-relative condition already
/// resolved to a concrete user id.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<Uuid>,
    /// Tag slugs; a recipe matches if it carries any of them.
    pub tags: Vec<String>,
    pub favorited_by: Option<Uuid>,
    pub in_cart_of: Option<Uuid>,
}

/// Which per-user recipe relation a toggle targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    Favorite,
    ShoppingCart,
}

/// Identity of whoever is reading. Derived flags are all false for anonymous
/// viewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(Uuid),
}

impl Viewer {
    pub fn user_id(self) -> Option<Uuid> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(id),
        }
    }
}

impl From<Option<Uuid>> for Viewer {
    fn from(id: Option<Uuid>) -> Self {
        id.map_or(Viewer::Anonymous, Viewer::User)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecipeFlags {
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// One consolidated line of a shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTag {
    pub name: String,
    pub slug: String,
}
