//! Write inputs and read projections.
//!
//! Each read shape is built by an explicit function from entities plus the
//! derived flags computed in [`crate::aggregate`].

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{IngredientLine, Recipe, RecipeFlags, RecipeIngredient, Tag, User};

/// Everything needed to create a recipe.
#[derive(Debug, Clone)]
pub struct RecipeInput {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    /// Reference produced by the image intake.
    pub image: String,
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientLine>,
}

/// Partial update; `None` leaves the field (or the whole tag / ingredient set)
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<String>,
    pub tags: Option<Vec<Uuid>>,
    pub ingredients: Option<Vec<IngredientLine>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub is_subscribed: bool,
}

impl UserView {
    pub fn new(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar: user.avatar,
            is_subscribed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RecipeIngredientView {
    /// Ingredient id (not the join row id).
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipeIngredient> for RecipeIngredientView {
    fn from(row: RecipeIngredient) -> Self {
        Self {
            id: row.ingredient.id,
            name: row.ingredient.name,
            measurement_unit: row.ingredient.measurement_unit,
            amount: row.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RecipeView {
    pub id: Uuid,
    pub author: UserView,
    pub name: String,
    pub image: String,
    pub text: String,
    pub ingredients: Vec<RecipeIngredientView>,
    pub tags: Vec<Tag>,
    pub cooking_time: i32,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeView {
    pub fn new(
        recipe: Recipe,
        author: UserView,
        tags: Vec<Tag>,
        ingredients: Vec<RecipeIngredient>,
        flags: RecipeFlags,
    ) -> Self {
        Self {
            id: recipe.id,
            author,
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            tags,
            cooking_time: recipe.cooking_time,
            is_favorited: flags.is_favorited,
            is_in_shopping_cart: flags.is_in_shopping_cart,
        }
    }
}

/// Reduced recipe shape used in favorite, cart and subscription responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RecipeMini {
    pub id: Uuid,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<Recipe> for RecipeMini {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// An author as seen from their subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub author: UserView,
    pub recipes: Vec<RecipeMini>,
    pub recipes_count: i64,
}
