use chrono::{DateTime, Utc};
use diesel::prelude::*;
use foodgram_core::{Ingredient, Recipe, RecipeChanges, RecipeIngredient, Tag, User};
use uuid::Uuid;

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub avatar: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            avatar: row.avatar,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession<'a> {
    pub user_id: Uuid,
    pub token_hash: &'a str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImageRow {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::images)]
pub struct NewImage<'a> {
    pub content_type: &'a str,
    pub data: &'a [u8],
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TagRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            name: row.name,
            slug: row.slug,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::tags)]
pub struct NewTagRow<'a> {
    pub name: &'a str,
    pub slug: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IngredientRow {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Ingredient {
            id: row.id,
            name: row.name,
            measurement_unit: row.measurement_unit,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::ingredients)]
pub struct NewIngredientRow<'a> {
    pub name: &'a str,
    pub measurement_unit: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Recipe {
            id: row.id,
            author_id: row.author_id,
            name: row.name,
            image: row.image,
            text: row.text,
            cooking_time: row.cooking_time,
            created_at: row.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipeRow<'a> {
    pub author_id: Uuid,
    pub name: &'a str,
    pub image: &'a str,
    pub text: &'a str,
    pub cooking_time: i32,
}

/// Only the `Some` fields are written.
#[derive(AsChangeset, Default)]
#[diesel(table_name = crate::schema::recipes)]
pub struct RecipeChangeset {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

impl RecipeChangeset {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.image.is_none()
            && self.text.is_none()
            && self.cooking_time.is_none()
    }
}

impl From<RecipeChanges> for RecipeChangeset {
    fn from(changes: RecipeChanges) -> Self {
        RecipeChangeset {
            name: changes.name,
            image: changes.image,
            text: changes.text,
            cooking_time: changes.cooking_time,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipe_tags)]
pub struct NewRecipeTag {
    pub recipe_id: Uuid,
    pub tag_id: Uuid,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::recipe_ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeIngredientRow {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub amount: i32,
}

impl RecipeIngredientRow {
    pub fn with_ingredient(self, ingredient: IngredientRow) -> RecipeIngredient {
        RecipeIngredient {
            id: self.id,
            recipe_id: self.recipe_id,
            ingredient: ingredient.into(),
            amount: self.amount,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipe_ingredients)]
pub struct NewRecipeIngredient {
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub amount: i32,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::favorites)]
pub struct NewFavorite {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::shopping_cart_entries)]
pub struct NewCartEntry {
    pub user_id: Uuid,
    pub recipe_id: Uuid,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::subscriptions)]
pub struct NewSubscription {
    pub subscriber_id: Uuid,
    pub author_id: Uuid,
}
