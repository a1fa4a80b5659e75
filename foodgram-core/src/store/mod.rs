//! Storage seam for recipes, carts and subscriptions.
//!
//! The server implements [`Store`] on top of PostgreSQL; [`MemoryStore`] keeps
//! everything in process for tests. Implementations must enforce the
//! uniqueness and referential rules themselves: callers pre-check for friendlier
//! errors, but the store is what rejects a concurrent duplicate.

mod memory;

pub use memory::{MemoryStore, RowCounts};

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    Ingredient, IngredientLine, NewRecipe, Recipe, RecipeChanges, RecipeFilter, RecipeFlags,
    RecipeIngredient, Relation, ShoppingListLine, Tag, User,
};

pub type StoreResult<T> = Result<T, StoreError>;

pub trait Store: Send + Sync {
    fn user(&self, id: Uuid) -> StoreResult<Option<User>>;

    fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    fn tags_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tag>>;

    fn ingredients_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Ingredient>>;

    fn recipe(&self, id: Uuid) -> StoreResult<Option<Recipe>>;

    /// Recipes matching `filter`, newest first.
    fn recipes(&self, filter: &RecipeFilter) -> StoreResult<Vec<Recipe>>;

    /// An author's recipes, newest first, at most `limit` of them.
    fn recipes_by_author(&self, author_id: Uuid, limit: Option<usize>) -> StoreResult<Vec<Recipe>>;

    /// Recipe totals per author. Authors without recipes may be absent.
    fn recipe_counts(&self, author_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>>;

    /// Whether `author_id` already has a recipe called `name`, ignoring `exclude`.
    fn recipe_name_taken(
        &self,
        author_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<bool>;

    /// `(recipe_id, tag)` pairs for the given recipes.
    fn recipe_tags(&self, recipe_ids: &[Uuid]) -> StoreResult<Vec<(Uuid, Tag)>>;

    fn recipe_ingredients(&self, recipe_ids: &[Uuid]) -> StoreResult<Vec<RecipeIngredient>>;

    /// Insert a recipe with its tag links and ingredient rows atomically.
    fn insert_recipe(
        &self,
        recipe: NewRecipe,
        tag_ids: &[Uuid],
        lines: &[IngredientLine],
    ) -> StoreResult<Recipe>;

    /// Apply scalar changes and, when given, replace the tag set and the
    /// ingredient rows, all in one transaction.
    fn update_recipe(
        &self,
        id: Uuid,
        changes: RecipeChanges,
        tag_ids: Option<&[Uuid]>,
        lines: Option<&[IngredientLine]>,
    ) -> StoreResult<Recipe>;

    /// Returns false when no such recipe existed.
    fn delete_recipe(&self, id: Uuid) -> StoreResult<bool>;

    fn relation_exists(&self, relation: Relation, user_id: Uuid, recipe_id: Uuid)
        -> StoreResult<bool>;

    fn insert_relation(&self, relation: Relation, user_id: Uuid, recipe_id: Uuid)
        -> StoreResult<()>;

    /// Returns false when there was nothing to delete.
    fn delete_relation(&self, relation: Relation, user_id: Uuid, recipe_id: Uuid)
        -> StoreResult<bool>;

    /// Favorite and cart flags of `user_id` for every recipe in `recipe_ids`,
    /// in a single round trip. Recipes without either relation may be absent.
    fn recipe_flags(
        &self,
        user_id: Uuid,
        recipe_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, RecipeFlags>>;

    /// Ingredient totals over every recipe in the user's cart, one line per
    /// (name, unit).
    fn shopping_list(&self, user_id: Uuid) -> StoreResult<Vec<ShoppingListLine>>;

    fn subscription_exists(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<bool>;

    fn insert_subscription(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()>;

    fn delete_subscription(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<bool>;

    /// The subset of `author_ids` that `subscriber_id` follows.
    fn subscribed_authors(
        &self,
        subscriber_id: Uuid,
        author_ids: &[Uuid],
    ) -> StoreResult<HashSet<Uuid>>;

    /// Authors followed by `subscriber_id`, ordered by username.
    fn subscriptions(&self, subscriber_id: Uuid) -> StoreResult<Vec<User>>;
}
