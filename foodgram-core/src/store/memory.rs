//! In-process store for tests.
//!
//! Every call takes the single table lock, so a check and the write that
//! follows it inside one call are atomic, the same guarantee a database
//! transaction gives the PostgreSQL store. Each call also counts as one query,
//! which lets tests assert that list endpoints do not issue a query per item.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use super::{Store, StoreResult};
use crate::aggregate::consolidate;
use crate::error::StoreError;
use crate::models::{
    Ingredient, IngredientLine, NewRecipe, Recipe, RecipeChanges, RecipeFilter, RecipeFlags,
    RecipeIngredient, Relation, ShoppingListLine, Tag, User,
};

#[derive(Debug, Clone)]
struct IngredientRow {
    id: Uuid,
    recipe_id: Uuid,
    ingredient_id: Uuid,
    amount: i32,
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    tags: Vec<Tag>,
    ingredients: Vec<Ingredient>,
    /// Insertion order, oldest first.
    recipes: Vec<Recipe>,
    recipe_tags: Vec<(Uuid, Uuid)>,
    recipe_ingredients: Vec<IngredientRow>,
    favorites: Vec<(Uuid, Uuid)>,
    cart: Vec<(Uuid, Uuid)>,
    /// (subscriber, author)
    subscriptions: Vec<(Uuid, Uuid)>,
}

impl Tables {
    fn relation(&self, relation: Relation) -> &Vec<(Uuid, Uuid)> {
        match relation {
            Relation::Favorite => &self.favorites,
            Relation::ShoppingCart => &self.cart,
        }
    }

    fn relation_mut(&mut self, relation: Relation) -> &mut Vec<(Uuid, Uuid)> {
        match relation {
            Relation::Favorite => &mut self.favorites,
            Relation::ShoppingCart => &mut self.cart,
        }
    }

    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn recipe_exists(&self, id: Uuid) -> bool {
        self.recipes.iter().any(|r| r.id == id)
    }

    fn name_taken(&self, author_id: Uuid, name: &str, exclude: Option<Uuid>) -> bool {
        self.recipes
            .iter()
            .any(|r| r.author_id == author_id && r.name == name && Some(r.id) != exclude)
    }

    fn check_links(&self, tag_ids: Option<&[Uuid]>, lines: Option<&[IngredientLine]>) -> StoreResult<()> {
        if let Some(tag_ids) = tag_ids {
            if tag_ids
                .iter()
                .any(|id| !self.tags.iter().any(|t| t.id == *id))
            {
                return Err(StoreError::ForeignKeyViolation(
                    "recipe_tags_tag_id_fkey".to_string(),
                ));
            }
            if has_duplicates(tag_ids.iter().copied()) {
                return Err(StoreError::UniqueViolation("recipe_tags_pkey".to_string()));
            }
        }

        if let Some(lines) = lines {
            if lines
                .iter()
                .any(|l| !self.ingredients.iter().any(|i| i.id == l.ingredient_id))
            {
                return Err(StoreError::ForeignKeyViolation(
                    "recipe_ingredients_ingredient_id_fkey".to_string(),
                ));
            }
            if has_duplicates(lines.iter().map(|l| l.ingredient_id)) {
                return Err(StoreError::UniqueViolation(
                    "recipe_ingredients_recipe_id_ingredient_id_key".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn write_links(&mut self, recipe_id: Uuid, tag_ids: Option<&[Uuid]>, lines: Option<&[IngredientLine]>) {
        if let Some(tag_ids) = tag_ids {
            self.recipe_tags.retain(|(r, _)| *r != recipe_id);
            self.recipe_tags
                .extend(tag_ids.iter().map(|tag_id| (recipe_id, *tag_id)));
        }
        if let Some(lines) = lines {
            self.recipe_ingredients.retain(|row| row.recipe_id != recipe_id);
            self.recipe_ingredients
                .extend(lines.iter().map(|line| IngredientRow {
                    id: Uuid::new_v4(),
                    recipe_id,
                    ingredient_id: line.ingredient_id,
                    amount: line.amount,
                }));
        }
    }
}

fn has_duplicates(ids: impl Iterator<Item = Uuid>) -> bool {
    let mut seen = HashSet::new();
    ids.into_iter().any(|id| !seen.insert(id))
}

/// Row totals per table, for asserting that a failed operation wrote nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub recipes: usize,
    pub recipe_tags: usize,
    pub recipe_ingredients: usize,
    pub favorites: usize,
    pub cart_entries: usize,
    pub subscriptions: usize,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    /// Number of store calls made so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn row_counts(&self) -> StoreResult<RowCounts> {
        let tables = self.lock()?;
        Ok(RowCounts {
            recipes: tables.recipes.len(),
            recipe_tags: tables.recipe_tags.len(),
            recipe_ingredients: tables.recipe_ingredients.len(),
            favorites: tables.favorites.len(),
            cart_entries: tables.cart.len(),
            subscriptions: tables.subscriptions.len(),
        })
    }

    pub fn add_user(&self, username: &str) -> StoreResult<User> {
        let mut tables = self.lock()?;
        if tables.users.iter().any(|u| u.username == username) {
            return Err(StoreError::UniqueViolation("users_username_key".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            avatar: None,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    pub fn add_tag(&self, name: &str, slug: &str) -> StoreResult<Tag> {
        let mut tables = self.lock()?;
        if tables.tags.iter().any(|t| t.name == name || t.slug == slug) {
            return Err(StoreError::UniqueViolation("tags_slug_key".to_string()));
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
        };
        tables.tags.push(tag.clone());
        Ok(tag)
    }

    pub fn add_ingredient(&self, name: &str, measurement_unit: &str) -> StoreResult<Ingredient> {
        let mut tables = self.lock()?;
        if tables
            .ingredients
            .iter()
            .any(|i| i.name == name && i.measurement_unit == measurement_unit)
        {
            return Err(StoreError::UniqueViolation(
                "ingredients_name_measurement_unit_key".to_string(),
            ));
        }
        let ingredient = Ingredient {
            id: Uuid::new_v4(),
            name: name.to_string(),
            measurement_unit: measurement_unit.to_string(),
        };
        tables.ingredients.push(ingredient.clone());
        Ok(ingredient)
    }
}

impl Store for MemoryStore {
    fn user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.lock()?;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let tables = self.lock()?;
        Ok(tables
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    fn tags_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tag>> {
        let tables = self.lock()?;
        Ok(tables
            .tags
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    fn ingredients_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Ingredient>> {
        let tables = self.lock()?;
        Ok(tables
            .ingredients
            .iter()
            .filter(|i| ids.contains(&i.id))
            .cloned()
            .collect())
    }

    fn recipe(&self, id: Uuid) -> StoreResult<Option<Recipe>> {
        let tables = self.lock()?;
        Ok(tables.recipes.iter().find(|r| r.id == id).cloned())
    }

    fn recipes(&self, filter: &RecipeFilter) -> StoreResult<Vec<Recipe>> {
        let tables = self.lock()?;

        let tagged: Option<HashSet<Uuid>> = (!filter.tags.is_empty()).then(|| {
            let tag_ids: HashSet<Uuid> = tables
                .tags
                .iter()
                .filter(|t| filter.tags.contains(&t.slug))
                .map(|t| t.id)
                .collect();
            tables
                .recipe_tags
                .iter()
                .filter(|(_, tag_id)| tag_ids.contains(tag_id))
                .map(|(recipe_id, _)| *recipe_id)
                .collect()
        });

        Ok(tables
            .recipes
            .iter()
            .rev()
            .filter(|r| filter.author.is_none_or(|a| r.author_id == a))
            .filter(|r| tagged.as_ref().is_none_or(|ids| ids.contains(&r.id)))
            .filter(|r| {
                filter
                    .favorited_by
                    .is_none_or(|u| tables.favorites.contains(&(u, r.id)))
            })
            .filter(|r| {
                filter
                    .in_cart_of
                    .is_none_or(|u| tables.cart.contains(&(u, r.id)))
            })
            .cloned()
            .collect())
    }

    fn recipes_by_author(&self, author_id: Uuid, limit: Option<usize>) -> StoreResult<Vec<Recipe>> {
        let tables = self.lock()?;
        Ok(tables
            .recipes
            .iter()
            .rev()
            .filter(|r| r.author_id == author_id)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn recipe_counts(&self, author_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>> {
        let tables = self.lock()?;
        let mut counts = HashMap::new();
        for recipe in tables.recipes.iter().filter(|r| author_ids.contains(&r.author_id)) {
            *counts.entry(recipe.author_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn recipe_name_taken(
        &self,
        author_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<bool> {
        let tables = self.lock()?;
        Ok(tables.name_taken(author_id, name, exclude))
    }

    fn recipe_tags(&self, recipe_ids: &[Uuid]) -> StoreResult<Vec<(Uuid, Tag)>> {
        let tables = self.lock()?;
        Ok(tables
            .recipe_tags
            .iter()
            .filter(|(recipe_id, _)| recipe_ids.contains(recipe_id))
            .filter_map(|(recipe_id, tag_id)| {
                tables
                    .tags
                    .iter()
                    .find(|t| t.id == *tag_id)
                    .map(|t| (*recipe_id, t.clone()))
            })
            .collect())
    }

    fn recipe_ingredients(&self, recipe_ids: &[Uuid]) -> StoreResult<Vec<RecipeIngredient>> {
        let tables = self.lock()?;
        Ok(tables
            .recipe_ingredients
            .iter()
            .filter(|row| recipe_ids.contains(&row.recipe_id))
            .filter_map(|row| {
                tables
                    .ingredients
                    .iter()
                    .find(|i| i.id == row.ingredient_id)
                    .map(|ingredient| RecipeIngredient {
                        id: row.id,
                        recipe_id: row.recipe_id,
                        ingredient: ingredient.clone(),
                        amount: row.amount,
                    })
            })
            .collect())
    }

    fn insert_recipe(
        &self,
        recipe: NewRecipe,
        tag_ids: &[Uuid],
        lines: &[IngredientLine],
    ) -> StoreResult<Recipe> {
        let mut tables = self.lock()?;

        if !tables.user_exists(recipe.author_id) {
            return Err(StoreError::ForeignKeyViolation(
                "recipes_author_id_fkey".to_string(),
            ));
        }
        if tables.name_taken(recipe.author_id, &recipe.name, None) {
            return Err(StoreError::UniqueViolation(
                "recipes_author_id_name_key".to_string(),
            ));
        }
        tables.check_links(Some(tag_ids), Some(lines))?;

        let created = Recipe {
            id: Uuid::new_v4(),
            author_id: recipe.author_id,
            name: recipe.name,
            image: recipe.image,
            text: recipe.text,
            cooking_time: recipe.cooking_time,
            created_at: Utc::now(),
        };
        tables.recipes.push(created.clone());
        tables.write_links(created.id, Some(tag_ids), Some(lines));

        Ok(created)
    }

    fn update_recipe(
        &self,
        id: Uuid,
        changes: RecipeChanges,
        tag_ids: Option<&[Uuid]>,
        lines: Option<&[IngredientLine]>,
    ) -> StoreResult<Recipe> {
        let mut tables = self.lock()?;

        let author_id = tables
            .recipes
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.author_id)
            .ok_or(StoreError::NotFound)?;
        if let Some(name) = changes.name.as_deref() {
            if tables.name_taken(author_id, name, Some(id)) {
                return Err(StoreError::UniqueViolation(
                    "recipes_author_id_name_key".to_string(),
                ));
            }
        }
        tables.check_links(tag_ids, lines)?;

        tables.write_links(id, tag_ids, lines);
        let recipe = tables
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(name) = changes.name {
            recipe.name = name;
        }
        if let Some(image) = changes.image {
            recipe.image = image;
        }
        if let Some(text) = changes.text {
            recipe.text = text;
        }
        if let Some(cooking_time) = changes.cooking_time {
            recipe.cooking_time = cooking_time;
        }

        Ok(recipe.clone())
    }

    fn delete_recipe(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        if !tables.recipe_exists(id) {
            return Ok(false);
        }
        tables.recipes.retain(|r| r.id != id);
        tables.recipe_tags.retain(|(r, _)| *r != id);
        tables.recipe_ingredients.retain(|row| row.recipe_id != id);
        tables.favorites.retain(|(_, r)| *r != id);
        tables.cart.retain(|(_, r)| *r != id);
        Ok(true)
    }

    fn relation_exists(
        &self,
        relation: Relation,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> StoreResult<bool> {
        let tables = self.lock()?;
        Ok(tables.relation(relation).contains(&(user_id, recipe_id)))
    }

    fn insert_relation(
        &self,
        relation: Relation,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> StoreResult<()> {
        let mut tables = self.lock()?;
        if !tables.user_exists(user_id) || !tables.recipe_exists(recipe_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "{relation:?} references a missing row"
            )));
        }
        let rows = tables.relation_mut(relation);
        if rows.contains(&(user_id, recipe_id)) {
            return Err(StoreError::UniqueViolation(format!(
                "{relation:?} (user, recipe)"
            )));
        }
        rows.push((user_id, recipe_id));
        Ok(())
    }

    fn delete_relation(
        &self,
        relation: Relation,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        let rows = tables.relation_mut(relation);
        let before = rows.len();
        rows.retain(|pair| *pair != (user_id, recipe_id));
        Ok(rows.len() != before)
    }

    fn recipe_flags(
        &self,
        user_id: Uuid,
        recipe_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, RecipeFlags>> {
        let tables = self.lock()?;
        Ok(recipe_ids
            .iter()
            .map(|id| {
                let flags = RecipeFlags {
                    is_favorited: tables.favorites.contains(&(user_id, *id)),
                    is_in_shopping_cart: tables.cart.contains(&(user_id, *id)),
                };
                (*id, flags)
            })
            .collect())
    }

    fn shopping_list(&self, user_id: Uuid) -> StoreResult<Vec<ShoppingListLine>> {
        let tables = self.lock()?;
        let in_cart: HashSet<Uuid> = tables
            .cart
            .iter()
            .filter(|(u, _)| *u == user_id)
            .map(|(_, r)| *r)
            .collect();

        let rows = tables
            .recipe_ingredients
            .iter()
            .filter(|row| in_cart.contains(&row.recipe_id))
            .filter_map(|row| {
                tables
                    .ingredients
                    .iter()
                    .find(|i| i.id == row.ingredient_id)
                    .map(|i| {
                        (
                            i.name.clone(),
                            i.measurement_unit.clone(),
                            i64::from(row.amount),
                        )
                    })
            });

        Ok(consolidate(rows))
    }

    fn subscription_exists(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<bool> {
        let tables = self.lock()?;
        Ok(tables.subscriptions.contains(&(subscriber_id, author_id)))
    }

    fn insert_subscription(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()> {
        let mut tables = self.lock()?;
        if subscriber_id == author_id {
            return Err(StoreError::CheckViolation(
                "subscriptions_no_self_subscription".to_string(),
            ));
        }
        if !tables.user_exists(subscriber_id) || !tables.user_exists(author_id) {
            return Err(StoreError::ForeignKeyViolation(
                "subscriptions_author_id_fkey".to_string(),
            ));
        }
        if tables.subscriptions.contains(&(subscriber_id, author_id)) {
            return Err(StoreError::UniqueViolation(
                "subscriptions_subscriber_id_author_id_key".to_string(),
            ));
        }
        tables.subscriptions.push((subscriber_id, author_id));
        Ok(())
    }

    fn delete_subscription(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        let before = tables.subscriptions.len();
        tables
            .subscriptions
            .retain(|pair| *pair != (subscriber_id, author_id));
        Ok(tables.subscriptions.len() != before)
    }

    fn subscribed_authors(
        &self,
        subscriber_id: Uuid,
        author_ids: &[Uuid],
    ) -> StoreResult<HashSet<Uuid>> {
        let tables = self.lock()?;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|(s, a)| *s == subscriber_id && author_ids.contains(a))
            .map(|(_, a)| *a)
            .collect())
    }

    fn subscriptions(&self, subscriber_id: Uuid) -> StoreResult<Vec<User>> {
        let tables = self.lock()?;
        let mut authors: Vec<User> = tables
            .subscriptions
            .iter()
            .filter(|(s, _)| *s == subscriber_id)
            .filter_map(|(_, a)| tables.users.iter().find(|u| u.id == *a).cloned())
            .collect();
        authors.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(authors)
    }
}
