//! Recipe reads and writes.
//!
//! Writes validate everything up front and then hand the store a single
//! atomic call, so a recipe never exists without its tags and ingredients.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::aggregate::{annotate_recipes, annotate_users};
use crate::error::{Error, StoreError};
use crate::models::{
    IngredientLine, NewRecipe, Recipe, RecipeChanges, RecipeFilter, RecipeIngredient, Tag, User,
    Viewer,
};
use crate::store::Store;
use crate::validation::{
    validate_cooking_time, validate_image_ref, validate_ingredient_lines, validate_recipe_name,
    validate_tag_ids, validate_text,
};
use crate::views::{RecipeInput, RecipePatch, RecipeView, UserView};

const DUPLICATE_NAME: &str = "You have already published a recipe with this name";

/// Viewer-relative recipe list filter, as sent by clients.
#[derive(Debug, Clone, Default)]
pub struct RecipeQuery {
    pub author: Option<Uuid>,
    /// Tag slugs; any match is enough.
    pub tags: Vec<String>,
    /// Only the viewer's favorites. Ignored for anonymous viewers.
    pub is_favorited: bool,
    /// Only recipes in the viewer's cart. Ignored for anonymous viewers.
    pub is_in_shopping_cart: bool,
}

impl RecipeQuery {
    fn resolve(&self, viewer: Viewer) -> RecipeFilter {
        let user = viewer.user_id();
        RecipeFilter {
            author: self.author,
            tags: self.tags.clone(),
            favorited_by: user.filter(|_| self.is_favorited),
            in_cart_of: user.filter(|_| self.is_in_shopping_cart),
        }
    }
}

fn write_error(err: StoreError) -> Error {
    match err {
        StoreError::UniqueViolation(constraint) if constraint.contains("name") => {
            Error::validation(DUPLICATE_NAME)
        }
        StoreError::UniqueViolation(_) => Error::validation("Tags and ingredients must be unique"),
        StoreError::ForeignKeyViolation(_) => {
            Error::validation("A referenced tag or ingredient does not exist")
        }
        StoreError::CheckViolation(_) => Error::validation("A value is out of range"),
        StoreError::NotFound => Error::not_found("Recipe not found"),
        other => Error::Store(other),
    }
}

fn ensure_tags_exist<S: Store + ?Sized>(store: &S, tag_ids: &[Uuid]) -> Result<(), Error> {
    let found: HashSet<Uuid> = store.tags_by_ids(tag_ids)?.into_iter().map(|t| t.id).collect();
    match tag_ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(Error::validation(format!("Tag {missing} does not exist"))),
        None => Ok(()),
    }
}

fn ensure_ingredients_exist<S: Store + ?Sized>(
    store: &S,
    lines: &[IngredientLine],
) -> Result<(), Error> {
    let ids: Vec<Uuid> = lines.iter().map(|l| l.ingredient_id).collect();
    let found: HashSet<Uuid> = store
        .ingredients_by_ids(&ids)?
        .into_iter()
        .map(|i| i.id)
        .collect();
    match ids.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(Error::validation(format!(
            "Ingredient {missing} does not exist"
        ))),
        None => Ok(()),
    }
}

fn load_owned<S: Store + ?Sized>(store: &S, recipe_id: Uuid, editor: Uuid) -> Result<Recipe, Error> {
    let recipe = store
        .recipe(recipe_id)?
        .ok_or_else(|| Error::not_found("Recipe not found"))?;
    if recipe.author_id != editor {
        return Err(Error::PermissionDenied(
            "Only the author can change this recipe".to_string(),
        ));
    }
    Ok(recipe)
}

fn single_view<S: Store + ?Sized>(
    store: &S,
    viewer: Viewer,
    recipe: Recipe,
) -> Result<RecipeView, Error> {
    recipe_views(store, viewer, vec![recipe])?
        .pop()
        .ok_or_else(|| Error::not_found("Recipe not found"))
}

/// Surrounding whitespace is not part of a name or description.
fn trimmed(value: String) -> String {
    value.trim().to_string()
}

pub fn create_recipe<S: Store + ?Sized>(
    store: &S,
    author_id: Uuid,
    mut input: RecipeInput,
) -> Result<RecipeView, Error> {
    input.name = trimmed(input.name);
    input.text = trimmed(input.text);

    validate_recipe_name(&input.name)?;
    validate_text(&input.text)?;
    validate_image_ref(&input.image)?;
    validate_cooking_time(input.cooking_time)?;
    validate_tag_ids(&input.tags)?;
    validate_ingredient_lines(&input.ingredients)?;
    ensure_tags_exist(store, &input.tags)?;
    ensure_ingredients_exist(store, &input.ingredients)?;

    if store.recipe_name_taken(author_id, &input.name, None)? {
        return Err(Error::validation(DUPLICATE_NAME));
    }

    let new_recipe = NewRecipe {
        author_id,
        name: input.name,
        image: input.image,
        text: input.text,
        cooking_time: input.cooking_time,
    };
    let recipe = store
        .insert_recipe(new_recipe, &input.tags, &input.ingredients)
        .map_err(write_error)?;

    tracing::info!(recipe_id = %recipe.id, author_id = %author_id, "recipe created");

    single_view(store, Viewer::User(author_id), recipe)
}

pub fn update_recipe<S: Store + ?Sized>(
    store: &S,
    recipe_id: Uuid,
    editor: Uuid,
    mut patch: RecipePatch,
) -> Result<RecipeView, Error> {
    let recipe = load_owned(store, recipe_id, editor)?;
    patch.name = patch.name.map(trimmed);
    patch.text = patch.text.map(trimmed);

    if let Some(name) = patch.name.as_deref() {
        validate_recipe_name(name)?;
    }
    if let Some(text) = patch.text.as_deref() {
        validate_text(text)?;
    }
    if let Some(image) = patch.image.as_deref() {
        validate_image_ref(image)?;
    }
    if let Some(minutes) = patch.cooking_time {
        validate_cooking_time(minutes)?;
    }
    if let Some(tags) = patch.tags.as_deref() {
        validate_tag_ids(tags)?;
        ensure_tags_exist(store, tags)?;
    }
    if let Some(lines) = patch.ingredients.as_deref() {
        validate_ingredient_lines(lines)?;
        ensure_ingredients_exist(store, lines)?;
    }
    if let Some(name) = patch.name.as_deref() {
        if store.recipe_name_taken(recipe.author_id, name, Some(recipe.id))? {
            return Err(Error::validation(DUPLICATE_NAME));
        }
    }

    let changes = RecipeChanges {
        name: patch.name,
        image: patch.image,
        text: patch.text,
        cooking_time: patch.cooking_time,
    };
    let updated = store
        .update_recipe(
            recipe.id,
            changes,
            patch.tags.as_deref(),
            patch.ingredients.as_deref(),
        )
        .map_err(write_error)?;

    tracing::info!(recipe_id = %updated.id, "recipe updated");

    single_view(store, Viewer::User(editor), updated)
}

pub fn delete_recipe<S: Store + ?Sized>(
    store: &S,
    recipe_id: Uuid,
    editor: Uuid,
) -> Result<(), Error> {
    let recipe = load_owned(store, recipe_id, editor)?;
    if !store.delete_recipe(recipe.id)? {
        return Err(Error::not_found("Recipe not found"));
    }
    tracing::info!(recipe_id = %recipe.id, "recipe deleted");
    Ok(())
}

pub fn get_recipe<S: Store + ?Sized>(
    store: &S,
    viewer: Viewer,
    recipe_id: Uuid,
) -> Result<RecipeView, Error> {
    let recipe = store
        .recipe(recipe_id)?
        .ok_or_else(|| Error::not_found("Recipe not found"))?;
    single_view(store, viewer, recipe)
}

/// Matching recipes, newest first. Build views for the page you serve with
/// [`recipe_views`].
pub fn list_recipes<S: Store + ?Sized>(
    store: &S,
    viewer: Viewer,
    query: &RecipeQuery,
) -> Result<Vec<Recipe>, Error> {
    Ok(store.recipes(&query.resolve(viewer))?)
}

fn group_by_recipe<T>(rows: impl IntoIterator<Item = (Uuid, T)>) -> HashMap<Uuid, Vec<T>> {
    let mut grouped: HashMap<Uuid, Vec<T>> = HashMap::new();
    for (recipe_id, item) in rows {
        grouped.entry(recipe_id).or_default().push(item);
    }
    grouped
}

/// Full read views for `recipes`, preserving their order.
///
/// The number of store calls does not depend on how many recipes are passed.
pub fn recipe_views<S: Store + ?Sized>(
    store: &S,
    viewer: Viewer,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeView>, Error> {
    if recipes.is_empty() {
        return Ok(Vec::new());
    }

    let recipe_ids: Vec<Uuid> = recipes.iter().map(|r| r.id).collect();
    let mut author_ids: Vec<Uuid> = recipes.iter().map(|r| r.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors: HashMap<Uuid, User> = store
        .users_by_ids(&author_ids)?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let subscribed = annotate_users(store, viewer, &author_ids)?;

    let mut tags: HashMap<Uuid, Vec<Tag>> = group_by_recipe(store.recipe_tags(&recipe_ids)?);
    let mut ingredients: HashMap<Uuid, Vec<RecipeIngredient>> = group_by_recipe(
        store
            .recipe_ingredients(&recipe_ids)?
            .into_iter()
            .map(|row| (row.recipe_id, row)),
    );
    let flags = annotate_recipes(store, viewer, &recipe_ids)?;

    recipes
        .into_iter()
        .map(|recipe| {
            let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                Error::Store(StoreError::Backend(format!(
                    "author {} of recipe {} is missing",
                    recipe.author_id, recipe.id
                )))
            })?;
            let author = UserView::new(author, subscribed.contains(&recipe.author_id));

            let mut recipe_tags = tags.remove(&recipe.id).unwrap_or_default();
            recipe_tags.sort_by(|a, b| a.name.cmp(&b.name));

            let mut lines = ingredients.remove(&recipe.id).unwrap_or_default();
            lines.sort_by(|a, b| {
                a.ingredient
                    .name
                    .cmp(&b.ingredient.name)
                    .then_with(|| a.ingredient.measurement_unit.cmp(&b.ingredient.measurement_unit))
            });

            let recipe_flags = flags.get(&recipe.id).copied().unwrap_or_default();
            Ok(RecipeView::new(recipe, author, recipe_tags, lines, recipe_flags))
        })
        .collect()
}
