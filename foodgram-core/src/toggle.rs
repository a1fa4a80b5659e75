//! Favorite, shopping-cart and subscription toggles.
//!
//! An `add` pre-checks for an existing row to give a clean error, but the
//! store's unique constraint decides when two requests race: the loser gets
//! [`Error::Conflict`] too.

use uuid::Uuid;

use crate::error::{conflict_on_unique, Error, StoreError};
use crate::models::{Relation, User};
use crate::store::Store;
use crate::views::{RecipeMini, SubscriptionView, UserView};

impl Relation {
    fn already_present(self) -> &'static str {
        match self {
            Relation::Favorite => "Recipe is already in favorites",
            Relation::ShoppingCart => "Recipe is already in the shopping cart",
        }
    }

    fn absent(self) -> &'static str {
        match self {
            Relation::Favorite => "Recipe is not in favorites",
            Relation::ShoppingCart => "Recipe is not in the shopping cart",
        }
    }
}

/// Put `recipe_id` into the user's favorites or cart.
pub fn add_relation<S: Store + ?Sized>(
    store: &S,
    relation: Relation,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<RecipeMini, Error> {
    let recipe = store
        .recipe(recipe_id)?
        .ok_or_else(|| Error::not_found("Recipe not found"))?;

    if store.relation_exists(relation, user_id, recipe.id)? {
        return Err(Error::Conflict(relation.already_present().to_string()));
    }
    store
        .insert_relation(relation, user_id, recipe.id)
        .map_err(|err| match err {
            StoreError::ForeignKeyViolation(_) => Error::not_found("Recipe not found"),
            other => conflict_on_unique(relation.already_present())(other),
        })?;

    tracing::debug!(?relation, user_id = %user_id, recipe_id = %recipe.id, "relation added");
    Ok(RecipeMini::from(recipe))
}

pub fn remove_relation<S: Store + ?Sized>(
    store: &S,
    relation: Relation,
    user_id: Uuid,
    recipe_id: Uuid,
) -> Result<(), Error> {
    let recipe = store
        .recipe(recipe_id)?
        .ok_or_else(|| Error::not_found("Recipe not found"))?;
    if !store.delete_relation(relation, user_id, recipe.id)? {
        return Err(Error::not_found(relation.absent()));
    }
    tracing::debug!(?relation, user_id = %user_id, recipe_id = %recipe.id, "relation removed");
    Ok(())
}

fn toggle_relation<S: Store + ?Sized>(
    store: &S,
    relation: Relation,
    user_id: Uuid,
    recipe_id: Uuid,
    add: bool,
) -> Result<Option<RecipeMini>, Error> {
    if add {
        add_relation(store, relation, user_id, recipe_id).map(Some)
    } else {
        remove_relation(store, relation, user_id, recipe_id).map(|()| None)
    }
}

/// Add (`add = true`) or remove a recipe from the user's favorites. `Some`
/// exactly when adding.
pub fn toggle_favorite<S: Store + ?Sized>(
    store: &S,
    user_id: Uuid,
    recipe_id: Uuid,
    add: bool,
) -> Result<Option<RecipeMini>, Error> {
    toggle_relation(store, Relation::Favorite, user_id, recipe_id, add)
}

/// Add (`add = true`) or remove a recipe from the user's shopping cart.
pub fn toggle_cart_entry<S: Store + ?Sized>(
    store: &S,
    user_id: Uuid,
    recipe_id: Uuid,
    add: bool,
) -> Result<Option<RecipeMini>, Error> {
    toggle_relation(store, Relation::ShoppingCart, user_id, recipe_id, add)
}

const ALREADY_SUBSCRIBED: &str = "You are already subscribed to this user";

/// Follow `author_id`, returning the new subscription with up to
/// `recipes_limit` of the author's recipes.
pub fn subscribe<S: Store + ?Sized>(
    store: &S,
    subscriber_id: Uuid,
    author_id: Uuid,
    recipes_limit: Option<usize>,
) -> Result<SubscriptionView, Error> {
    if subscriber_id == author_id {
        return Err(Error::validation("You cannot subscribe to yourself"));
    }

    let author = store
        .user(author_id)?
        .ok_or_else(|| Error::not_found("User not found"))?;

    if store.subscription_exists(subscriber_id, author.id)? {
        return Err(Error::Conflict(ALREADY_SUBSCRIBED.to_string()));
    }
    store
        .insert_subscription(subscriber_id, author.id)
        .map_err(|err| match err {
            StoreError::CheckViolation(_) => Error::validation("You cannot subscribe to yourself"),
            StoreError::ForeignKeyViolation(_) => Error::not_found("User not found"),
            other => conflict_on_unique(ALREADY_SUBSCRIBED)(other),
        })?;

    tracing::debug!(subscriber_id = %subscriber_id, author_id = %author.id, "subscribed");

    subscription_views(store, vec![author], recipes_limit)?
        .pop()
        .ok_or_else(|| Error::not_found("User not found"))
}

pub fn unsubscribe<S: Store + ?Sized>(
    store: &S,
    subscriber_id: Uuid,
    author_id: Uuid,
) -> Result<(), Error> {
    let author = store
        .user(author_id)?
        .ok_or_else(|| Error::not_found("User not found"))?;
    if !store.delete_subscription(subscriber_id, author.id)? {
        return Err(Error::not_found("You are not subscribed to this user"));
    }
    tracing::debug!(subscriber_id = %subscriber_id, author_id = %author.id, "unsubscribed");
    Ok(())
}

/// [`subscribe`] or [`unsubscribe`]; `Some` exactly when adding.
pub fn toggle_subscription<S: Store + ?Sized>(
    store: &S,
    subscriber_id: Uuid,
    author_id: Uuid,
    add: bool,
    recipes_limit: Option<usize>,
) -> Result<Option<SubscriptionView>, Error> {
    if add {
        subscribe(store, subscriber_id, author_id, recipes_limit).map(Some)
    } else {
        unsubscribe(store, subscriber_id, author_id).map(|()| None)
    }
}

/// Subscription views for authors the caller already knows are followed.
///
/// Recipe totals come from one batched call; each author's capped recipe
/// list is one call per author.
pub fn subscription_views<S: Store + ?Sized>(
    store: &S,
    authors: Vec<User>,
    recipes_limit: Option<usize>,
) -> Result<Vec<SubscriptionView>, Error> {
    if authors.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = authors.iter().map(|a| a.id).collect();
    let counts = store.recipe_counts(&ids)?;

    authors
        .into_iter()
        .map(|author| {
            let recipes = store
                .recipes_by_author(author.id, recipes_limit)?
                .into_iter()
                .map(RecipeMini::from)
                .collect();
            let recipes_count = counts.get(&author.id).copied().unwrap_or(0);
            Ok(SubscriptionView {
                author: UserView::new(author, true),
                recipes,
                recipes_count,
            })
        })
        .collect()
}

/// Everyone `subscriber_id` follows, ordered by username.
pub fn list_subscriptions<S: Store + ?Sized>(
    store: &S,
    subscriber_id: Uuid,
    recipes_limit: Option<usize>,
) -> Result<Vec<SubscriptionView>, Error> {
    let authors = store.subscriptions(subscriber_id)?;
    subscription_views(store, authors, recipes_limit)
}
