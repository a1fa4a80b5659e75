//! PostgreSQL implementation of the core [`Store`].
//!
//! Every call checks a connection out of the pool, runs inside a `db.query`
//! span (counted per request by [`crate::telemetry::DbQueryCountingLayer`]) and
//! maps Diesel failures onto [`StoreError`] so constraint violations reach the
//! core as typed errors.

use std::collections::{HashMap, HashSet};

use diesel::dsl::{count_star, exists};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Array, Uuid as SqlUuid};
use foodgram_core::{
    Ingredient, IngredientLine, NewIngredient, NewRecipe, NewTag, Recipe, RecipeChanges,
    RecipeFilter, RecipeFlags, RecipeIngredient, Relation, ShoppingListLine, Store, StoreError,
    StoreResult, Tag, User,
};
use uuid::Uuid;

use crate::db::DbPool;
use crate::models::{
    IngredientRow, NewCartEntry, NewFavorite, NewIngredientRow, NewRecipeIngredient,
    NewRecipeRow, NewRecipeTag, NewSubscription, NewTagRow, RecipeChangeset,
    RecipeIngredientRow, RecipeRow, TagRow, UserRow,
};
use crate::raw_sql::{
    like_prefix, RecipeFlagsRow, ShoppingListRow, RECIPE_FLAGS_QUERY, SHOPPING_LIST_QUERY,
};
use crate::schema::{
    favorites, ingredients, recipe_ingredients, recipe_tags, recipes, shopping_cart_entries,
    subscriptions, tags, users,
};

/// Rows per statement when bulk loading reference data.
const INSERT_CHUNK: usize = 1000;

pub fn store_error(err: DieselError) -> StoreError {
    match err {
        DieselError::NotFound => StoreError::NotFound,
        DieselError::DatabaseError(kind, info) => {
            let constraint = info.constraint_name().unwrap_or_default().to_string();
            match kind {
                DatabaseErrorKind::UniqueViolation => StoreError::UniqueViolation(constraint),
                DatabaseErrorKind::ForeignKeyViolation => {
                    StoreError::ForeignKeyViolation(constraint)
                }
                DatabaseErrorKind::CheckViolation => StoreError::CheckViolation(constraint),
                _ => StoreError::Backend(info.message().to_string()),
            }
        }
        other => StoreError::Backend(other.to_string()),
    }
}

pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Run one unit of work on a pooled connection.
    pub fn run<T>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut PgConnection) -> QueryResult<T>,
    ) -> StoreResult<T> {
        let _span = tracing::info_span!("db.query", op).entered();
        let mut conn = self.pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get database connection");
            StoreError::Backend(format!("connection pool: {e}"))
        })?;
        f(&mut conn).map_err(store_error)
    }

    pub fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let rows = self.run("list_tags", |conn| {
            tags::table
                .order(tags::name.asc())
                .select(TagRow::as_select())
                .load(conn)
        })?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    pub fn tag(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        let row = self.run("tag", |conn| {
            tags::table
                .find(id)
                .select(TagRow::as_select())
                .first(conn)
                .optional()
        })?;
        Ok(row.map(Tag::from))
    }

    /// Ingredients ordered by name, optionally restricted to a
    /// case-insensitive name prefix.
    pub fn search_ingredients(&self, prefix: Option<&str>) -> StoreResult<Vec<Ingredient>> {
        let pattern = prefix.map(like_prefix);
        let rows = self.run("search_ingredients", |conn| {
            let mut query = ingredients::table
                .select(IngredientRow::as_select())
                .into_boxed();
            if let Some(pattern) = pattern {
                query = query.filter(ingredients::name.ilike(pattern));
            }
            query
                .order((ingredients::name.asc(), ingredients::measurement_unit.asc()))
                .load(conn)
        })?;
        Ok(rows.into_iter().map(Ingredient::from).collect())
    }

    pub fn ingredient(&self, id: Uuid) -> StoreResult<Option<Ingredient>> {
        let row = self.run("ingredient", |conn| {
            ingredients::table
                .find(id)
                .select(IngredientRow::as_select())
                .first(conn)
                .optional()
        })?;
        Ok(row.map(Ingredient::from))
    }

    pub fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = self.run("list_users", |conn| {
            users::table
                .order(users::username.asc())
                .select(UserRow::as_select())
                .load(conn)
        })?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Insert ingredients, skipping any (name, unit) pair already present.
    /// Returns how many rows were actually inserted.
    pub fn insert_ingredients(&self, rows: &[NewIngredient]) -> StoreResult<usize> {
        self.run("insert_ingredients", |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                let mut inserted = 0;
                for chunk in rows.chunks(INSERT_CHUNK) {
                    let values: Vec<NewIngredientRow> = chunk
                        .iter()
                        .map(|i| NewIngredientRow {
                            name: &i.name,
                            measurement_unit: &i.measurement_unit,
                        })
                        .collect();
                    inserted += diesel::insert_into(ingredients::table)
                        .values(&values)
                        .on_conflict_do_nothing()
                        .execute(conn)?;
                }
                Ok(inserted)
            })
        })
    }

    /// Insert tags, skipping any whose name or slug is taken.
    pub fn insert_tags(&self, rows: &[NewTag]) -> StoreResult<usize> {
        self.run("insert_tags", |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                let mut inserted = 0;
                for chunk in rows.chunks(INSERT_CHUNK) {
                    let values: Vec<NewTagRow> = chunk
                        .iter()
                        .map(|t| NewTagRow {
                            name: &t.name,
                            slug: &t.slug,
                        })
                        .collect();
                    inserted += diesel::insert_into(tags::table)
                        .values(&values)
                        .on_conflict_do_nothing()
                        .execute(conn)?;
                }
                Ok(inserted)
            })
        })
    }
}

/// Replace the tag links and ingredient rows that are given; `None` leaves
/// that side alone.
fn replace_links(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    tag_ids: Option<&[Uuid]>,
    lines: Option<&[IngredientLine]>,
) -> QueryResult<()> {
    if let Some(tag_ids) = tag_ids {
        diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
            .execute(conn)?;
        let rows: Vec<NewRecipeTag> = tag_ids
            .iter()
            .map(|tag_id| NewRecipeTag {
                recipe_id,
                tag_id: *tag_id,
            })
            .collect();
        diesel::insert_into(recipe_tags::table)
            .values(&rows)
            .execute(conn)?;
    }

    if let Some(lines) = lines {
        diesel::delete(
            recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)),
        )
        .execute(conn)?;
        let rows: Vec<NewRecipeIngredient> = lines
            .iter()
            .map(|line| NewRecipeIngredient {
                recipe_id,
                ingredient_id: line.ingredient_id,
                amount: line.amount,
            })
            .collect();
        diesel::insert_into(recipe_ingredients::table)
            .values(&rows)
            .execute(conn)?;
    }

    Ok(())
}

impl Store for PgStore {
    fn user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = self.run("user", |conn| {
            users::table
                .find(id)
                .select(UserRow::as_select())
                .first(conn)
                .optional()
        })?;
        Ok(row.map(User::from))
    }

    fn users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let rows = self.run("users_by_ids", |conn| {
            users::table
                .filter(users::id.eq_any(ids))
                .select(UserRow::as_select())
                .load(conn)
        })?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    fn tags_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tag>> {
        let rows = self.run("tags_by_ids", |conn| {
            tags::table
                .filter(tags::id.eq_any(ids))
                .select(TagRow::as_select())
                .load(conn)
        })?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }

    fn ingredients_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Ingredient>> {
        let rows = self.run("ingredients_by_ids", |conn| {
            ingredients::table
                .filter(ingredients::id.eq_any(ids))
                .select(IngredientRow::as_select())
                .load(conn)
        })?;
        Ok(rows.into_iter().map(Ingredient::from).collect())
    }

    fn recipe(&self, id: Uuid) -> StoreResult<Option<Recipe>> {
        let row = self.run("recipe", |conn| {
            recipes::table
                .find(id)
                .select(RecipeRow::as_select())
                .first(conn)
                .optional()
        })?;
        Ok(row.map(Recipe::from))
    }

    fn recipes(&self, filter: &RecipeFilter) -> StoreResult<Vec<Recipe>> {
        let rows = self.run("recipes", |conn| {
            let mut query = recipes::table
                .select(RecipeRow::as_select())
                .into_boxed();

            if let Some(author) = filter.author {
                query = query.filter(recipes::author_id.eq(author));
            }
            if !filter.tags.is_empty() {
                query = query.filter(
                    recipes::id.eq_any(
                        recipe_tags::table
                            .inner_join(tags::table)
                            .filter(tags::slug.eq_any(&filter.tags))
                            .select(recipe_tags::recipe_id),
                    ),
                );
            }
            if let Some(user_id) = filter.favorited_by {
                query = query.filter(
                    recipes::id.eq_any(
                        favorites::table
                            .filter(favorites::user_id.eq(user_id))
                            .select(favorites::recipe_id),
                    ),
                );
            }
            if let Some(user_id) = filter.in_cart_of {
                query = query.filter(
                    recipes::id.eq_any(
                        shopping_cart_entries::table
                            .filter(shopping_cart_entries::user_id.eq(user_id))
                            .select(shopping_cart_entries::recipe_id),
                    ),
                );
            }

            query
                .order((recipes::created_at.desc(), recipes::id.desc()))
                .load(conn)
        })?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    fn recipes_by_author(&self, author_id: Uuid, limit: Option<usize>) -> StoreResult<Vec<Recipe>> {
        let rows = self.run("recipes_by_author", |conn| {
            let mut query = recipes::table
                .filter(recipes::author_id.eq(author_id))
                .order((recipes::created_at.desc(), recipes::id.desc()))
                .select(RecipeRow::as_select())
                .into_boxed();
            if let Some(limit) = limit {
                query = query.limit(i64::try_from(limit).unwrap_or(i64::MAX));
            }
            query.load(conn)
        })?;
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    fn recipe_counts(&self, author_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>> {
        let rows: Vec<(Uuid, i64)> = self.run("recipe_counts", |conn| {
            recipes::table
                .filter(recipes::author_id.eq_any(author_ids))
                .group_by(recipes::author_id)
                .select((recipes::author_id, count_star()))
                .load(conn)
        })?;
        Ok(rows.into_iter().collect())
    }

    fn recipe_name_taken(
        &self,
        author_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<bool> {
        let found = self.run("recipe_name_taken", |conn| {
            let mut query = recipes::table
                .filter(recipes::author_id.eq(author_id))
                .filter(recipes::name.eq(name))
                .select(recipes::id)
                .into_boxed();
            if let Some(id) = exclude {
                query = query.filter(recipes::id.ne(id));
            }
            query.first::<Uuid>(conn).optional()
        })?;
        Ok(found.is_some())
    }

    fn recipe_tags(&self, recipe_ids: &[Uuid]) -> StoreResult<Vec<(Uuid, Tag)>> {
        let rows: Vec<(Uuid, TagRow)> = self.run("recipe_tags", |conn| {
            recipe_tags::table
                .inner_join(tags::table)
                .filter(recipe_tags::recipe_id.eq_any(recipe_ids))
                .select((recipe_tags::recipe_id, TagRow::as_select()))
                .load(conn)
        })?;
        Ok(rows
            .into_iter()
            .map(|(recipe_id, tag)| (recipe_id, tag.into()))
            .collect())
    }

    fn recipe_ingredients(&self, recipe_ids: &[Uuid]) -> StoreResult<Vec<RecipeIngredient>> {
        let rows: Vec<(RecipeIngredientRow, IngredientRow)> =
            self.run("recipe_ingredients", |conn| {
                recipe_ingredients::table
                    .inner_join(ingredients::table)
                    .filter(recipe_ingredients::recipe_id.eq_any(recipe_ids))
                    .select((
                        RecipeIngredientRow::as_select(),
                        IngredientRow::as_select(),
                    ))
                    .load(conn)
            })?;
        Ok(rows
            .into_iter()
            .map(|(row, ingredient)| row.with_ingredient(ingredient))
            .collect())
    }

    fn insert_recipe(
        &self,
        recipe: NewRecipe,
        tag_ids: &[Uuid],
        lines: &[IngredientLine],
    ) -> StoreResult<Recipe> {
        let row = self.run("insert_recipe", |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                let row: RecipeRow = diesel::insert_into(recipes::table)
                    .values(&NewRecipeRow {
                        author_id: recipe.author_id,
                        name: &recipe.name,
                        image: &recipe.image,
                        text: &recipe.text,
                        cooking_time: recipe.cooking_time,
                    })
                    .returning(RecipeRow::as_returning())
                    .get_result(conn)?;
                replace_links(conn, row.id, Some(tag_ids), Some(lines))?;
                Ok(row)
            })
        })?;
        Ok(row.into())
    }

    fn update_recipe(
        &self,
        id: Uuid,
        changes: RecipeChanges,
        tag_ids: Option<&[Uuid]>,
        lines: Option<&[IngredientLine]>,
    ) -> StoreResult<Recipe> {
        let changeset = RecipeChangeset::from(changes);
        let row = self.run("update_recipe", |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                let row: RecipeRow = if changeset.is_empty() {
                    recipes::table
                        .find(id)
                        .select(RecipeRow::as_select())
                        .for_update()
                        .first(conn)?
                } else {
                    diesel::update(recipes::table.find(id))
                        .set(&changeset)
                        .returning(RecipeRow::as_returning())
                        .get_result(conn)?
                };
                replace_links(conn, row.id, tag_ids, lines)?;
                Ok(row)
            })
        })?;
        Ok(row.into())
    }

    fn delete_recipe(&self, id: Uuid) -> StoreResult<bool> {
        let deleted = self.run("delete_recipe", |conn| {
            diesel::delete(recipes::table.find(id)).execute(conn)
        })?;
        Ok(deleted > 0)
    }

    fn relation_exists(
        &self,
        relation: Relation,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> StoreResult<bool> {
        self.run("relation_exists", |conn| match relation {
            Relation::Favorite => diesel::select(exists(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::recipe_id.eq(recipe_id)),
            ))
            .get_result(conn),
            Relation::ShoppingCart => diesel::select(exists(
                shopping_cart_entries::table
                    .filter(shopping_cart_entries::user_id.eq(user_id))
                    .filter(shopping_cart_entries::recipe_id.eq(recipe_id)),
            ))
            .get_result(conn),
        })
    }

    fn insert_relation(
        &self,
        relation: Relation,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> StoreResult<()> {
        self.run("insert_relation", |conn| match relation {
            Relation::Favorite => diesel::insert_into(favorites::table)
                .values(&NewFavorite { user_id, recipe_id })
                .execute(conn),
            Relation::ShoppingCart => diesel::insert_into(shopping_cart_entries::table)
                .values(&NewCartEntry { user_id, recipe_id })
                .execute(conn),
        })?;
        Ok(())
    }

    fn delete_relation(
        &self,
        relation: Relation,
        user_id: Uuid,
        recipe_id: Uuid,
    ) -> StoreResult<bool> {
        let deleted = self.run("delete_relation", |conn| match relation {
            Relation::Favorite => diesel::delete(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::recipe_id.eq(recipe_id)),
            )
            .execute(conn),
            Relation::ShoppingCart => diesel::delete(
                shopping_cart_entries::table
                    .filter(shopping_cart_entries::user_id.eq(user_id))
                    .filter(shopping_cart_entries::recipe_id.eq(recipe_id)),
            )
            .execute(conn),
        })?;
        Ok(deleted > 0)
    }

    fn recipe_flags(
        &self,
        user_id: Uuid,
        recipe_ids: &[Uuid],
    ) -> StoreResult<HashMap<Uuid, RecipeFlags>> {
        let ids = recipe_ids.to_vec();
        let rows: Vec<RecipeFlagsRow> = self.run("recipe_flags", |conn| {
            diesel::sql_query(RECIPE_FLAGS_QUERY)
                .bind::<SqlUuid, _>(user_id)
                .bind::<Array<SqlUuid>, _>(ids)
                .load(conn)
        })?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let flags = RecipeFlags {
                    is_favorited: row.is_favorited,
                    is_in_shopping_cart: row.is_in_shopping_cart,
                };
                (row.recipe_id, flags)
            })
            .collect())
    }

    fn shopping_list(&self, user_id: Uuid) -> StoreResult<Vec<ShoppingListLine>> {
        let rows: Vec<ShoppingListRow> = self.run("shopping_list", |conn| {
            diesel::sql_query(SHOPPING_LIST_QUERY)
                .bind::<SqlUuid, _>(user_id)
                .load(conn)
        })?;
        Ok(rows
            .into_iter()
            .map(|row| ShoppingListLine {
                name: row.name,
                measurement_unit: row.measurement_unit,
                total_amount: row.total_amount,
            })
            .collect())
    }

    fn subscription_exists(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<bool> {
        self.run("subscription_exists", |conn| {
            diesel::select(exists(
                subscriptions::table
                    .filter(subscriptions::subscriber_id.eq(subscriber_id))
                    .filter(subscriptions::author_id.eq(author_id)),
            ))
            .get_result(conn)
        })
    }

    fn insert_subscription(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<()> {
        self.run("insert_subscription", |conn| {
            diesel::insert_into(subscriptions::table)
                .values(&NewSubscription {
                    subscriber_id,
                    author_id,
                })
                .execute(conn)
        })?;
        Ok(())
    }

    fn delete_subscription(&self, subscriber_id: Uuid, author_id: Uuid) -> StoreResult<bool> {
        let deleted = self.run("delete_subscription", |conn| {
            diesel::delete(
                subscriptions::table
                    .filter(subscriptions::subscriber_id.eq(subscriber_id))
                    .filter(subscriptions::author_id.eq(author_id)),
            )
            .execute(conn)
        })?;
        Ok(deleted > 0)
    }

    fn subscribed_authors(
        &self,
        subscriber_id: Uuid,
        author_ids: &[Uuid],
    ) -> StoreResult<HashSet<Uuid>> {
        let rows: Vec<Uuid> = self.run("subscribed_authors", |conn| {
            subscriptions::table
                .filter(subscriptions::subscriber_id.eq(subscriber_id))
                .filter(subscriptions::author_id.eq_any(author_ids))
                .select(subscriptions::author_id)
                .load(conn)
        })?;
        Ok(rows.into_iter().collect())
    }

    fn subscriptions(&self, subscriber_id: Uuid) -> StoreResult<Vec<User>> {
        let rows = self.run("subscriptions", |conn| {
            users::table
                .filter(
                    users::id.eq_any(
                        subscriptions::table
                            .filter(subscriptions::subscriber_id.eq(subscriber_id))
                            .select(subscriptions::author_id),
                    ),
                )
                .order(users::username.asc())
                .select(UserRow::as_select())
                .load(conn)
        })?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}
