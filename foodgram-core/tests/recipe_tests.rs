mod common;

use common::Kitchen;
use foodgram_core::{
    annotate_recipe, create_recipe, delete_recipe, get_recipe, list_recipes, recipe_views,
    toggle_cart_entry, toggle_favorite, update_recipe, Error, IngredientLine, NewRecipe,
    RecipeFlags, RecipePatch, RecipeQuery, Store, StoreError, Viewer,
};
use uuid::Uuid;

#[test]
fn test_create_returns_full_view() {
    let k = Kitchen::new();
    let mut input = k.input("Pancakes", &[(&k.sugar, 50), (&k.flour, 200)]);
    input.tags = vec![k.dinner.id, k.breakfast.id];

    let view = create_recipe(&k.store, k.alice.id, input).unwrap();

    assert_eq!(view.name, "Pancakes");
    assert_eq!(view.author.id, k.alice.id);
    assert!(!view.author.is_subscribed);
    assert!(!view.is_favorited);
    assert!(!view.is_in_shopping_cart);
    let tag_names: Vec<&str> = view.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tag_names, vec!["Breakfast", "Dinner"]);
    let lines: Vec<(&str, i32)> = view
        .ingredients
        .iter()
        .map(|i| (i.name.as_str(), i.amount))
        .collect();
    assert_eq!(lines, vec![("Flour", 200), ("Sugar", 50)]);
    assert_eq!(view.ingredients[0].id, k.flour.id);
}

#[test]
fn test_duplicate_ingredient_rejected_without_writes() {
    let k = Kitchen::new();
    let before = k.store.row_counts().unwrap();

    let input = k.input("Pancakes", &[(&k.flour, 200), (&k.flour, 100)]);
    let result = create_recipe(&k.store, k.alice.id, input);

    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(k.store.row_counts().unwrap(), before);
}

#[test]
fn test_empty_ingredients_rejected() {
    let k = Kitchen::new();
    let result = create_recipe(&k.store, k.alice.id, k.input("Air", &[]));
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[test]
fn test_missing_tags_rejected() {
    let k = Kitchen::new();
    let mut input = k.input("Pancakes", &[(&k.flour, 200)]);
    input.tags.clear();
    assert!(matches!(
        create_recipe(&k.store, k.alice.id, input),
        Err(Error::Validation(_))
    ));

    let mut input = k.input("Pancakes", &[(&k.flour, 200)]);
    input.tags = vec![Uuid::new_v4()];
    assert!(matches!(
        create_recipe(&k.store, k.alice.id, input),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_unknown_ingredient_rejected() {
    let k = Kitchen::new();
    let mut input = k.input("Pancakes", &[(&k.flour, 200)]);
    input.ingredients.push(IngredientLine {
        ingredient_id: Uuid::new_v4(),
        amount: 1,
    });
    assert!(matches!(
        create_recipe(&k.store, k.alice.id, input),
        Err(Error::Validation(_))
    ));
    assert_eq!(k.store.row_counts().unwrap().recipes, 0);
}

#[test]
fn test_amount_and_cooking_time_bounds() {
    let k = Kitchen::new();
    let input = k.input("Pancakes", &[(&k.flour, 0)]);
    assert!(matches!(
        create_recipe(&k.store, k.alice.id, input),
        Err(Error::Validation(_))
    ));

    let mut input = k.input("Pancakes", &[(&k.flour, 200)]);
    input.cooking_time = 0;
    assert!(matches!(
        create_recipe(&k.store, k.alice.id, input),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_duplicate_name_per_author() {
    let k = Kitchen::new();
    k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);

    let again = create_recipe(&k.store, k.alice.id, k.input("Pancakes", &[(&k.eggs, 2)]));
    assert!(matches!(again, Err(Error::Validation(_))));

    // Another author may reuse the name.
    let bobs = create_recipe(&k.store, k.bob.id, k.input("Pancakes", &[(&k.eggs, 2)]));
    assert!(bobs.is_ok());
}

#[test]
fn test_name_and_text_are_trimmed() {
    let k = Kitchen::new();
    let mut input = k.input("  Waffles ", &[(&k.flour, 200)]);
    input.text = "\tMix and bake.\n".to_string();

    let view = create_recipe(&k.store, k.alice.id, input).unwrap();

    assert_eq!(view.name, "Waffles");
    assert_eq!(view.text, "Mix and bake.");
    let stored = k.store.recipe(view.id).unwrap().unwrap();
    assert_eq!(stored.name, "Waffles");
}

#[test]
fn test_duplicate_name_ignores_surrounding_whitespace() {
    let k = Kitchen::new();
    k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);
    let before = k.store.row_counts().unwrap();

    let again = create_recipe(&k.store, k.alice.id, k.input("Pancakes ", &[(&k.eggs, 2)]));
    assert!(matches!(again, Err(Error::Validation(_))));
    assert_eq!(k.store.row_counts().unwrap(), before);

    let bread = k.create(&k.alice, "Bread", &[(&k.flour, 300)]);
    let patch = RecipePatch {
        name: Some(" Pancakes".to_string()),
        ..RecipePatch::default()
    };
    assert!(matches!(
        update_recipe(&k.store, bread.id, k.alice.id, patch),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_failed_store_insert_leaves_nothing_behind() {
    let k = Kitchen::new();
    let before = k.store.row_counts().unwrap();

    let result = k.store.insert_recipe(
        NewRecipe {
            author_id: k.alice.id,
            name: "Half a recipe".to_string(),
            image: "/api/images/x".to_string(),
            text: "text".to_string(),
            cooking_time: 5,
        },
        &[k.breakfast.id],
        &[
            IngredientLine {
                ingredient_id: k.flour.id,
                amount: 1,
            },
            IngredientLine {
                ingredient_id: Uuid::new_v4(),
                amount: 1,
            },
        ],
    );

    assert!(matches!(result, Err(StoreError::ForeignKeyViolation(_))));
    assert_eq!(k.store.row_counts().unwrap(), before);
}

#[test]
fn test_update_without_ingredients_keeps_rows() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200), (&k.sugar, 50)]);
    let rows_before = k.store.recipe_ingredients(&[recipe.id]).unwrap();

    let patch = RecipePatch {
        name: Some("Fluffy pancakes".to_string()),
        cooking_time: Some(35),
        ..RecipePatch::default()
    };
    let updated = update_recipe(&k.store, recipe.id, k.alice.id, patch).unwrap();

    assert_eq!(updated.name, "Fluffy pancakes");
    assert_eq!(updated.cooking_time, 35);
    assert_eq!(updated.tags, recipe.tags);
    assert_eq!(k.store.recipe_ingredients(&[recipe.id]).unwrap(), rows_before);
}

#[test]
fn test_update_with_ingredients_replaces_rows() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200), (&k.sugar, 50)]);

    let patch = RecipePatch {
        ingredients: Some(vec![IngredientLine {
            ingredient_id: k.eggs.id,
            amount: 3,
        }]),
        tags: Some(vec![k.dinner.id]),
        ..RecipePatch::default()
    };
    let updated = update_recipe(&k.store, recipe.id, k.alice.id, patch).unwrap();

    assert_eq!(updated.ingredients.len(), 1);
    assert_eq!(updated.ingredients[0].id, k.eggs.id);
    assert_eq!(updated.ingredients[0].amount, 3);
    assert_eq!(updated.tags, vec![k.dinner.clone()]);
    assert_eq!(k.store.row_counts().unwrap().recipe_ingredients, 1);
    assert_eq!(k.store.row_counts().unwrap().recipe_tags, 1);
}

#[test]
fn test_update_keeping_own_name() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);
    let patch = RecipePatch {
        name: Some("Pancakes".to_string()),
        ..RecipePatch::default()
    };
    assert!(update_recipe(&k.store, recipe.id, k.alice.id, patch).is_ok());
}

#[test]
fn test_update_to_another_own_name_rejected() {
    let k = Kitchen::new();
    k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);
    let bread = k.create(&k.alice, "Bread", &[(&k.flour, 300)]);
    let patch = RecipePatch {
        name: Some("Pancakes".to_string()),
        ..RecipePatch::default()
    };
    assert!(matches!(
        update_recipe(&k.store, bread.id, k.alice.id, patch),
        Err(Error::Validation(_))
    ));
}

#[test]
fn test_update_invalid_patch_changes_nothing() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);
    let patch = RecipePatch {
        name: Some("Renamed".to_string()),
        ingredients: Some(vec![]),
        ..RecipePatch::default()
    };
    assert!(matches!(
        update_recipe(&k.store, recipe.id, k.alice.id, patch),
        Err(Error::Validation(_))
    ));
    let stored = get_recipe(&k.store, Viewer::Anonymous, recipe.id).unwrap();
    assert_eq!(stored.name, "Pancakes");
    assert_eq!(stored.ingredients.len(), 1);
}

#[test]
fn test_only_author_may_change() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);

    let patch = RecipePatch {
        name: Some("Mine now".to_string()),
        ..RecipePatch::default()
    };
    assert!(matches!(
        update_recipe(&k.store, recipe.id, k.bob.id, patch),
        Err(Error::PermissionDenied(_))
    ));
    assert!(matches!(
        delete_recipe(&k.store, recipe.id, k.bob.id),
        Err(Error::PermissionDenied(_))
    ));
    assert!(matches!(
        update_recipe(&k.store, Uuid::new_v4(), k.alice.id, RecipePatch::default()),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_delete_cascades() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200), (&k.sugar, 50)]);
    toggle_favorite(&k.store, k.bob.id, recipe.id, true).unwrap();
    toggle_cart_entry(&k.store, k.bob.id, recipe.id, true).unwrap();

    delete_recipe(&k.store, recipe.id, k.alice.id).unwrap();

    let counts = k.store.row_counts().unwrap();
    assert_eq!(counts.recipes, 0);
    assert_eq!(counts.recipe_tags, 0);
    assert_eq!(counts.recipe_ingredients, 0);
    assert_eq!(counts.favorites, 0);
    assert_eq!(counts.cart_entries, 0);
    assert!(matches!(
        get_recipe(&k.store, Viewer::Anonymous, recipe.id),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_anonymous_flags_skip_the_store() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);

    let before = k.store.query_count();
    let flags = annotate_recipe(&k.store, Viewer::Anonymous, recipe.id).unwrap();

    assert_eq!(flags, RecipeFlags::default());
    assert_eq!(k.store.query_count(), before);
}

#[test]
fn test_flags_follow_viewer() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);
    toggle_favorite(&k.store, k.bob.id, recipe.id, true).unwrap();

    let for_bob = get_recipe(&k.store, Viewer::User(k.bob.id), recipe.id).unwrap();
    assert!(for_bob.is_favorited);
    assert!(!for_bob.is_in_shopping_cart);

    let for_alice = get_recipe(&k.store, Viewer::User(k.alice.id), recipe.id).unwrap();
    assert!(!for_alice.is_favorited);

    let anonymous = get_recipe(&k.store, Viewer::Anonymous, recipe.id).unwrap();
    assert!(!anonymous.is_favorited);
}

fn listing_queries(k: &Kitchen, viewer: Viewer) -> (usize, usize) {
    let before = k.store.query_count();
    let recipes = list_recipes(&k.store, viewer, &RecipeQuery::default()).unwrap();
    let views = recipe_views(&k.store, viewer, recipes).unwrap();
    (views.len(), k.store.query_count() - before)
}

#[test]
fn test_listing_cost_does_not_grow_with_results() {
    let k = Kitchen::new();
    let viewer = Viewer::User(k.bob.id);
    k.create(&k.alice, "Recipe 0", &[(&k.flour, 100)]);

    let (one, single_cost) = listing_queries(&k, viewer);
    assert_eq!(one, 1);

    for i in 1..10 {
        let author = if i % 2 == 0 { &k.alice } else { &k.bob };
        k.create(author, &format!("Recipe {i}"), &[(&k.flour, 100), (&k.eggs, 1)]);
    }
    let (ten, many_cost) = listing_queries(&k, viewer);
    assert_eq!(ten, 10);
    assert_eq!(many_cost, single_cost);
}

#[test]
fn test_list_newest_first() {
    let k = Kitchen::new();
    k.create(&k.alice, "First", &[(&k.flour, 100)]);
    k.create(&k.alice, "Second", &[(&k.flour, 100)]);

    let names: Vec<String> = list_recipes(&k.store, Viewer::Anonymous, &RecipeQuery::default())
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["Second", "First"]);
}

#[test]
fn test_list_filters() {
    let k = Kitchen::new();
    let pancakes = k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);
    let mut stew = k.input("Stew", &[(&k.eggs, 2)]);
    stew.tags = vec![k.dinner.id];
    let stew = create_recipe(&k.store, k.bob.id, stew).unwrap();
    toggle_favorite(&k.store, k.alice.id, stew.id, true).unwrap();
    toggle_cart_entry(&k.store, k.alice.id, pancakes.id, true).unwrap();

    let ids = |viewer: Viewer, query: RecipeQuery| -> Vec<Uuid> {
        list_recipes(&k.store, viewer, &query)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect()
    };

    let by_author = RecipeQuery {
        author: Some(k.bob.id),
        ..RecipeQuery::default()
    };
    assert_eq!(ids(Viewer::Anonymous, by_author), vec![stew.id]);

    let by_tag = RecipeQuery {
        tags: vec!["breakfast".to_string()],
        ..RecipeQuery::default()
    };
    assert_eq!(ids(Viewer::Anonymous, by_tag), vec![pancakes.id]);

    let any_tag = RecipeQuery {
        tags: vec!["breakfast".to_string(), "dinner".to_string()],
        ..RecipeQuery::default()
    };
    assert_eq!(ids(Viewer::Anonymous, any_tag).len(), 2);

    let favorites = RecipeQuery {
        is_favorited: true,
        ..RecipeQuery::default()
    };
    assert_eq!(ids(Viewer::User(k.alice.id), favorites.clone()), vec![stew.id]);
    assert_eq!(ids(Viewer::Anonymous, favorites).len(), 2);

    let cart = RecipeQuery {
        is_in_shopping_cart: true,
        ..RecipeQuery::default()
    };
    assert_eq!(ids(Viewer::User(k.alice.id), cart.clone()), vec![pancakes.id]);
    assert!(ids(Viewer::User(k.bob.id), cart).is_empty());
}
