mod common;

use std::sync::Barrier;
use std::thread;

use common::Kitchen;
use foodgram_core::{
    add_relation, annotate_user, list_subscriptions, remove_relation, subscribe,
    toggle_cart_entry, toggle_favorite, toggle_subscription, unsubscribe, Error, Relation,
    Viewer,
};
use uuid::Uuid;

#[test]
fn test_favorite_twice_conflicts() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);

    let mini = toggle_favorite(&k.store, k.bob.id, recipe.id, true)
        .unwrap()
        .unwrap();
    assert_eq!(mini.id, recipe.id);
    assert_eq!(mini.name, "Pancakes");

    let again = toggle_favorite(&k.store, k.bob.id, recipe.id, true);
    assert!(matches!(again, Err(Error::Conflict(_))));
    assert_eq!(k.store.row_counts().unwrap().favorites, 1);
}

#[test]
fn test_remove_absent_relation_is_not_found() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);

    assert!(matches!(
        toggle_favorite(&k.store, k.bob.id, recipe.id, false),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        toggle_cart_entry(&k.store, k.bob.id, recipe.id, false),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_add_then_remove() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);

    toggle_cart_entry(&k.store, k.bob.id, recipe.id, true).unwrap();
    assert_eq!(k.store.row_counts().unwrap().cart_entries, 1);

    let removed = toggle_cart_entry(&k.store, k.bob.id, recipe.id, false).unwrap();
    assert!(removed.is_none());
    assert_eq!(k.store.row_counts().unwrap().cart_entries, 0);
}

#[test]
fn test_add_and_remove_relation_directly() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);

    let mini = add_relation(&k.store, Relation::ShoppingCart, k.bob.id, recipe.id).unwrap();
    assert_eq!(mini.id, recipe.id);
    assert!(matches!(
        add_relation(&k.store, Relation::ShoppingCart, k.bob.id, recipe.id),
        Err(Error::Conflict(_))
    ));

    remove_relation(&k.store, Relation::ShoppingCart, k.bob.id, recipe.id).unwrap();
    assert_eq!(k.store.row_counts().unwrap().cart_entries, 0);
    assert!(matches!(
        remove_relation(&k.store, Relation::ShoppingCart, k.bob.id, recipe.id),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_subscribe_and_unsubscribe_directly() {
    let k = Kitchen::new();
    k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);

    let view = subscribe(&k.store, k.bob.id, k.alice.id, None).unwrap();
    assert_eq!(view.author.id, k.alice.id);
    assert_eq!(view.recipes_count, 1);
    assert!(matches!(
        subscribe(&k.store, k.bob.id, k.bob.id, None),
        Err(Error::Validation(_))
    ));

    unsubscribe(&k.store, k.bob.id, k.alice.id).unwrap();
    assert_eq!(k.store.row_counts().unwrap().subscriptions, 0);
}

#[test]
fn test_toggle_unknown_recipe() {
    let k = Kitchen::new();
    assert!(matches!(
        toggle_favorite(&k.store, k.bob.id, Uuid::new_v4(), true),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_concurrent_cart_adds() {
    let k = Kitchen::new();
    let recipe = k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);
    let barrier = Barrier::new(2);

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    toggle_cart_entry(&k.store, k.bob.id, recipe.id, true)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(Error::Conflict(_))))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(k.store.row_counts().unwrap().cart_entries, 1);
}

#[test]
fn test_self_subscription_rejected() {
    let k = Kitchen::new();
    let result = toggle_subscription(&k.store, k.alice.id, k.alice.id, true, None);
    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(k.store.row_counts().unwrap().subscriptions, 0);
}

#[test]
fn test_subscribe_returns_capped_view() {
    let k = Kitchen::new();
    for name in ["One", "Two", "Three"] {
        k.create(&k.alice, name, &[(&k.flour, 100)]);
    }

    let view = toggle_subscription(&k.store, k.bob.id, k.alice.id, true, Some(2))
        .unwrap()
        .unwrap();

    assert_eq!(view.author.id, k.alice.id);
    assert!(view.author.is_subscribed);
    assert_eq!(view.recipes_count, 3);
    let names: Vec<&str> = view.recipes.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Three", "Two"]);

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["username"], "alice");
    assert_eq!(json["is_subscribed"], true);
    assert_eq!(json["recipes_count"], 3);
    assert_eq!(json["recipes"].as_array().unwrap().len(), 2);
}

#[test]
fn test_subscribe_twice_conflicts() {
    let k = Kitchen::new();
    toggle_subscription(&k.store, k.bob.id, k.alice.id, true, None).unwrap();
    assert!(matches!(
        toggle_subscription(&k.store, k.bob.id, k.alice.id, true, None),
        Err(Error::Conflict(_))
    ));
    assert_eq!(k.store.row_counts().unwrap().subscriptions, 1);
}

#[test]
fn test_subscribe_to_unknown_user() {
    let k = Kitchen::new();
    assert!(matches!(
        toggle_subscription(&k.store, k.bob.id, Uuid::new_v4(), true, None),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_unsubscribe() {
    let k = Kitchen::new();
    toggle_subscription(&k.store, k.bob.id, k.alice.id, true, None).unwrap();
    assert!(annotate_user(&k.store, k.alice.id, Viewer::User(k.bob.id)).unwrap());

    let removed = toggle_subscription(&k.store, k.bob.id, k.alice.id, false, None).unwrap();
    assert!(removed.is_none());
    assert!(!annotate_user(&k.store, k.alice.id, Viewer::User(k.bob.id)).unwrap());

    assert!(matches!(
        toggle_subscription(&k.store, k.bob.id, k.alice.id, false, None),
        Err(Error::NotFound(_))
    ));
}

#[test]
fn test_subscriptions_ordered_by_username() {
    let k = Kitchen::new();
    let zoe = k.store.add_user("zoe").unwrap();
    let carol = k.store.add_user("carol").unwrap();
    toggle_subscription(&k.store, k.bob.id, zoe.id, true, None).unwrap();
    toggle_subscription(&k.store, k.bob.id, k.alice.id, true, None).unwrap();
    toggle_subscription(&k.store, k.bob.id, carol.id, true, None).unwrap();

    let names: Vec<String> = list_subscriptions(&k.store, k.bob.id, None)
        .unwrap()
        .into_iter()
        .map(|s| s.author.username)
        .collect();
    assert_eq!(names, vec!["alice", "carol", "zoe"]);
    assert!(list_subscriptions(&k.store, k.alice.id, None)
        .unwrap()
        .is_empty());
}
