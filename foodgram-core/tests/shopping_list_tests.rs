mod common;

use common::Kitchen;
use foodgram_core::{
    compute_shopping_list, render_shopping_list, toggle_cart_entry, ShoppingListLine,
};

fn line(name: &str, unit: &str, total: i64) -> ShoppingListLine {
    ShoppingListLine {
        name: name.to_string(),
        measurement_unit: unit.to_string(),
        total_amount: total,
    }
}

#[test]
fn test_sums_amounts_across_cart() {
    let k = Kitchen::new();
    let pancakes = k.create(&k.alice, "Pancakes", &[(&k.flour, 200), (&k.sugar, 50)]);
    let bread = k.create(&k.alice, "Bread", &[(&k.flour, 300)]);

    toggle_cart_entry(&k.store, k.bob.id, pancakes.id, true).unwrap();
    toggle_cart_entry(&k.store, k.bob.id, bread.id, true).unwrap();

    let list = compute_shopping_list(&k.store, k.bob.id).unwrap();
    assert_eq!(list, vec![line("Flour", "g", 500), line("Sugar", "g", 50)]);
}

#[test]
fn test_empty_cart() {
    let k = Kitchen::new();
    k.create(&k.alice, "Pancakes", &[(&k.flour, 200)]);

    let list = compute_shopping_list(&k.store, k.bob.id).unwrap();
    assert!(list.is_empty());
    assert_eq!(render_shopping_list(&list), "");
}

#[test]
fn test_same_name_different_unit_stays_separate() {
    let k = Kitchen::new();
    let flour_kg = k.store.add_ingredient("Flour", "kg").unwrap();
    let cake = k.create(&k.alice, "Cake", &[(&k.flour, 250)]);
    let loaf = k.create(&k.alice, "Loaf", &[(&flour_kg, 1)]);

    toggle_cart_entry(&k.store, k.alice.id, cake.id, true).unwrap();
    toggle_cart_entry(&k.store, k.alice.id, loaf.id, true).unwrap();

    let list = compute_shopping_list(&k.store, k.alice.id).unwrap();
    assert_eq!(list, vec![line("Flour", "g", 250), line("Flour", "kg", 1)]);
}

#[test]
fn test_only_own_cart_counts() {
    let k = Kitchen::new();
    let pancakes = k.create(&k.alice, "Pancakes", &[(&k.eggs, 2)]);
    let omelette = k.create(&k.alice, "Omelette", &[(&k.eggs, 3)]);

    toggle_cart_entry(&k.store, k.alice.id, pancakes.id, true).unwrap();
    toggle_cart_entry(&k.store, k.bob.id, omelette.id, true).unwrap();

    assert_eq!(
        compute_shopping_list(&k.store, k.alice.id).unwrap(),
        vec![line("Eggs", "pcs", 2)]
    );
    assert_eq!(
        compute_shopping_list(&k.store, k.bob.id).unwrap(),
        vec![line("Eggs", "pcs", 3)]
    );
}

#[test]
fn test_removing_from_cart_updates_list() {
    let k = Kitchen::new();
    let pancakes = k.create(&k.alice, "Pancakes", &[(&k.flour, 200), (&k.sugar, 50)]);
    let bread = k.create(&k.alice, "Bread", &[(&k.flour, 300)]);
    toggle_cart_entry(&k.store, k.bob.id, pancakes.id, true).unwrap();
    toggle_cart_entry(&k.store, k.bob.id, bread.id, true).unwrap();

    toggle_cart_entry(&k.store, k.bob.id, pancakes.id, false).unwrap();

    assert_eq!(
        compute_shopping_list(&k.store, k.bob.id).unwrap(),
        vec![line("Flour", "g", 300)]
    );
}

#[test]
fn test_rendered_download() {
    let k = Kitchen::new();
    let pancakes = k.create(
        &k.alice,
        "Pancakes",
        &[(&k.flour, 200), (&k.sugar, 50), (&k.eggs, 2)],
    );
    toggle_cart_entry(&k.store, k.alice.id, pancakes.id, true).unwrap();

    let list = compute_shopping_list(&k.store, k.alice.id).unwrap();
    assert_eq!(
        render_shopping_list(&list),
        "Eggs - 2 pcs\nFlour - 200 g\nSugar - 50 g"
    );
}
