//! Shared fixture: a memory store seeded with two users, two tags and a few
//! ingredients.

#![allow(dead_code)]

use foodgram_core::{
    create_recipe, Ingredient, IngredientLine, MemoryStore, RecipeInput, RecipeView, Tag, User,
};

pub struct Kitchen {
    pub store: MemoryStore,
    pub alice: User,
    pub bob: User,
    pub breakfast: Tag,
    pub dinner: Tag,
    pub flour: Ingredient,
    pub sugar: Ingredient,
    pub eggs: Ingredient,
}

impl Kitchen {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let alice = store.add_user("alice").unwrap();
        let bob = store.add_user("bob").unwrap();
        let breakfast = store.add_tag("Breakfast", "breakfast").unwrap();
        let dinner = store.add_tag("Dinner", "dinner").unwrap();
        let flour = store.add_ingredient("Flour", "g").unwrap();
        let sugar = store.add_ingredient("Sugar", "g").unwrap();
        let eggs = store.add_ingredient("Eggs", "pcs").unwrap();
        Self {
            store,
            alice,
            bob,
            breakfast,
            dinner,
            flour,
            sugar,
            eggs,
        }
    }

    pub fn input(&self, name: &str, lines: &[(&Ingredient, i32)]) -> RecipeInput {
        RecipeInput {
            name: name.to_string(),
            text: format!("How to make {name}"),
            cooking_time: 20,
            image: "/api/images/00000000-0000-0000-0000-000000000001".to_string(),
            tags: vec![self.breakfast.id],
            ingredients: lines
                .iter()
                .map(|(ingredient, amount)| IngredientLine {
                    ingredient_id: ingredient.id,
                    amount: *amount,
                })
                .collect(),
        }
    }

    pub fn create(&self, author: &User, name: &str, lines: &[(&Ingredient, i32)]) -> RecipeView {
        create_recipe(&self.store, author.id, self.input(name, lines)).unwrap()
    }
}
