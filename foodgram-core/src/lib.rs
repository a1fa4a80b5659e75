pub mod aggregate;
pub mod error;
pub mod models;
pub mod pagination;
pub mod recipes;
pub mod reference_data;
pub mod store;
pub mod toggle;
pub mod validation;
pub mod views;

pub use aggregate::{
    annotate_recipe, annotate_recipes, annotate_user, annotate_users, compute_shopping_list,
    render_shopping_list, SHOPPING_LIST_FILENAME,
};
pub use error::{Error, StoreError};
pub use models::{
    Ingredient, IngredientLine, NewIngredient, NewRecipe, NewTag, Recipe, RecipeChanges,
    RecipeFilter, RecipeFlags, RecipeIngredient, Relation, ShoppingListLine, Tag, User, Viewer,
};
pub use pagination::{paginate, Page, PageParams};
pub use recipes::{
    create_recipe, delete_recipe, get_recipe, list_recipes, recipe_views, update_recipe,
    RecipeQuery,
};
pub use store::{MemoryStore, Store, StoreResult};
pub use toggle::{
    add_relation, list_subscriptions, remove_relation, subscribe, subscription_views,
    toggle_cart_entry, toggle_favorite, toggle_subscription, unsubscribe,
};
pub use views::{
    RecipeIngredientView, RecipeInput, RecipeMini, RecipePatch, RecipeView, SubscriptionView,
    UserView,
};
