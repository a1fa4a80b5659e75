//! Read-side aggregation: the consolidated shopping list and the per-viewer
//! derived flags attached to recipe and user views.

use std::collections::{BTreeMap, HashMap, HashSet};

use uuid::Uuid;

use crate::error::Error;
use crate::models::{RecipeFlags, ShoppingListLine, Viewer};
use crate::store::Store;

/// File name used when the shopping list is offered as a download.
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

/// Sum `(name, unit, amount)` rows into one line per (name, unit), ordered by
/// name and then unit.
pub(crate) fn consolidate<I>(rows: I) -> Vec<ShoppingListLine>
where
    I: IntoIterator<Item = (String, String, i64)>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for (name, unit, amount) in rows {
        *totals.entry((name, unit)).or_insert(0) += amount;
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| ShoppingListLine {
            name,
            measurement_unit,
            total_amount,
        })
        .collect()
}

/// Ingredient totals across every recipe in `user_id`'s cart.
pub fn compute_shopping_list<S: Store + ?Sized>(
    store: &S,
    user_id: Uuid,
) -> Result<Vec<ShoppingListLine>, Error> {
    let mut lines = store.shopping_list(user_id)?;
    lines.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.measurement_unit.cmp(&b.measurement_unit))
    });
    tracing::debug!(user_id = %user_id, lines = lines.len(), "computed shopping list");
    Ok(lines)
}

/// Plain-text rendering: one `"<name> - <amount> <unit>"` line per entry.
pub fn render_shopping_list(lines: &[ShoppingListLine]) -> String {
    lines
        .iter()
        .map(|line| {
            format!(
                "{} - {} {}",
                line.name, line.total_amount, line.measurement_unit
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Favorite and cart flags for a batch of recipes, in at most one store call.
///
/// Every requested id is present in the result; anonymous viewers get all
/// flags false without touching the store.
pub fn annotate_recipes<S: Store + ?Sized>(
    store: &S,
    viewer: Viewer,
    recipe_ids: &[Uuid],
) -> Result<HashMap<Uuid, RecipeFlags>, Error> {
    let mut flags: HashMap<Uuid, RecipeFlags> = recipe_ids
        .iter()
        .map(|id| (*id, RecipeFlags::default()))
        .collect();

    let Some(user_id) = viewer.user_id() else {
        return Ok(flags);
    };
    if recipe_ids.is_empty() {
        return Ok(flags);
    }

    flags.extend(store.recipe_flags(user_id, recipe_ids)?);
    Ok(flags)
}

pub fn annotate_recipe<S: Store + ?Sized>(
    store: &S,
    viewer: Viewer,
    recipe_id: Uuid,
) -> Result<RecipeFlags, Error> {
    Ok(annotate_recipes(store, viewer, &[recipe_id])?
        .remove(&recipe_id)
        .unwrap_or_default())
}

/// The subset of `user_ids` the viewer is subscribed to.
pub fn annotate_users<S: Store + ?Sized>(
    store: &S,
    viewer: Viewer,
    user_ids: &[Uuid],
) -> Result<HashSet<Uuid>, Error> {
    match viewer.user_id() {
        Some(subscriber) if !user_ids.is_empty() => {
            Ok(store.subscribed_authors(subscriber, user_ids)?)
        }
        _ => Ok(HashSet::new()),
    }
}

/// Whether `viewer` is subscribed to `profile_id`.
pub fn annotate_user<S: Store + ?Sized>(
    store: &S,
    profile_id: Uuid,
    viewer: Viewer,
) -> Result<bool, Error> {
    Ok(annotate_users(store, viewer, &[profile_id])?.contains(&profile_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i64) -> (String, String, i64) {
        (name.to_string(), unit.to_string(), amount)
    }

    #[test]
    fn test_consolidate_sums_same_name_and_unit() {
        let lines = consolidate(vec![
            row("Flour", "g", 200),
            row("Sugar", "g", 50),
            row("Flour", "g", 300),
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Flour");
        assert_eq!(lines[0].total_amount, 500);
        assert_eq!(lines[1].name, "Sugar");
        assert_eq!(lines[1].total_amount, 50);
    }

    #[test]
    fn test_consolidate_keeps_units_apart() {
        let lines = consolidate(vec![row("Milk", "ml", 200), row("Milk", "cup", 1)]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].measurement_unit, "cup");
        assert_eq!(lines[1].measurement_unit, "ml");
    }

    #[test]
    fn test_consolidate_empty() {
        assert!(consolidate(Vec::new()).is_empty());
    }

    #[test]
    fn test_render_shopping_list() {
        let lines = consolidate(vec![row("Flour", "g", 500), row("Eggs", "pcs", 3)]);
        assert_eq!(render_shopping_list(&lines), "Eggs - 3 pcs\nFlour - 500 g");
    }

    #[test]
    fn test_render_empty_list() {
        assert_eq!(render_shopping_list(&[]), "");
    }
}
