//! Raw SQL that can't be expressed in Diesel's type-safe DSL.
//!
//! # Safety
//!
//! All SQL in this module has been reviewed for SQL injection safety:
//! - User input is ALWAYS passed via `.bind()` parameters
//! - No string concatenation or interpolation with user data
//!
//! When adding new SQL here:
//! 1. Document why Diesel DSL can't be used
//! 2. Ensure all user input uses `.bind()`

use diesel::sql_types::{BigInt, Bool, Text};
use diesel::QueryableByName;
use uuid::Uuid;

/// Consolidated shopping list for one user.
///
/// Parameters: `$1` user id.
///
/// # Why raw SQL?
/// Diesel can't `SUM` an `Int4` column into a `BIGINT` across a three-way join
/// with a `GROUP BY` on joined columns without fighting its aggregate checks.
pub const SHOPPING_LIST_QUERY: &str = "SELECT i.name, i.measurement_unit, \
        SUM(ri.amount)::BIGINT AS total_amount \
    FROM shopping_cart_entries sc \
    JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id \
    JOIN ingredients i ON i.id = ri.ingredient_id \
    WHERE sc.user_id = $1 \
    GROUP BY i.name, i.measurement_unit \
    ORDER BY i.name, i.measurement_unit";

#[derive(QueryableByName, Debug)]
pub struct ShoppingListRow {
    #[diesel(sql_type = Text)]
    pub name: String,
    #[diesel(sql_type = Text)]
    pub measurement_unit: String,
    #[diesel(sql_type = BigInt)]
    pub total_amount: i64,
}

/// Favorite and cart flags of one user for a batch of recipes.
///
/// Parameters: `$1` user id, `$2` array of recipe ids.
///
/// # Why raw SQL?
/// Two correlated `EXISTS` subqueries projected per row; Diesel's DSL has no
/// way to select them next to a column.
pub const RECIPE_FLAGS_QUERY: &str = "SELECT r.id AS recipe_id, \
        EXISTS (SELECT 1 FROM favorites f \
            WHERE f.recipe_id = r.id AND f.user_id = $1) AS is_favorited, \
        EXISTS (SELECT 1 FROM shopping_cart_entries c \
            WHERE c.recipe_id = r.id AND c.user_id = $1) AS is_in_shopping_cart \
    FROM recipes r \
    WHERE r.id = ANY($2)";

#[derive(QueryableByName, Debug)]
pub struct RecipeFlagsRow {
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub recipe_id: Uuid,
    #[diesel(sql_type = Bool)]
    pub is_favorited: bool,
    #[diesel(sql_type = Bool)]
    pub is_in_shopping_cart: bool,
}

/// Escape `LIKE` wildcards so user input only ever matches literally.
pub fn like_prefix(prefix: &str) -> String {
    let escaped = prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_prefix_escapes_wildcards() {
        assert_eq!(like_prefix("flo"), "flo%");
        assert_eq!(like_prefix("50%"), "50\\%%");
        assert_eq!(like_prefix("a_b"), "a\\_b%");
    }
}
