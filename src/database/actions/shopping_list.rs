use std::fmt::Write;

use sqlx::{Pool, Postgres};

use crate::constants::SHOPPING_LIST_HEADER;
use crate::error::ApiError;
use crate::schema::{ShoppingListEntry, ShoppingListItem};

pub async fn is_in_shopping_cart(
    user_id: i32,
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM shopping_list WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

pub async fn add_to_shopping_cart(
    user_id: i32,
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<ShoppingListEntry, ApiError> {
    if is_in_shopping_cart(user_id, recipe_id, pool).await? {
        return Err(ApiError::Conflict(
            "recipe is already in the shopping cart".to_string(),
        ));
    }

    let row: ShoppingListEntry =
        sqlx::query_as("INSERT INTO shopping_list (user_id, recipe_id) VALUES ($1, $2) RETURNING *")
            .bind(user_id)
            .bind(recipe_id)
            .fetch_one(pool)
            .await?;

    Ok(row)
}

pub async fn remove_from_shopping_cart(
    user_id: i32,
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM shopping_list WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("shopping list entry"));
    }
    Ok(())
}

/// Sums ingredient amounts over every recipe in the user's cart,
/// grouped by ingredient and ordered by name for stable output.
pub async fn aggregate_shopping_cart(
    user_id: i32,
    pool: &Pool<Postgres>,
) -> Result<Vec<ShoppingListItem>, ApiError> {
    let rows: Vec<ShoppingListItem> = sqlx::query_as(
        "
        SELECT i.name, i.measurement_unit, SUM(ri.amount) AS total_amount
        FROM shopping_list sl
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = sl.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sl.user_id = $1
        GROUP BY i.id, i.name, i.measurement_unit
        ORDER BY i.name
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Renders the aggregated cart as the plain-text attachment body, one
/// line per distinct ingredient after the header line.
pub fn render_shopping_list(items: &[ShoppingListItem]) -> String {
    let mut text = format!("{SHOPPING_LIST_HEADER}\n");
    for item in items {
        // Infallible for String targets.
        let _ = writeln!(
            text,
            "{}, {} {}",
            item.name, item.total_amount, item.measurement_unit
        );
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, unit: &str, total: i64) -> ShoppingListItem {
        ShoppingListItem {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            total_amount: total,
        }
    }

    #[test]
    fn renders_header_and_one_line_per_ingredient() {
        let text = render_shopping_list(&[item("flour", "g", 300), item("milk", "ml", 500)]);
        assert_eq!(text, "Shopping list:\nflour, 300 g\nmilk, 500 ml\n");
    }

    #[test]
    fn empty_cart_renders_header_only() {
        let text = render_shopping_list(&[]);
        assert_eq!(text, "Shopping list:\n");
    }

    #[test]
    fn summed_amounts_appear_once_per_ingredient() {
        // Two carted recipes both using flour collapse into one line
        // upstream; rendering must not split them again.
        let text = render_shopping_list(&[item("flour", "g", 300)]);
        assert_eq!(text.matches("flour").count(), 1);
        assert!(text.contains("flour, 300 g"));
    }
}
