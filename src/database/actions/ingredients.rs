use sqlx::{Pool, Postgres};

use crate::error::ApiError;
use crate::schema::Ingredient;
use crate::serializers::IngredientWrite;

/// Escapes `LIKE` metacharacters so a user-supplied prefix matches
/// literally.
fn escape_like_prefix(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Lists ingredients, optionally narrowed to a case-insensitive name
/// prefix, ordered by lowercased name.
pub async fn list_ingredients(
    name_prefix: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ApiError> {
    let list: Vec<Ingredient> = match name_prefix {
        Some(prefix) => {
            sqlx::query_as(
                "SELECT * FROM ingredients WHERE name ILIKE $1 || '%' ESCAPE '\\' ORDER BY LOWER(name)",
            )
            .bind(escape_like_prefix(prefix))
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM ingredients ORDER BY LOWER(name)")
                .fetch_all(pool)
                .await?
        }
    };

    Ok(list)
}

pub async fn get_ingredient(id: i32, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn create_ingredient(
    form: &IngredientWrite,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, ApiError> {
    let row: Ingredient = sqlx::query_as(
        "INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING *",
    )
    .bind(&form.name)
    .bind(&form.measurement_unit)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn update_ingredient(
    id: i32,
    form: &IngredientWrite,
    pool: &Pool<Postgres>,
) -> Result<Ingredient, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as(
        "UPDATE ingredients SET name = $2, measurement_unit = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&form.name)
    .bind(&form.measurement_unit)
    .fetch_optional(pool)
    .await?;

    row.ok_or(ApiError::NotFound("ingredient"))
}

pub async fn delete_ingredient(id: i32, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("ingredient"));
    }
    Ok(())
}

/// Idempotent insert used by the CSV loader: an existing (name, unit)
/// pair is returned as-is. Returns the row and whether it was created.
pub async fn get_or_create_ingredient(
    name: &str,
    measurement_unit: &str,
    pool: &Pool<Postgres>,
) -> Result<(Ingredient, bool), ApiError> {
    let existing: Option<Ingredient> =
        sqlx::query_as("SELECT * FROM ingredients WHERE name = $1 AND measurement_unit = $2")
            .bind(name)
            .bind(measurement_unit)
            .fetch_optional(pool)
            .await?;

    if let Some(row) = existing {
        return Ok((row, false));
    }

    let row: Ingredient = sqlx::query_as(
        "
        INSERT INTO ingredients (name, measurement_unit)
        VALUES ($1, $2)
        ON CONFLICT (name, measurement_unit) DO UPDATE SET name = EXCLUDED.name
        RETURNING *
    ",
    )
    .bind(name)
    .bind(measurement_unit)
    .fetch_one(pool)
    .await?;

    Ok((row, true))
}

#[cfg(test)]
mod tests {
    use super::escape_like_prefix;

    #[test]
    fn plain_prefixes_pass_through() {
        assert_eq!(escape_like_prefix("flour"), "flour");
        assert_eq!(escape_like_prefix(""), "");
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like_prefix("fl_ur"), "fl\\_ur");
        assert_eq!(escape_like_prefix("100%"), "100\\%");
        assert_eq!(escape_like_prefix("a\\b"), "a\\\\b");
    }
}
