use sqlx::{Pool, Postgres};

use crate::error::ApiError;
use crate::schema::FavoriteEntry;

pub async fn is_favorited(
    user_id: i32,
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

/// The existence pre-check is cosmetic; the unique index on
/// (user_id, recipe_id) is what actually guards concurrent doubles.
pub async fn favorite_recipe(
    user_id: i32,
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<FavoriteEntry, ApiError> {
    if is_favorited(user_id, recipe_id, pool).await? {
        return Err(ApiError::Conflict("recipe is already favorited".to_string()));
    }

    let row: FavoriteEntry =
        sqlx::query_as("INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2) RETURNING *")
            .bind(user_id)
            .bind(recipe_id)
            .fetch_one(pool)
            .await?;

    Ok(row)
}

pub async fn unfavorite_recipe(
    user_id: i32,
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("favorite"));
    }
    Ok(())
}
