use std::collections::HashSet;

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use crate::constants::RECIPE_COUNT_PER_PAGE;
use crate::error::ApiError;
use crate::pagination::PageContext;
use crate::schema::{Recipe, RecipeIngredient, RecipeRow};
use crate::serializers::{IngredientAmount, RecipeUpdate, RecipeWrite};
use crate::validation::{
    validate_cooking_time, validate_ingredients, validate_recipe_name, validate_tags,
};

pub async fn get_recipe(id: i32, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Recipe listing with every supported filter. The favorited / in-cart
/// filters are scoped to the requesting principal and are no-ops for
/// anonymous requests (callers pass `None` then).
pub async fn fetch_recipes(
    author: Option<i32>,
    tag_slugs: &[String],
    favorited_by: Option<i32>,
    in_cart_of: Option<i32>,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.*, COUNT(*) OVER() AS count FROM recipes r WHERE TRUE");

    if let Some(author) = author {
        query.push(" AND r.author_id = ").push_bind(author);
    }
    if !tag_slugs.is_empty() {
        query
            .push(
                " AND EXISTS (
                    SELECT 1 FROM recipe_tags rt
                    INNER JOIN tags t ON t.id = rt.tag_id
                    WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(tag_slugs.to_vec())
            .push("))");
    }
    if let Some(user_id) = favorited_by {
        query
            .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(user_id) = in_cart_of {
        query
            .push(
                " AND EXISTS (SELECT 1 FROM shopping_list s WHERE s.recipe_id = r.id AND s.user_id = ",
            )
            .push_bind(user_id)
            .push(")");
    }

    query
        .push(" ORDER BY r.created_at DESC LIMIT ")
        .push_bind(RECIPE_COUNT_PER_PAGE)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows: Vec<RecipeRow> = query.build_query_as().fetch_all(pool).await?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    Ok(PageContext::from_rows(
        rows,
        total_count,
        RECIPE_COUNT_PER_PAGE,
        offset,
    ))
}

pub async fn list_recipe_ingredients(
    recipe_id: i32,
    pool: &Pool<Postgres>,
) -> Result<Vec<RecipeIngredient>, ApiError> {
    let rows: Vec<RecipeIngredient> = sqlx::query_as(
        "
        SELECT ri.recipe_id, ri.ingredient_id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Author's recipes, newest first, truncated to `limit` when given.
/// Backs the `recipes_limit` parameter of the subscriptions listing.
pub async fn list_recipes_by_author(
    author_id: i32,
    limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<Vec<Recipe>, ApiError> {
    let rows: Vec<Recipe> = match limit {
        Some(limit) => {
            sqlx::query_as(
                "SELECT * FROM recipes WHERE author_id = $1 ORDER BY created_at DESC LIMIT $2",
            )
            .bind(author_id)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as("SELECT * FROM recipes WHERE author_id = $1 ORDER BY created_at DESC")
                .bind(author_id)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(rows)
}

pub async fn count_recipes_by_author(author_id: i32, pool: &Pool<Postgres>) -> Result<i64, ApiError> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
        .bind(author_id)
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}

/// Creates the recipe row and both join sets in one transaction, so a
/// recipe is never visible without its ingredients.
pub async fn create_recipe(
    author_id: i32,
    form: &RecipeWrite,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    validate_recipe_name(&form.name)?;
    validate_cooking_time(form.cooking_time)?;
    validate_tags(&form.tags)?;
    validate_ingredients(&form.ingredients)?;

    let mut tx = pool.begin().await?;

    let recipe: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, image, text, cooking_time)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(author_id)
    .bind(&form.name)
    .bind(&form.image)
    .bind(&form.text)
    .bind(form.cooking_time)
    .fetch_one(&mut *tx)
    .await?;

    insert_recipe_tags(&mut tx, recipe.id, &form.tags).await?;
    insert_recipe_ingredients(&mut tx, recipe.id, &form.ingredients).await?;

    tx.commit().await?;

    Ok(recipe)
}

/// Partial update. A submitted tag or ingredient set replaces the
/// stored one wholesale: delete every join row, insert the new set,
/// all inside the same transaction.
pub async fn update_recipe(
    id: i32,
    form: &RecipeUpdate,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    if let Some(name) = &form.name {
        validate_recipe_name(name)?;
    }
    if let Some(cooking_time) = form.cooking_time {
        validate_cooking_time(cooking_time)?;
    }
    if let Some(tags) = &form.tags {
        validate_tags(tags)?;
    }
    if let Some(ingredients) = &form.ingredients {
        validate_ingredients(ingredients)?;
    }

    let mut tx = pool.begin().await?;

    let recipe: Option<Recipe> = sqlx::query_as(
        "
        UPDATE recipes SET
            name = COALESCE($2, name),
            image = COALESCE($3, image),
            text = COALESCE($4, text),
            cooking_time = COALESCE($5, cooking_time)
        WHERE id = $1
        RETURNING *
    ",
    )
    .bind(id)
    .bind(&form.name)
    .bind(&form.image)
    .bind(&form.text)
    .bind(form.cooking_time)
    .fetch_optional(&mut *tx)
    .await?;

    let recipe = recipe.ok_or(ApiError::NotFound("recipe"))?;

    if let Some(tags) = &form.tags {
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_recipe_tags(&mut tx, id, tags).await?;
    }
    if let Some(ingredients) = &form.ingredients {
        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_recipe_ingredients(&mut tx, id, ingredients).await?;
    }

    tx.commit().await?;

    Ok(recipe)
}

/// Join rows, favorites and cart entries go with the recipe via
/// ON DELETE CASCADE.
pub async fn delete_recipe(id: i32, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("recipe"));
    }
    Ok(())
}

/// Drops repeated tag ids, keeping first-occurrence order.
fn dedupe_tags(tags: &[i32]) -> Vec<i32> {
    let mut seen = HashSet::new();
    tags.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// A tag id repeated in the payload is inserted once; the pair is the
/// join table's primary key.
async fn insert_recipe_tags(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i32,
    tags: &[i32],
) -> Result<(), ApiError> {
    for tag_id in dedupe_tags(tags) {
        let exists: Option<(i32,)> = sqlx::query_as("SELECT id FROM tags WHERE id = $1")
            .bind(tag_id)
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            return Err(ApiError::NotFound("tag"));
        }

        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn insert_recipe_ingredients(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: i32,
    ingredients: &[IngredientAmount],
) -> Result<(), ApiError> {
    for entry in ingredients {
        let exists: Option<(i32,)> = sqlx::query_as("SELECT id FROM ingredients WHERE id = $1")
            .bind(entry.id)
            .fetch_optional(&mut **tx)
            .await?;
        if exists.is_none() {
            return Err(ApiError::NotFound("ingredient"));
        }

        sqlx::query(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) VALUES ($1, $2, $3)",
        )
        .bind(recipe_id)
        .bind(entry.id)
        .bind(entry.amount)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::dedupe_tags;

    #[test]
    fn repeated_tag_ids_collapse_in_order() {
        assert_eq!(dedupe_tags(&[2, 1, 2, 3, 1]), vec![2, 1, 3]);
    }

    #[test]
    fn distinct_tag_ids_are_untouched() {
        assert_eq!(dedupe_tags(&[1, 2, 3]), vec![1, 2, 3]);
        assert!(dedupe_tags(&[]).is_empty());
    }
}
