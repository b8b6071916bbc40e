use sqlx::{Pool, Postgres};

use crate::error::ApiError;
use crate::schema::Tag;
use crate::serializers::TagWrite;

pub async fn create_tag(form: &TagWrite, pool: &Pool<Postgres>) -> Result<Tag, ApiError> {
    let tag: Tag = sqlx::query_as("INSERT INTO tags (name, color, slug) VALUES ($1, $2, $3) RETURNING *")
        .bind(&form.name)
        .bind(&form.color)
        .bind(&form.slug)
        .fetch_one(pool)
        .await?;

    Ok(tag)
}

pub async fn get_tag(id: i32, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let tag: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(tag)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(list)
}

pub async fn update_tag(id: i32, form: &TagWrite, pool: &Pool<Postgres>) -> Result<Tag, ApiError> {
    let tag: Option<Tag> = sqlx::query_as(
        "UPDATE tags SET name = $2, color = $3, slug = $4 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&form.name)
    .bind(&form.color)
    .bind(&form.slug)
    .fetch_optional(pool)
    .await?;

    tag.ok_or(ApiError::NotFound("tag"))
}

pub async fn delete_tag(id: i32, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM tags WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("tag"));
    }
    Ok(())
}

pub async fn list_recipe_tags(recipe_id: i32, pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.*
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(list)
}
