use serde::Deserialize;
use sqlx::{Pool, Postgres};
use warp::http::StatusCode;
use warp::{reject::Rejection, reply::Reply, Filter};

use crate::actions;
use crate::authentication::middleware::with_session;
use crate::config::Config;
use crate::error::{reject, ApiError};
use crate::jwt::SessionData;
use crate::permissions::ActionType;
use crate::serializers::IngredientWrite;

use super::helpers::{json_body, with_pool};

#[derive(Debug, Default, Deserialize)]
struct IngredientQuery {
    /// Case-insensitive name prefix.
    name: Option<String>,
}

pub fn routes(
    pool: Pool<Postgres>,
    config: &Config,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let secret = config.jwt_secret.clone();

    let list = warp::path!("ingredients")
        .and(warp::get())
        .and(warp::query::<IngredientQuery>())
        .and(with_pool(pool.clone()))
        .and_then(list_ingredients);

    let retrieve = warp::path!("ingredients" / i32)
        .and(warp::get())
        .and(with_pool(pool.clone()))
        .and_then(retrieve);

    let create = warp::path!("ingredients")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(create_ingredient);

    let update = warp::path!("ingredients" / i32)
        .and(warp::patch())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(update_ingredient);

    let delete = warp::path!("ingredients" / i32)
        .and(warp::delete())
        .and(with_session(secret))
        .and(with_pool(pool))
        .and_then(delete_ingredient);

    list.or(retrieve).or(create).or(update).or(delete)
}

async fn list_ingredients(
    query: IngredientQuery,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let list = actions::list_ingredients(query.name.as_deref(), &pool)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&list))
}

async fn retrieve(ingredient_id: i32, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let row = actions::get_ingredient(ingredient_id, &pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(ApiError::NotFound("ingredient")))?;

    Ok(warp::reply::json(&row))
}

async fn create_ingredient(
    session: SessionData,
    form: IngredientWrite,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session
        .authenticate(ActionType::ManageIngredients)
        .map_err(reject)?;

    let row = actions::create_ingredient(&form, &pool).await.map_err(reject)?;
    Ok(warp::reply::with_status(
        warp::reply::json(&row),
        StatusCode::CREATED,
    ))
}

async fn update_ingredient(
    ingredient_id: i32,
    session: SessionData,
    form: IngredientWrite,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session
        .authenticate(ActionType::ManageIngredients)
        .map_err(reject)?;

    let row = actions::update_ingredient(ingredient_id, &form, &pool)
        .await
        .map_err(reject)?;
    Ok(warp::reply::json(&row))
}

async fn delete_ingredient(
    ingredient_id: i32,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session
        .authenticate(ActionType::ManageIngredients)
        .map_err(reject)?;

    actions::delete_ingredient(ingredient_id, &pool)
        .await
        .map_err(reject)?;
    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}
