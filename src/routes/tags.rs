use sqlx::{Pool, Postgres};
use warp::http::StatusCode;
use warp::{reject::Rejection, reply::Reply, Filter};

use crate::actions;
use crate::authentication::middleware::with_session;
use crate::config::Config;
use crate::error::{reject, ApiError};
use crate::jwt::SessionData;
use crate::permissions::ActionType;
use crate::serializers::TagWrite;

use super::helpers::{json_body, with_pool};

pub fn routes(
    pool: Pool<Postgres>,
    config: &Config,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let secret = config.jwt_secret.clone();

    let list = warp::path!("tags")
        .and(warp::get())
        .and(with_pool(pool.clone()))
        .and_then(list_tags);

    let retrieve = warp::path!("tags" / i32)
        .and(warp::get())
        .and(with_pool(pool.clone()))
        .and_then(retrieve);

    let create = warp::path!("tags")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(create_tag);

    let update = warp::path!("tags" / i32)
        .and(warp::patch())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(update_tag);

    let delete = warp::path!("tags" / i32)
        .and(warp::delete())
        .and(with_session(secret))
        .and(with_pool(pool))
        .and_then(delete_tag);

    list.or(retrieve).or(create).or(update).or(delete)
}

async fn list_tags(pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let tags = actions::list_tags(&pool).await.map_err(reject)?;
    Ok(warp::reply::json(&tags))
}

async fn retrieve(tag_id: i32, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let tag = actions::get_tag(tag_id, &pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(ApiError::NotFound("tag")))?;

    Ok(warp::reply::json(&tag))
}

async fn create_tag(
    session: SessionData,
    form: TagWrite,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageTags).map_err(reject)?;

    let tag = actions::create_tag(&form, &pool).await.map_err(reject)?;
    Ok(warp::reply::with_status(
        warp::reply::json(&tag),
        StatusCode::CREATED,
    ))
}

async fn update_tag(
    tag_id: i32,
    session: SessionData,
    form: TagWrite,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageTags).map_err(reject)?;

    let tag = actions::update_tag(tag_id, &form, &pool).await.map_err(reject)?;
    Ok(warp::reply::json(&tag))
}

async fn delete_tag(
    tag_id: i32,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageTags).map_err(reject)?;

    actions::delete_tag(tag_id, &pool).await.map_err(reject)?;
    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}
