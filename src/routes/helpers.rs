use std::convert::Infallible;

use serde::de::DeserializeOwned;
use sqlx::{Pool, Postgres};
use warp::{reject::Rejection, Filter};

const MAX_BODY_BYTES: u64 = 1024 * 1024;

pub fn with_pool(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (Pool<Postgres>,), Error = Infallible> + Clone {
    warp::any().map(move || pool.clone())
}

pub fn json_body<T: DeserializeOwned + Send>(
) -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}
