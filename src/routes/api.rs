use sqlx::{Pool, Postgres};
use warp::{reject::Rejection, reply::Reply, Filter};

use crate::config::Config;

use super::{ingredients, recipes, tags, users};

/// The whole REST surface: users (with auth), recipes, tags and
/// ingredients. Callers attach `handle_rejection` and request logging
/// on top.
pub fn api(
    pool: Pool<Postgres>,
    config: &Config,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    users::routes(pool.clone(), config)
        .or(recipes::routes(pool.clone(), config))
        .or(tags::routes(pool.clone(), config))
        .or(ingredients::routes(pool, config))
}
