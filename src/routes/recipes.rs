use serde::Deserialize;
use sqlx::{Pool, Postgres};
use warp::http::StatusCode;
use warp::{reject::Rejection, reply::Reply, Filter};

use crate::actions;
use crate::authentication::middleware::{with_possible_session, with_session};
use crate::config::Config;
use crate::constants::SHOPPING_LIST_FILENAME;
use crate::error::{reject, ApiError};
use crate::jwt::SessionData;
use crate::pagination::PageContext;
use crate::permissions::ActionType;
use crate::schema::Recipe;
use crate::serializers::{FavoriteRepr, RecipeRepr, RecipeUpdate, RecipeWrite, UserRepr};

use super::helpers::{json_body, with_pool};

#[derive(Debug, Default, Deserialize)]
struct RecipeListQuery {
    author: Option<i32>,
    /// Comma-separated tag slugs.
    tags: Option<String>,
    #[serde(default)]
    is_favorited: Option<bool>,
    #[serde(default)]
    is_in_shopping_cart: Option<bool>,
    #[serde(default)]
    offset: Option<i64>,
}

pub fn routes(
    pool: Pool<Postgres>,
    config: &Config,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let secret = config.jwt_secret.clone();

    let list = warp::path!("recipes")
        .and(warp::get())
        .and(warp::query::<RecipeListQuery>())
        .and(with_possible_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(list_recipes);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(create_recipe);

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(download_shopping_cart);

    let retrieve = warp::path!("recipes" / i32)
        .and(warp::get())
        .and(with_possible_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(retrieve);

    let update = warp::path!("recipes" / i32)
        .and(warp::patch())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(update_recipe);

    let delete = warp::path!("recipes" / i32)
        .and(warp::delete())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(delete_recipe);

    let favorite = warp::path!("recipes" / i32 / "favorite")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(favorite);

    let unfavorite = warp::path!("recipes" / i32 / "favorite")
        .and(warp::delete())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(unfavorite);

    let cart_add = warp::path!("recipes" / i32 / "shopping_cart")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(add_to_cart);

    let cart_remove = warp::path!("recipes" / i32 / "shopping_cart")
        .and(warp::delete())
        .and(with_session(secret))
        .and(with_pool(pool))
        .and_then(remove_from_cart);

    list.or(create)
        .or(download)
        .or(retrieve)
        .or(update)
        .or(delete)
        .or(favorite)
        .or(unfavorite)
        .or(cart_add)
        .or(cart_remove)
}

async fn list_recipes(
    query: RecipeListQuery,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let tag_slugs: Vec<String> = query
        .tags
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    // Principal-scoped filters pass through untouched for anonymous
    // requests or an explicit `false`.
    let favorited_by = match (&session, query.is_favorited) {
        (Some(s), Some(true)) => Some(s.user_id),
        _ => None,
    };
    let in_cart_of = match (&session, query.is_in_shopping_cart) {
        (Some(s), Some(true)) => Some(s.user_id),
        _ => None,
    };

    let offset = query.offset.unwrap_or(0).max(0);
    let page = actions::fetch_recipes(
        query.author,
        &tag_slugs,
        favorited_by,
        in_cart_of,
        offset,
        &pool,
    )
    .await
    .map_err(reject)?;

    let mut reprs = Vec::with_capacity(page.rows.len());
    for row in &page.rows {
        reprs.push(recipe_repr(row.clone().into_recipe(), session.as_ref(), &pool).await?);
    }

    Ok(warp::reply::json(&PageContext {
        rows: reprs,
        total_rows: page.total_rows,
        next_offset: page.next_offset,
        prev_offset: page.prev_offset,
    }))
}

async fn retrieve(
    recipe_id: i32,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = fetch_recipe(recipe_id, &pool).await?;
    let repr = recipe_repr(recipe, session.as_ref(), &pool).await?;

    Ok(warp::reply::json(&repr))
}

async fn create_recipe(
    session: SessionData,
    form: RecipeWrite,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session
        .authenticate(ActionType::CreateRecipes)
        .map_err(reject)?;

    let recipe = actions::create_recipe(session.user_id, &form, &pool)
        .await
        .map_err(reject)?;
    let repr = recipe_repr(recipe, Some(&session), &pool).await?;

    Ok(warp::reply::with_status(
        warp::reply::json(&repr),
        StatusCode::CREATED,
    ))
}

async fn update_recipe(
    recipe_id: i32,
    session: SessionData,
    form: RecipeUpdate,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = fetch_recipe(recipe_id, &pool).await?;
    authorize_author(&session, &recipe)?;

    let recipe = actions::update_recipe(recipe.id, &form, &pool)
        .await
        .map_err(reject)?;
    let repr = recipe_repr(recipe, Some(&session), &pool).await?;

    Ok(warp::reply::json(&repr))
}

async fn delete_recipe(
    recipe_id: i32,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = fetch_recipe(recipe_id, &pool).await?;
    authorize_author(&session, &recipe)?;

    actions::delete_recipe(recipe.id, &pool).await.map_err(reject)?;

    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

async fn favorite(
    recipe_id: i32,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = fetch_recipe(recipe_id, &pool).await?;
    actions::favorite_recipe(session.user_id, recipe.id, &pool)
        .await
        .map_err(reject)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&FavoriteRepr::from(&recipe)),
        StatusCode::CREATED,
    ))
}

async fn unfavorite(
    recipe_id: i32,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    actions::unfavorite_recipe(session.user_id, recipe_id, &pool)
        .await
        .map_err(reject)?;

    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

async fn add_to_cart(
    recipe_id: i32,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let recipe = fetch_recipe(recipe_id, &pool).await?;
    actions::add_to_shopping_cart(session.user_id, recipe.id, &pool)
        .await
        .map_err(reject)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&FavoriteRepr::from(&recipe)),
        StatusCode::CREATED,
    ))
}

async fn remove_from_cart(
    recipe_id: i32,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    actions::remove_from_shopping_cart(session.user_id, recipe_id, &pool)
        .await
        .map_err(reject)?;

    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

async fn download_shopping_cart(
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let items = actions::aggregate_shopping_cart(session.user_id, &pool)
        .await
        .map_err(reject)?;
    let text = actions::render_shopping_list(&items);

    Ok(warp::reply::with_header(
        warp::reply::with_header(text, "content-type", "text/plain; charset=utf-8"),
        "content-disposition",
        format!("attachment; filename={SHOPPING_LIST_FILENAME}"),
    ))
}

async fn fetch_recipe(recipe_id: i32, pool: &Pool<Postgres>) -> Result<Recipe, Rejection> {
    actions::get_recipe(recipe_id, pool)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(ApiError::NotFound("recipe")))
}

/// Mutation is allowed to the recipe's author; anyone else needs the
/// admin-only manage-all permission.
fn authorize_author(session: &SessionData, recipe: &Recipe) -> Result<(), Rejection> {
    if recipe.author_id != session.user_id {
        session
            .authenticate(ActionType::ManageAllRecipes)
            .map_err(reject)?;
    }
    Ok(())
}

/// Assembles the full read representation: nested author, tags,
/// ingredient amounts and the per-request computed flags.
async fn recipe_repr(
    recipe: Recipe,
    session: Option<&SessionData>,
    pool: &Pool<Postgres>,
) -> Result<RecipeRepr, Rejection> {
    let author = actions::get_user_by_id(pool, recipe.author_id)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(ApiError::NotFound("user")))?;

    let is_subscribed = match session {
        Some(s) if s.user_id != author.id => actions::is_subscribed(s.user_id, author.id, pool)
            .await
            .map_err(reject)?,
        _ => false,
    };

    let tags = actions::list_recipe_tags(recipe.id, pool).await.map_err(reject)?;
    let ingredients = actions::list_recipe_ingredients(recipe.id, pool)
        .await
        .map_err(reject)?;

    let (is_favorited, is_in_shopping_cart) = match session {
        Some(s) => (
            actions::is_favorited(s.user_id, recipe.id, pool)
                .await
                .map_err(reject)?,
            actions::is_in_shopping_cart(s.user_id, recipe.id, pool)
                .await
                .map_err(reject)?,
        ),
        None => (false, false),
    };

    Ok(RecipeRepr::assemble(
        recipe,
        UserRepr::from_user(&author, is_subscribed),
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
    ))
}
