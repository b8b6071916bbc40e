use serde::Deserialize;
use serde_json::json;
use sqlx::{Pool, Postgres};
use warp::http::StatusCode;
use warp::{reject::Rejection, reply::Reply, Filter};

use crate::actions;
use crate::authentication::middleware::{with_possible_session, with_session};
use crate::config::Config;
use crate::constants::SESSION_COOKIE;
use crate::error::{reject, ApiError};
use crate::jwt::SessionData;
use crate::schema::UserRow;
use crate::serializers::{
    FavoriteRepr, LoginForm, RegisterUser, SetPasswordForm, SubscriptionRepr, UserRepr,
};

use super::helpers::{json_body, with_pool};
use crate::pagination::PageContext;

#[derive(Debug, Default, Deserialize)]
struct UserListQuery {
    username: Option<String>,
    email: Option<String>,
    #[serde(default)]
    offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct SubscriptionQuery {
    recipes_limit: Option<i64>,
    #[serde(default)]
    offset: Option<i64>,
}

pub fn routes(
    pool: Pool<Postgres>,
    config: &Config,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let secret = config.jwt_secret.clone();

    let register = warp::path!("users")
        .and(warp::post())
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(register);

    let list = warp::path!("users")
        .and(warp::get())
        .and(warp::query::<UserListQuery>())
        .and(with_possible_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(list_users);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(me);

    let set_password = warp::path!("users" / "set_password")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(set_password);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(with_session(secret.clone()))
        .and(warp::query::<SubscriptionQuery>())
        .and(with_pool(pool.clone()))
        .and_then(list_subscriptions);

    let retrieve = warp::path!("users" / i32)
        .and(warp::get())
        .and(with_possible_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(retrieve);

    let subscribe = warp::path!("users" / i32 / "subscribe")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(warp::query::<SubscriptionQuery>())
        .and(with_pool(pool.clone()))
        .and_then(subscribe);

    let unsubscribe = warp::path!("users" / i32 / "subscribe")
        .and(warp::delete())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(unsubscribe);

    let login = warp::path!("auth" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with_secret(secret))
        .and(with_pool(pool))
        .and_then(login);

    let logout = warp::path!("auth" / "logout")
        .and(warp::post())
        .map(logout);

    register
        .or(list)
        .or(me)
        .or(set_password)
        .or(subscriptions)
        .or(retrieve)
        .or(subscribe)
        .or(unsubscribe)
        .or(login)
        .or(logout)
}

fn with_secret(
    secret: String,
) -> impl Filter<Extract = (String,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || secret.clone())
}

async fn register(form: RegisterUser, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let user = actions::register_user(&form, &pool).await.map_err(reject)?;

    Ok(warp::reply::with_status(
        warp::reply::json(&UserRepr::from_user(&user, false)),
        StatusCode::CREATED,
    ))
}

async fn list_users(
    query: UserListQuery,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let offset = query.offset.unwrap_or(0).max(0);
    let page = actions::fetch_users(
        query.username.as_deref(),
        query.email.as_deref(),
        offset,
        &pool,
    )
    .await
    .map_err(reject)?;

    let mut reprs = Vec::with_capacity(page.rows.len());
    for row in &page.rows {
        reprs.push(UserRepr::from_row(row, subscribed_flag(&session, row.id, &pool).await?));
    }

    Ok(warp::reply::json(&PageContext {
        rows: reprs,
        total_rows: page.total_rows,
        next_offset: page.next_offset,
        prev_offset: page.prev_offset,
    }))
}

async fn retrieve(
    user_id: i32,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let user = actions::get_user_by_id(&pool, user_id)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(ApiError::NotFound("user")))?;

    let is_subscribed = subscribed_flag(&session, user.id, &pool).await?;
    Ok(warp::reply::json(&UserRepr::from_user(&user, is_subscribed)))
}

async fn me(session: SessionData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let user = actions::get_user_by_id(&pool, session.user_id)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(ApiError::NotFound("user")))?;

    // Subscription to oneself is impossible, the flag is always false.
    Ok(warp::reply::json(&UserRepr::from_user(&user, false)))
}

async fn set_password(
    session: SessionData,
    form: SetPasswordForm,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    actions::set_password(
        session.user_id,
        &form.current_password,
        &form.new_password,
        &pool,
    )
    .await
    .map_err(reject)?;

    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

async fn list_subscriptions(
    session: SessionData,
    query: SubscriptionQuery,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let offset = query.offset.unwrap_or(0).max(0);
    let page = actions::list_subscribed_authors(session.user_id, offset, &pool)
        .await
        .map_err(reject)?;

    let mut reprs = Vec::with_capacity(page.rows.len());
    for author in &page.rows {
        reprs.push(subscription_repr(author, query.recipes_limit, &pool).await?);
    }

    Ok(warp::reply::json(&PageContext {
        rows: reprs,
        total_rows: page.total_rows,
        next_offset: page.next_offset,
        prev_offset: page.prev_offset,
    }))
}

async fn subscribe(
    author_id: i32,
    session: SessionData,
    query: SubscriptionQuery,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let author = actions::get_user_by_id(&pool, author_id)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(ApiError::NotFound("user")))?;

    actions::subscribe(session.user_id, author.id, &pool)
        .await
        .map_err(reject)?;

    let recipes = actions::list_recipes_by_author(author.id, query.recipes_limit, &pool)
        .await
        .map_err(reject)?;
    let recipe_count = actions::count_recipes_by_author(author.id, &pool)
        .await
        .map_err(reject)?;

    let repr = SubscriptionRepr {
        author: UserRepr::from_user(&author, true),
        recipes: recipes.iter().map(FavoriteRepr::from).collect(),
        recipe_count,
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&repr),
        StatusCode::CREATED,
    ))
}

async fn unsubscribe(
    author_id: i32,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    actions::unsubscribe(session.user_id, author_id, &pool)
        .await
        .map_err(reject)?;

    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

async fn login(
    form: LoginForm,
    secret: String,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let token = actions::login_user(&form.username, &form.password, secret.as_bytes(), &pool)
        .await
        .map_err(reject)?;

    Ok(warp::reply::with_header(
        warp::reply::json(&json!({ "detail": "logged in" })),
        "set-cookie",
        format!("{SESSION_COOKIE}={token}; HttpOnly; Path=/"),
    ))
}

fn logout() -> impl Reply {
    warp::reply::with_header(
        warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT),
        "set-cookie",
        format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0"),
    )
}

/// `is_subscribed` for a listed user: false for anonymous requests and
/// for the principal's own row.
async fn subscribed_flag(
    session: &Option<SessionData>,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, Rejection> {
    match session {
        Some(s) if s.user_id != author_id => actions::is_subscribed(s.user_id, author_id, pool)
            .await
            .map_err(reject),
        _ => Ok(false),
    }
}

async fn subscription_repr(
    author: &UserRow,
    recipes_limit: Option<i64>,
    pool: &Pool<Postgres>,
) -> Result<SubscriptionRepr, Rejection> {
    let recipes = actions::list_recipes_by_author(author.id, recipes_limit, pool)
        .await
        .map_err(reject)?;
    let recipe_count = actions::count_recipes_by_author(author.id, pool)
        .await
        .map_err(reject)?;

    Ok(SubscriptionRepr {
        author: UserRepr::from_row(author, true),
        recipes: recipes.iter().map(FavoriteRepr::from).collect(),
        recipe_count,
    })
}
