use sqlx::{Pool, Postgres, QueryBuilder};

use crate::authentication::{cryptography, jwt::generate_jwt_session};
use crate::constants::USER_COUNT_PER_PAGE;
use crate::error::ApiError;
use crate::pagination::PageContext;
use crate::schema::{User, UserRow};
use crate::serializers::RegisterUser;
use crate::validation::{validate_email, validate_username};

pub async fn get_user(pool: &Pool<Postgres>, username: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: i32) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Registers a new user. The username pre-checks give friendlier
/// messages than the unique index, which still backstops races.
pub async fn register_user(form: &RegisterUser, pool: &Pool<Postgres>) -> Result<User, ApiError> {
    validate_username(&form.username)?;
    validate_email(&form.email)?;

    if get_user(pool, &form.username).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "username '{}' is already taken",
            form.username
        )));
    }
    let email_taken: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&form.email)
        .fetch_optional(pool)
        .await?;
    if email_taken.is_some() {
        return Err(ApiError::Conflict(format!(
            "email '{}' is already registered",
            form.email
        )));
    }

    let password = cryptography::hash_password(&form.password)?;

    let user: User = sqlx::query_as(
        "
        INSERT INTO users (username, email, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
    ",
    )
    .bind(&form.username)
    .bind(&form.email)
    .bind(&form.first_name)
    .bind(&form.last_name)
    .bind(password)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn login_user(
    username: &str,
    password: &str,
    secret: &[u8],
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = get_user(pool, username).await?;
    let user = match user {
        Some(user) => user,
        None => return Err(ApiError::invalid_input("username", "invalid credentials")),
    };

    let authenticated = cryptography::verify_password(password, &user.password)?;
    if !authenticated {
        return Err(ApiError::invalid_input("username", "invalid credentials"));
    }

    generate_jwt_session(&user, secret)
}

/// Replaces the stored hash after checking the submitted current
/// password against it.
pub async fn set_password(
    user_id: i32,
    current_password: &str,
    new_password: &str,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if current_password == new_password {
        return Err(ApiError::invalid_input(
            "new_password",
            "must differ from the current password",
        ));
    }

    let user = get_user_by_id(pool, user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    if !cryptography::verify_password(current_password, &user.password)? {
        return Err(ApiError::invalid_input(
            "current_password",
            "does not match",
        ));
    }

    let password = cryptography::hash_password(new_password)?;
    sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
        .bind(user_id)
        .bind(password)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn fetch_users(
    username: Option<&str>,
    email: Option<&str>,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserRow>, ApiError> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT id, username, email, first_name, last_name, role, COUNT(*) OVER() AS count
         FROM users WHERE TRUE",
    );
    if let Some(username) = username {
        query.push(" AND username = ").push_bind(username);
    }
    if let Some(email) = email {
        query.push(" AND email = ").push_bind(email);
    }
    query
        .push(" ORDER BY username LIMIT ")
        .push_bind(USER_COUNT_PER_PAGE)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows: Vec<UserRow> = query.build_query_as().fetch_all(pool).await?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    Ok(PageContext::from_rows(
        rows,
        total_count,
        USER_COUNT_PER_PAGE,
        offset,
    ))
}
