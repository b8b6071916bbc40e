use sqlx::{Pool, Postgres};

use crate::constants::SUBSCRIPTION_COUNT_PER_PAGE;
use crate::error::ApiError;
use crate::pagination::PageContext;
use crate::schema::{Subscription, UserRow};

pub async fn is_subscribed(
    user_id: i32,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT id FROM subscriptions WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .fetch_optional(pool)
            .await?;

    Ok(row.is_some())
}

/// Self-subscription is pre-checked here for the message; the store's
/// check constraint still rejects it authoritatively, and the unique
/// index turns a concurrent duplicate into a `Conflict`.
pub async fn subscribe(
    user_id: i32,
    author_id: i32,
    pool: &Pool<Postgres>,
) -> Result<Subscription, ApiError> {
    if user_id == author_id {
        return Err(ApiError::invalid_input(
            "author",
            "subscribing to yourself is not allowed",
        ));
    }
    if is_subscribed(user_id, author_id, pool).await? {
        return Err(ApiError::Conflict(
            "already subscribed to this author".to_string(),
        ));
    }

    let row: Subscription = sqlx::query_as(
        "INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(user_id)
    .bind(author_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

pub async fn unsubscribe(user_id: i32, author_id: i32, pool: &Pool<Postgres>) -> Result<(), ApiError> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("subscription"));
    }
    Ok(())
}

/// Authors the given user follows, ordered by username.
pub async fn list_subscribed_authors(
    user_id: i32,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserRow>, ApiError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.role,
               COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.user_id = $1
        ORDER BY u.username
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(user_id)
    .bind(SUBSCRIPTION_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total_count = rows.first().map(|r| r.count).unwrap_or(0);
    Ok(PageContext::from_rows(
        rows,
        total_count,
        SUBSCRIPTION_COUNT_PER_PAGE,
        offset,
    ))
}

#[cfg(test)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    /// A lazy pool never opens a connection, so this passes only if
    /// the self-check fires before any query is issued.
    #[tokio::test]
    async fn self_subscription_rejected_without_touching_the_store() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://nobody@127.0.0.1:1/void")
            .unwrap();

        let result = subscribe(7, 7, &pool).await;
        match result {
            Err(ApiError::InvalidInput { field, .. }) => assert_eq!(field, "author"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }
}
