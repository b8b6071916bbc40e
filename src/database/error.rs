use std::convert::Infallible;

use log::{debug, error};
use serde_json::json;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::reply::Reply;

/// Request-local error taxonomy. Every handler and query function
/// reports failures through this type; `handle_rejection` renders it
/// as an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{field}: {message}")]
    InvalidInput { field: String, message: String },
    #[error("authentication required")]
    Unauthenticated,
    #[error("you don't have permission to perform this action")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(String),
}

impl ApiError {
    pub fn invalid_input(field: &str, message: &str) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Validation failures map field to message; everything else is a
    /// single `detail` entry.
    fn body(&self) -> serde_json::Value {
        match self {
            Self::InvalidInput { field, message } => json!({ field: message }),
            other => json!({ "detail": other.to_string() }),
        }
    }
}

impl warp::reject::Reject for ApiError {}

/// Uniqueness and check violations raised by the store are the
/// authoritative guard against concurrent duplicates; translate them
/// instead of surfacing an internal fault.
impl From<sqlx::Error> for ApiError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self::NotFound("row"),
            sqlx::Error::Database(e) => match e.code().as_deref() {
                Some("23505") => Self::Conflict(e.message().to_string()),
                Some("23514") => Self::InvalidInput {
                    field: "non_field_errors".to_string(),
                    message: e.message().to_string(),
                },
                _ => Self::Database(e.message().to_string()),
            },
            e => Self::Database(e.to_string()),
        }
    }
}

pub fn reject(error: ApiError) -> Rejection {
    warp::reject::custom(error)
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if let Some(e) = err.find::<ApiError>() {
        if e.status().is_server_error() {
            error!("request failed: {e}");
        } else {
            debug!("request rejected: {e}");
        }
        (e.status(), e.body())
    } else if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            json!({ "detail": "resource not found" }),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "detail": "method not allowed" }),
        )
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        (
            StatusCode::BAD_REQUEST,
            json!({ "detail": "malformed request body" }),
        )
    } else {
        error!("unhandled rejection: {err:?}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "detail": "internal server error" }),
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_maps_field_to_message() {
        let e = ApiError::invalid_input("cooking_time", "must be positive");
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.body(), json!({ "cooking_time": "must be positive" }));
    }

    #[test]
    fn row_not_found_translates_to_not_found() {
        let e = ApiError::from(sqlx::Error::RowNotFound);
        assert_eq!(e.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn conflict_is_409() {
        assert_eq!(
            ApiError::Conflict("duplicate".to_string()).status(),
            StatusCode::CONFLICT
        );
    }
}
