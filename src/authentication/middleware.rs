use warp::{reject::Rejection, Filter};

use crate::constants::SESSION_COOKIE;
use crate::error::{reject, ApiError};

use super::jwt::{verify_jwt_session, SessionData};

/// Requires a valid session cookie; rejects with `Unauthenticated`
/// otherwise.
pub fn with_session(
    secret: String,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE).and_then(move |cookie: Option<String>| {
        let secret = secret.clone();
        async move {
            match cookie {
                Some(token) => verify_jwt_session(&token, secret.as_bytes())
                    .map(SessionData::from)
                    .map_err(reject),
                None => Err(reject(ApiError::Unauthenticated)),
            }
        }
    })
}

/// Extracts the session if one is present and valid; anonymous
/// requests pass through as `None`. An expired or forged cookie also
/// degrades to anonymous instead of failing the request.
pub fn with_possible_session(
    secret: String,
) -> impl Filter<Extract = (Option<SessionData>,), Error = std::convert::Infallible> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE).map(move |cookie: Option<String>| {
        cookie
            .and_then(|token| verify_jwt_session(&token, secret.as_bytes()).ok())
            .map(SessionData::from)
    })
}
