use warp::http::StatusCode;
use warp::Filter;

use ruokalista_sdk::error::{handle_rejection, reject, ApiError};
use ruokalista_sdk::jwt::{generate_jwt_session, SessionData};
use ruokalista_sdk::middleware::{with_possible_session, with_session};
use ruokalista_sdk::schema::{User, UserRole};

const SECRET: &str = "integration-test-secret";

fn sample_user() -> User {
    User {
        id: 42,
        username: "chef".to_string(),
        email: "chef@example.com".to_string(),
        first_name: None,
        last_name: None,
        password: "hash".to_string(),
        role: UserRole::User,
    }
}

#[tokio::test]
async fn missing_session_cookie_is_401() {
    let route = warp::path!("private")
        .and(with_session(SECRET.to_string()))
        .map(|session: SessionData| warp::reply::json(&session.username))
        .recover(handle_rejection);

    let res = warp::test::request().path("/private").reply(&route).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert!(body.get("detail").is_some());
}

#[tokio::test]
async fn valid_session_cookie_passes() {
    let token = generate_jwt_session(&sample_user(), SECRET.as_bytes()).unwrap();

    let route = warp::path!("private")
        .and(with_session(SECRET.to_string()))
        .map(|session: SessionData| warp::reply::json(&session.username))
        .recover(handle_rejection);

    let res = warp::test::request()
        .path("/private")
        .header("cookie", format!("session={token}"))
        .reply(&route)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"\"chef\"");
}

#[tokio::test]
async fn anonymous_request_reaches_open_route() {
    let route = warp::path!("open")
        .and(with_possible_session(SECRET.to_string()))
        .map(|session: Option<SessionData>| warp::reply::json(&session.is_some()))
        .recover(handle_rejection);

    let res = warp::test::request().path("/open").reply(&route).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"false");
}

#[tokio::test]
async fn forged_cookie_degrades_to_anonymous() {
    let forged = generate_jwt_session(&sample_user(), b"other-secret").unwrap();

    let route = warp::path!("open")
        .and(with_possible_session(SECRET.to_string()))
        .map(|session: Option<SessionData>| warp::reply::json(&session.is_some()))
        .recover(handle_rejection);

    let res = warp::test::request()
        .path("/open")
        .header("cookie", format!("session={forged}"))
        .reply(&route)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"false");
}

#[tokio::test]
async fn validation_failure_renders_field_to_message_body() {
    let route = warp::path!("invalid")
        .and_then(|| async {
            Err::<String, _>(reject(ApiError::invalid_input(
                "cooking_time",
                "must be at least 1 minute",
            )))
        })
        .recover(handle_rejection);

    let res = warp::test::request().path("/invalid").reply(&route).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
    assert_eq!(body["cooking_time"], "must be at least 1 minute");
}

#[tokio::test]
async fn conflict_renders_409() {
    let route = warp::path!("dup")
        .and_then(|| async {
            Err::<String, _>(reject(ApiError::Conflict(
                "recipe is already favorited".to_string(),
            )))
        })
        .recover(handle_rejection);

    let res = warp::test::request().path("/dup").reply(&route).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn forbidden_renders_403() {
    let route = warp::path!("admin-only")
        .and_then(|| async { Err::<String, _>(reject(ApiError::Forbidden)) })
        .recover(handle_rejection);

    let res = warp::test::request().path("/admin-only").reply(&route).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_path_renders_404() {
    let route = warp::path!("known")
        .map(warp::reply)
        .recover(handle_rejection);

    let res = warp::test::request().path("/unknown").reply(&route).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
