use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::database::error::ApiError;
use crate::database::schema::{User, UserRole};

use super::permissions::ActionType;

const SESSION_LIFETIME_HOURS: i64 = 1;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: i32, username: String, role: UserRole) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

/// The authenticated principal of the current request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            return Err(ApiError::Forbidden);
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(data: JwtSessionData) -> Self {
        SessionData {
            user_id: data.user_id,
            username: data.username,
            is_admin: data.role == UserRole::Admin,
            role: data.role,
        }
    }
}

pub fn generate_jwt_session(user: &User, secret: &[u8]) -> Result<String, ApiError> {
    let key: Hmac<Sha256> = Hmac::new_from_slice(secret)
        .map_err(|e| ApiError::Database(format!("invalid session key: {e}")))?;
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role.to_owned());

    claims
        .sign_with_key(&key)
        .map_err(|e| ApiError::Database(format!("session signing failed: {e}")))
}

pub fn verify_jwt_session(token: &str, secret: &[u8]) -> Result<JwtSessionData, ApiError> {
    let key: Hmac<Sha256> = Hmac::new_from_slice(secret)
        .map_err(|e| ApiError::Database(format!("invalid session key: {e}")))?;

    let session: JwtSessionData = token
        .verify_with_key(&key)
        .map_err(|_| ApiError::Unauthenticated)?;

    let now = Local::now().timestamp();
    if (session.exp - now).is_negative() {
        return Err(ApiError::Unauthenticated);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            username: "chef".to_string(),
            email: "chef@example.com".to_string(),
            first_name: None,
            last_name: None,
            password: "hash".to_string(),
            role: UserRole::User,
        }
    }

    #[test]
    fn sign_then_verify_round_trip() {
        let token = generate_jwt_session(&sample_user(), b"test-secret").unwrap();
        let session = verify_jwt_session(&token, b"test-secret").unwrap();
        assert_eq!(session.user_id, 1);
        assert_eq!(session.username, "chef");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_jwt_session(&sample_user(), b"test-secret").unwrap();
        assert!(verify_jwt_session(&token, b"other-secret").is_err());
    }

    #[test]
    fn session_data_carries_admin_flag() {
        let mut user = sample_user();
        user.role = UserRole::Admin;
        let token = generate_jwt_session(&user, b"test-secret").unwrap();
        let session: SessionData = verify_jwt_session(&token, b"test-secret").unwrap().into();
        assert!(session.is_admin);
    }
}
