//! JWT issue/verify for user sessions

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const DEFAULT_TOKEN_TTL_HOURS: i64 = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserJwtClaims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

fn jwt_secret() -> String {
    std::env::var("TM_JWT_SECRET").unwrap_or_else(|_| "dev-jwt-secret-change-me".to_string())
}

fn user_validation() -> Validation {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation
}

pub fn token_ttl_hours() -> i64 {
    std::env::var("TM_TOKEN_TTL_HOURS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TOKEN_TTL_HOURS)
}

pub fn issue_user_jwt(user_id: &str, role: &str, ttl_hours: i64) -> Result<(String, usize), String> {
    let exp = (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize;
    let claims = UserJwtClaims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret().as_bytes()),
    )
    .map(|token| (token, exp))
    .map_err(|err| format!("Failed to sign user JWT: {}", err))
}

pub fn verify_user_jwt(token: &str) -> Result<UserJwtClaims, String> {
    decode::<UserJwtClaims>(
        token,
        &DecodingKey::from_secret(jwt_secret().as_bytes()),
        &user_validation(),
    )
    .map(|decoded| decoded.claims)
    .map_err(|err| format!("Invalid user JWT: {}", err))
}
