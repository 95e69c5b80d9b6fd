//! Authentication: JWT session tokens and credential storage

mod jwt;
mod store;

pub use jwt::{issue_user_jwt, token_ttl_hours, verify_user_jwt, UserJwtClaims};
pub use store::{AuthError, CredentialStore};

use axum::http::{HeaderMap, StatusCode};

use tm_core::user::{User, UserRepository};

use crate::state::AppState;

/// Resolve the authenticated user from a Bearer token
///
/// The returned user doubles as the viewer context for every access
/// decision downstream. Inactive accounts are rejected even when their
/// token has not yet expired.
pub async fn resolve_viewer(
    headers: &HeaderMap,
    state: &AppState,
) -> Result<User, (StatusCode, String)> {
    let token = bearer_token(headers)
        .ok_or((StatusCode::UNAUTHORIZED, "Missing bearer token".to_string()))?;
    let claims =
        verify_user_jwt(token).map_err(|err| (StatusCode::UNAUTHORIZED, err))?;
    let user_id = claims
        .sub
        .parse()
        .map_err(|_| (StatusCode::UNAUTHORIZED, "Malformed token subject".to_string()))?;

    let user = state
        .user_store()
        .get(user_id)
        .await
        .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?
        .ok_or((StatusCode::UNAUTHORIZED, "Unknown account".to_string()))?;

    if !user.is_active {
        return Err((StatusCode::FORBIDDEN, "Account is deactivated".to_string()));
    }

    Ok(user)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
