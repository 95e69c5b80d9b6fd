//! Auth endpoints: register, login, current profile

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tm_core::user::{Role, User, UserRepository};

use crate::auth::{issue_user_jwt, resolve_viewer, token_ttl_hours, AuthError};
use crate::routes::{bad_request, internal_error, route_error, RouteError};
use crate::routes::user::UserResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    email: String,
    password: String,
    first_name: String,
    last_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    token: String,
    expires_at: String,
    user: UserResponse,
}

fn unauthorized(error: impl Into<String>) -> RouteError {
    route_error(StatusCode::UNAUTHORIZED, error)
}

fn auth_response(user: User) -> Result<AuthResponse, RouteError> {
    let (token, exp) = issue_user_jwt(&user.id.to_string(), user.role.as_str(), token_ttl_hours())
        .map_err(internal_error)?;
    let expires_at = DateTime::<Utc>::from_timestamp(exp as i64, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();

    Ok(AuthResponse {
        token,
        expires_at,
        user: UserResponse::from(user),
    })
}

/// POST /api/auth/register
///
/// The first account in an empty store becomes the admin; later
/// self-registrations are employees until an admin promotes them.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), RouteError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(bad_request("A valid email is required"));
    }
    if req.password.len() < 8 {
        return Err(bad_request("Password must be at least 8 characters"));
    }
    if req.first_name.trim().is_empty() || req.last_name.trim().is_empty() {
        return Err(bad_request("First and last name are required"));
    }

    let existing = state
        .user_store()
        .list()
        .await
        .map_err(|e| internal_error(e.to_string()))?;
    let role = if existing.is_empty() {
        Role::Admin
    } else {
        Role::Employee
    };

    let user = User::new(email.clone(), req.first_name.trim(), req.last_name.trim(), role);
    let user = state
        .user_store()
        .create(user)
        .await
        .map_err(|e| bad_request(e.to_string()))?;

    if let Err(err) = state
        .credential_store()
        .register(user.id, &email, &req.password)
        .await
    {
        // Roll back the half-created profile.
        let _ = state.user_store().delete(user.id).await;
        return Err(match err {
            AuthError::AlreadyRegistered(_) => bad_request(err.to_string()),
            _ => internal_error(err.to_string()),
        });
    }

    tracing::info!(user_id = %user.id, role = role.as_str(), "Registered account");
    let response = auth_response(user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, RouteError> {
    let user_id = state
        .credential_store()
        .verify_login(req.email.trim(), &req.password)
        .await
        .map_err(|_| unauthorized("Invalid email or password"))?;

    let user = state
        .user_store()
        .get(user_id)
        .await
        .map_err(|e| internal_error(e.to_string()))?
        .ok_or_else(|| unauthorized("Invalid email or password"))?;

    if !user.is_active {
        return Err(route_error(
            StatusCode::FORBIDDEN,
            "Account is deactivated",
        ));
    }

    tracing::debug!(user_id = %user.id, "Login");
    auth_response(user).map(Json)
}

/// GET /api/auth/me
async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, RouteError> {
    let viewer = resolve_viewer(&headers, &state)
        .await
        .map_err(|(status, msg)| route_error(status, msg))?;
    Ok(Json(UserResponse::from(viewer)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}
