//! User API endpoints
//!
//! Every handler resolves the viewer first and funnels the request through
//! the core access rules: visibility for reads, `can()` for mutations, and
//! the assignment rules for supervisor changes.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use tm_core::access::{
    can, eligible_supervisors, validate_supervisor_change, visible_users, Action,
    SupervisorFilter, UserQuery, Viewer,
};
use tm_core::stats::UserStats;
use tm_core::user::{Role, User, UserId, UserRepository};

use crate::auth::resolve_viewer;
use crate::routes::{bad_request, forbidden, internal_error, not_found, route_error, RouteError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_active: user.is_active,
            supervisor_id: user.supervisor_id,
            avatar: user.avatar,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    #[serde(default)]
    pub role: Option<Role>,
    /// "active" or "inactive"
    #[serde(default)]
    pub status: Option<String>,
    /// A supervisor id, or "unassigned"
    #[serde(default)]
    pub supervisor: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(default)]
    pub supervisor_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignSupervisorRequest {
    pub supervisor_id: Option<UserId>,
}

fn parse_query(viewer: &Viewer, query: ListUsersQuery) -> Result<UserQuery, RouteError> {
    let active = match query.status.as_deref() {
        None => None,
        Some("active") => Some(true),
        Some("inactive") => Some(false),
        Some(other) => {
            return Err(bad_request(format!("Unknown status filter '{}'", other)));
        }
    };

    // The supervisor filter is an admin-only facet; other roles never see
    // the dropdown, so the parameter is ignored for them rather than obeyed.
    let supervisor = match (&query.supervisor, viewer.role) {
        (Some(raw), Role::Admin) => Some(if raw == "unassigned" {
            SupervisorFilter::Unassigned
        } else {
            SupervisorFilter::Of(
                raw.parse()
                    .map_err(|_| bad_request(format!("Invalid supervisor filter '{}'", raw)))?,
            )
        }),
        _ => None,
    };

    Ok(UserQuery {
        role: query.role,
        active,
        supervisor,
        search: query.search.filter(|s| !s.trim().is_empty()),
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/users - List users visible to the viewer
async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, RouteError> {
    let viewer_user = resolve_viewer(&headers, &state)
        .await
        .map_err(|(status, msg)| route_error(status, msg))?;
    let viewer = Viewer::from(&viewer_user);

    if !can(&viewer, Action::ManageUsers) {
        return Err(forbidden("You do not have permission to manage users"));
    }

    let all_users = state
        .user_store()
        .list()
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    let narrowing = parse_query(&viewer, query)?;
    let visible = narrowing.apply(visible_users(&viewer, &all_users));

    Ok(Json(
        visible.into_iter().cloned().map(UserResponse::from).collect(),
    ))
}

/// GET /api/users/stats - Summary counts over the viewer's visible users
async fn user_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserStats>, RouteError> {
    let viewer_user = resolve_viewer(&headers, &state)
        .await
        .map_err(|(status, msg)| route_error(status, msg))?;
    let viewer = Viewer::from(&viewer_user);

    if !can(&viewer, Action::ManageUsers) {
        return Err(forbidden("You do not have permission to manage users"));
    }

    let all_users = state
        .user_store()
        .list()
        .await
        .map_err(|e| internal_error(e.to_string()))?;
    let visible = visible_users(&viewer, &all_users);

    Ok(Json(UserStats::summarize(&visible)))
}

/// GET /api/users/supervisors - Valid targets for supervisor assignment
async fn list_eligible_supervisors(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserResponse>>, RouteError> {
    let viewer_user = resolve_viewer(&headers, &state)
        .await
        .map_err(|(status, msg)| route_error(status, msg))?;
    let viewer = Viewer::from(&viewer_user);

    if viewer.role != Role::Admin {
        return Err(forbidden("Only admins assign supervisors"));
    }

    let all_users = state
        .user_store()
        .list()
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    Ok(Json(
        eligible_supervisors(&all_users)
            .into_iter()
            .cloned()
            .map(UserResponse::from)
            .collect(),
    ))
}

/// POST /api/users - Create a user account (admin only)
async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), RouteError> {
    let viewer_user = resolve_viewer(&headers, &state)
        .await
        .map_err(|(status, msg)| route_error(status, msg))?;
    let viewer = Viewer::from(&viewer_user);

    if viewer.role != Role::Admin {
        return Err(forbidden("Only admins create users"));
    }

    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(bad_request("A valid email is required"));
    }
    if req.password.len() < 8 {
        return Err(bad_request("Password must be at least 8 characters"));
    }

    let mut user = User::new(email.clone(), req.first_name.trim(), req.last_name.trim(), req.role);

    if let Some(supervisor_id) = req.supervisor_id {
        let all_users = state
            .user_store()
            .list()
            .await
            .map_err(|e| internal_error(e.to_string()))?;
        validate_supervisor_change(&viewer, &user, Some(supervisor_id), &all_users)
            .map_err(|e| bad_request(e.to_string()))?;
        user.supervisor_id = Some(supervisor_id);
    }

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
        let _ = state.user_store().delete(user.id).await;
        return Err(bad_request(err.to_string()));
    }

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "Created user");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// PUT /api/users/{id} - Update a user account
async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<UserId>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, RouteError> {
    let viewer_user = resolve_viewer(&headers, &state)
        .await
        .map_err(|(status, msg)| route_error(status, msg))?;
    let viewer = Viewer::from(&viewer_user);

    let mut user = state
        .user_store()
        .get(id)
        .await
        .map_err(|e| internal_error(e.to_string()))?
        .ok_or_else(|| not_found(format!("User {} not found", id)))?;

    if !can(&viewer, Action::EditUser(&user)) {
        return Err(forbidden("You do not have permission to edit this user"));
    }

    if let Some(first_name) = req.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = req.last_name {
        user.last_name = last_name;
    }
    if let Some(role) = req.role {
        user.role = role;
        // The supervisor edge is only meaningful for employees.
        if role != Role::Employee {
            user.supervisor_id = None;
        }
    }
    if let Some(is_active) = req.is_active {
        user.is_active = is_active;
    }
    if let Some(avatar) = req.avatar {
        user.avatar = Some(avatar);
    }

    let user = state
        .user_store()
        .update(user)
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    tracing::info!(user_id = %user.id, "Updated user");
    Ok(Json(UserResponse::from(user)))
}

/// PUT /api/users/{id}/supervisor - Change an employee's supervisor
async fn assign_supervisor(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<UserId>,
    Json(req): Json<AssignSupervisorRequest>,
) -> Result<Json<UserResponse>, RouteError> {
    let viewer_user = resolve_viewer(&headers, &state)
        .await
        .map_err(|(status, msg)| route_error(status, msg))?;
    let viewer = Viewer::from(&viewer_user);

    let mut employee = state
        .user_store()
        .get(id)
        .await
        .map_err(|e| internal_error(e.to_string()))?
        .ok_or_else(|| not_found(format!("User {} not found", id)))?;

    let all_users = state
        .user_store()
        .list()
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    validate_supervisor_change(&viewer, &employee, req.supervisor_id, &all_users).map_err(
        |e| match e {
            tm_core::access::AssignmentError::NotAuthorized => forbidden(e.to_string()),
            _ => bad_request(e.to_string()),
        },
    )?;

    employee.supervisor_id = req.supervisor_id;
    let employee = state
        .user_store()
        .update(employee)
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    tracing::info!(
        user_id = %employee.id,
        supervisor = ?employee.supervisor_id,
        "Supervisor assignment updated"
    );
    Ok(Json(UserResponse::from(employee)))
}

/// DELETE /api/users/{id} - Delete a user account (admin only)
async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<UserId>,
) -> Result<StatusCode, RouteError> {
    let viewer_user = resolve_viewer(&headers, &state)
        .await
        .map_err(|(status, msg)| route_error(status, msg))?;
    let viewer = Viewer::from(&viewer_user);

    let user = state
        .user_store()
        .get(id)
        .await
        .map_err(|e| internal_error(e.to_string()))?
        .ok_or_else(|| not_found(format!("User {} not found", id)))?;

    if !can(&viewer, Action::DeleteUser(&user)) {
        return Err(forbidden("You do not have permission to delete users"));
    }

    state
        .user_store()
        .delete(id)
        .await
        .map_err(|e| internal_error(e.to_string()))?;
    state
        .credential_store()
        .remove(id)
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    tracing::info!(user_id = %id, "Deleted user");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/stats", get(user_stats))
        .route("/api/users/supervisors", get(list_eligible_supervisors))
        .route(
            "/api/users/{id}",
            put(update_user).delete(delete_user),
        )
        .route("/api/users/{id}/supervisor", put(assign_supervisor))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use tm_core::user::{Role, User, UserRepository};

    use crate::auth::{issue_user_jwt, token_ttl_hours};
    use crate::state::AppState;

    async fn build_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let state = AppState::new(temp_dir.path().to_path_buf()).await.unwrap();
        (state, temp_dir)
    }

    async fn seed_user(state: &AppState, user: User) -> User {
        state.user_store().create(user).await.unwrap()
    }

    fn token_for(user: &User) -> String {
        let (token, _) =
            issue_user_jwt(&user.id.to_string(), user.role.as_str(), token_ttl_hours()).unwrap();
        token
    }

    async fn get_json(
        app: axum::Router,
        uri: &str,
        token: &str,
    ) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("Authorization", format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn employee_is_denied_user_listing() {
        let (state, _tmp) = build_state().await;
        let employee = seed_user(
            &state,
            User::new("e@example.com", "E", "One", Role::Employee),
        )
        .await;

        let app = super::router().with_state(state);
        let (status, _) = get_json(app, "/api/users", &token_for(&employee)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn supervisor_sees_team_peers_and_self_only() {
        let (state, _tmp) = build_state().await;
        let _admin = seed_user(
            &state,
            User::new("a@example.com", "A", "Admin", Role::Admin),
        )
        .await;
        let s1 = seed_user(
            &state,
            User::new("s1@example.com", "S", "One", Role::Supervisor),
        )
        .await;
        let _s2 = seed_user(
            &state,
            User::new("s2@example.com", "S", "Two", Role::Supervisor),
        )
        .await;
        let _mine = seed_user(
            &state,
            User::new("e1@example.com", "E", "One", Role::Employee).with_supervisor(s1.id),
        )
        .await;
        let _other = seed_user(
            &state,
            User::new("e2@example.com", "E", "Two", Role::Employee),
        )
        .await;

        let app = super::router().with_state(state);
        let (status, body) = get_json(app, "/api/users", &token_for(&s1)).await;
        assert_eq!(status, StatusCode::OK);

        let emails: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["email"].as_str().unwrap())
            .collect();
        assert_eq!(emails.len(), 3);
        assert!(emails.contains(&"s1@example.com"));
        assert!(emails.contains(&"s2@example.com"));
        assert!(emails.contains(&"e1@example.com"));
    }

    #[tokio::test]
    async fn supervisor_cannot_edit_team_member() {
        let (state, _tmp) = build_state().await;
        let s1 = seed_user(
            &state,
            User::new("s1@example.com", "S", "One", Role::Supervisor),
        )
        .await;
        let member = seed_user(
            &state,
            User::new("e1@example.com", "E", "One", Role::Employee).with_supervisor(s1.id),
        )
        .await;

        let app = super::router().with_state(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/users/{}", member.id))
                    .header("Authorization", format!("Bearer {}", token_for(&s1)))
                    .header("Content-Type", "application/json")
                    .body(Body::from(json!({"firstName": "Renamed"}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_cannot_edit_own_account() {
        let (state, _tmp) = build_state().await;
        let admin = seed_user(
            &state,
            User::new("a@example.com", "A", "Admin", Role::Admin),
        )
        .await;

        let app = super::router().with_state(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/users/{}", admin.id))
                    .header("Authorization", format!("Bearer {}", token_for(&admin)))
                    .header("Content-Type", "application/json")
                    .body(Body::from(json!({"firstName": "Me"}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn supervisor_assignment_rejects_non_supervisor_target() {
        let (state, _tmp) = build_state().await;
        let admin = seed_user(
            &state,
            User::new("a@example.com", "A", "Admin", Role::Admin),
        )
        .await;
        let e1 = seed_user(
            &state,
            User::new("e1@example.com", "E", "One", Role::Employee),
        )
        .await;
        let e2 = seed_user(
            &state,
            User::new("e2@example.com", "E", "Two", Role::Employee),
        )
        .await;

        let app = super::router().with_state(state);
        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/api/users/{}/supervisor", e1.id))
                    .header("Authorization", format!("Bearer {}", token_for(&admin)))
                    .header("Content-Type", "application/json")
                    .body(Body::from(json!({"supervisorId": e2.id}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn inactive_supervisor_excluded_from_eligible_targets() {
        let (state, _tmp) = build_state().await;
        let admin = seed_user(
            &state,
            User::new("a@example.com", "A", "Admin", Role::Admin),
        )
        .await;
        let _active = seed_user(
            &state,
            User::new("s1@example.com", "S", "One", Role::Supervisor),
        )
        .await;
        let _inactive = seed_user(
            &state,
            User::new("s2@example.com", "S", "Two", Role::Supervisor).deactivated(),
        )
        .await;

        let app = super::router().with_state(state);
        let (status, body) = get_json(app, "/api/users/supervisors", &token_for(&admin)).await;
        assert_eq!(status, StatusCode::OK);

        let emails: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["email"].as_str().unwrap())
            .collect();
        assert_eq!(emails, vec!["s1@example.com"]);
    }

    #[tokio::test]
    async fn user_stats_reflect_unassigned_employees() {
        let (state, _tmp) = build_state().await;
        let admin = seed_user(
            &state,
            User::new("a@example.com", "A", "Admin", Role::Admin),
        )
        .await;
        let s1 = seed_user(
            &state,
            User::new("s1@example.com", "S", "One", Role::Supervisor),
        )
        .await;
        let _assigned = seed_user(
            &state,
            User::new("e1@example.com", "E", "One", Role::Employee).with_supervisor(s1.id),
        )
        .await;
        let _unassigned = seed_user(
            &state,
            User::new("e2@example.com", "E", "Two", Role::Employee),
        )
        .await;

        let app = super::router().with_state(state);
        let (status, body) = get_json(app, "/api/users/stats", &token_for(&admin)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 4);
        assert_eq!(body["employees"], 2);
        assert_eq!(body["unassignedEmployees"], 1);
    }
}
