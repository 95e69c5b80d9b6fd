//! Task API endpoints
//!
//! Reads go through the visibility filter, mutations through `can()` and the
//! task-assignment rule. A task outside the viewer's visible set is reported
//! as 404 so its existence is not leaked.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tm_core::access::{
    assignable_pool, can, validate_task_assignment, visible_tasks, Action, TaskQuery, Viewer,
};
use tm_core::stats::TaskStats;
use tm_core::task::{Task, TaskId, TaskPriority, TaskRepository, TaskStatus};
use tm_core::user::{Role, User, UserId, UserRepository};

use crate::auth::resolve_viewer;
use crate::routes::user::UserResponse;
use crate::routes::{bad_request, forbidden, internal_error, not_found, route_error, RouteError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl UpdateTaskRequest {
    /// True when the request touches nothing but `status`
    fn is_status_only(&self) -> bool {
        self.status.is_some()
            && self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.assigned_to.is_none()
            && self.due_date.is_none()
            && self.tags.is_none()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_to: UserId,
    pub assigned_by: UserId,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            assigned_to: task.assigned_to,
            assigned_by: task.assigned_by,
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
            due_date: task.due_date.map(|t| t.to_rfc3339()),
            tags: task.tags,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

async fn load_viewer(state: &AppState, headers: &HeaderMap) -> Result<(User, Viewer), RouteError> {
    let user = resolve_viewer(headers, state)
        .await
        .map_err(|(status, msg)| route_error(status, msg))?;
    let viewer = Viewer::from(&user);
    Ok((user, viewer))
}

async fn load_snapshot(state: &AppState) -> Result<(Vec<Task>, Vec<User>), RouteError> {
    let tasks = state
        .task_store()
        .list()
        .await
        .map_err(|e| internal_error(e.to_string()))?;
    let users = state
        .user_store()
        .list()
        .await
        .map_err(|e| internal_error(e.to_string()))?;
    Ok((tasks, users))
}

/// Fetch a task the viewer is allowed to see, or 404
async fn load_visible_task(
    state: &AppState,
    viewer: &Viewer,
    id: TaskId,
) -> Result<Task, RouteError> {
    let task = state
        .task_store()
        .get(id)
        .await
        .map_err(|e| internal_error(e.to_string()))?
        .ok_or_else(|| not_found(format!("Task {} not found", id)))?;

    let users = state
        .user_store()
        .list()
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    let tasks = std::slice::from_ref(&task);
    if visible_tasks(viewer, tasks, &users).is_empty() {
        return Err(not_found(format!("Task {} not found", id)));
    }
    Ok(task)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/tasks - List tasks visible to the viewer, narrowed by filters
async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<TaskResponse>>, RouteError> {
    let (_, viewer) = load_viewer(&state, &headers).await?;
    let (tasks, users) = load_snapshot(&state).await?;

    // The assignee facet belongs to roles that can assign; employees only
    // ever see their own tasks, so the parameter is dropped for them.
    let assigned_to = match viewer.role {
        Role::Admin | Role::Supervisor => query.assigned_to,
        Role::Employee => None,
    };
    let narrowing = TaskQuery {
        status: query.status,
        priority: query.priority,
        assigned_to,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };

    let visible = narrowing.apply(visible_tasks(&viewer, &tasks, &users));
    Ok(Json(
        visible.into_iter().cloned().map(TaskResponse::from).collect(),
    ))
}

/// GET /api/tasks/stats - Status breakdown of the viewer's visible tasks
async fn task_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TaskStats>, RouteError> {
    let (_, viewer) = load_viewer(&state, &headers).await?;
    let (tasks, users) = load_snapshot(&state).await?;

    let visible = visible_tasks(&viewer, &tasks, &users);
    Ok(Json(TaskStats::summarize(&visible)))
}

/// GET /api/tasks/assignable - Users the viewer may assign tasks to
async fn list_assignable(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserResponse>>, RouteError> {
    let (_, viewer) = load_viewer(&state, &headers).await?;
    let users = state
        .user_store()
        .list()
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    Ok(Json(
        assignable_pool(&viewer, &users)
            .into_iter()
            .cloned()
            .map(UserResponse::from)
            .collect(),
    ))
}

/// POST /api/tasks - Create a task
async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), RouteError> {
    let (_, viewer) = load_viewer(&state, &headers).await?;

    if !can(&viewer, Action::CreateTask) {
        return Err(forbidden("You do not have permission to create tasks"));
    }
    if req.title.trim().is_empty() {
        return Err(bad_request("Title cannot be empty"));
    }

    // Employees never reach this point; admins and supervisors may omit the
    // assignee to self-assign.
    let assigned_to = req.assigned_to.unwrap_or(viewer.id);
    let users = state
        .user_store()
        .list()
        .await
        .map_err(|e| internal_error(e.to_string()))?;
    validate_task_assignment(&viewer, assigned_to, &users)
        .map_err(|e| bad_request(e.to_string()))?;

    let mut task = Task::new(req.title.trim(), assigned_to, viewer.id);
    if let Some(description) = req.description {
        task = task.with_description(description);
    }
    if let Some(priority) = req.priority {
        task = task.with_priority(priority);
    }
    if let Some(due_date) = req.due_date {
        task = task.with_due_date(due_date);
    }
    if let Some(tags) = req.tags {
        task = task.with_tags(tags);
    }

    let task = state
        .task_store()
        .create(task)
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    tracing::info!(task_id = %task.id, assigned_to = %task.assigned_to, "Created task");
    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

/// GET /api/tasks/{id} - Fetch a single visible task
async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<TaskId>,
) -> Result<Json<TaskResponse>, RouteError> {
    let (_, viewer) = load_viewer(&state, &headers).await?;
    let task = load_visible_task(&state, &viewer, id).await?;
    Ok(Json(TaskResponse::from(task)))
}

/// PUT /api/tasks/{id} - Update a task
///
/// A status-only change is allowed to anyone who may move the task (which
/// includes an employee on their own task); any other field requires full
/// edit permission, and reassignment is re-validated.
async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<TaskId>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, RouteError> {
    let (_, viewer) = load_viewer(&state, &headers).await?;
    let mut task = load_visible_task(&state, &viewer, id).await?;

    let allowed = if req.is_status_only() {
        can(&viewer, Action::ChangeStatus(&task))
    } else {
        can(&viewer, Action::EditTask(&task))
    };
    if !allowed {
        return Err(forbidden("You do not have permission to edit this task"));
    }

    if let Some(assigned_to) = req.assigned_to {
        if assigned_to != task.assigned_to {
            let users = state
                .user_store()
                .list()
                .await
                .map_err(|e| internal_error(e.to_string()))?;
            validate_task_assignment(&viewer, assigned_to, &users)
                .map_err(|e| bad_request(e.to_string()))?;
            task.assigned_to = assigned_to;
        }
    }
    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(bad_request("Title cannot be empty"));
        }
        task.title = title;
    }
    if let Some(description) = req.description {
        task.description = description;
    }
    if let Some(status) = req.status {
        task.status = status;
    }
    if let Some(priority) = req.priority {
        task.priority = priority;
    }
    if let Some(due_date) = req.due_date {
        task.due_date = Some(due_date);
    }
    if let Some(tags) = req.tags {
        task.tags = Some(tags);
    }

    let task = state
        .task_store()
        .update(task)
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    tracing::debug!(task_id = %task.id, "Updated task");
    Ok(Json(TaskResponse::from(task)))
}

/// DELETE /api/tasks/{id} - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, RouteError> {
    let (_, viewer) = load_viewer(&state, &headers).await?;
    let task = load_visible_task(&state, &viewer, id).await?;

    if !can(&viewer, Action::DeleteTask(&task)) {
        return Err(forbidden("You do not have permission to delete tasks"));
    }

    state
        .task_store()
        .delete(id)
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    tracing::info!(task_id = %id, "Deleted task");
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/stats", get(task_stats))
        .route("/api/tasks/assignable", get(list_assignable))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
}
