//! Permission evaluator
//!
//! A single `can(viewer, action)` predicate over the action table. Pure and
//! non-throwing: an unauthorized action is simply `false`, and the caller
//! decides whether that means hiding a control or rejecting a request.

use super::Viewer;
use crate::task::Task;
use crate::user::{Role, User};

/// An action together with the entity it targets
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    /// Create a task
    CreateTask,
    /// Set a task's assignee to the given user
    AssignTask { assignee: &'a User },
    /// Edit any field of the task
    EditTask(&'a Task),
    /// Delete the task
    DeleteTask(&'a Task),
    /// Change only the task's status
    ChangeStatus(&'a Task),
    /// Open the user-management surface
    ManageUsers,
    /// Edit the user's account
    EditUser(&'a User),
    /// Delete the user's account
    DeleteUser(&'a User),
    /// Change the user's supervisor
    AssignSupervisor(&'a User),
}

/// Whether the viewer may perform the action
///
/// Rules are matched per role with no fallthrough; supervisor capabilities
/// are a different shape from admin's, not a subset.
pub fn can(viewer: &Viewer, action: Action<'_>) -> bool {
    match action {
        Action::CreateTask => viewer.role.can_create_tasks(),
        Action::AssignTask { assignee } => match viewer.role {
            Role::Admin => true,
            Role::Supervisor => {
                assignee.id == viewer.id || assignee.supervisor_id == Some(viewer.id)
            }
            Role::Employee => false,
        },
        Action::EditTask(task) => match viewer.role {
            Role::Admin | Role::Supervisor => true,
            Role::Employee => task.assigned_to == viewer.id,
        },
        Action::DeleteTask(_) => matches!(viewer.role, Role::Admin | Role::Supervisor),
        Action::ChangeStatus(task) => match viewer.role {
            Role::Admin | Role::Supervisor => true,
            Role::Employee => task.assigned_to == viewer.id,
        },
        Action::ManageUsers => viewer.role.can_manage_users(),
        Action::EditUser(user) => viewer.role == Role::Admin && user.id != viewer.id,
        Action::DeleteUser(_) => viewer.role == Role::Admin,
        Action::AssignSupervisor(_) => viewer.role == Role::Admin,
    }
}
