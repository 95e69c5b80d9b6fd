//! Assignment consistency rules
//!
//! Governs who may appear in "assign to" pickers and validates
//! assignment-changing mutations before they reach the store. A supervisor's
//! assignable pool is exactly their team; admins may assign to anyone.
//! The supervisor relation is a two-level forest: `supervisor_id` only ever
//! points from an employee to a supervisor, so no cycle detection is needed,
//! only edge validation.

use thiserror::Error;

use super::{team_member_ids, Viewer};
use crate::user::{Role, User, UserId};

/// Why an assignment mutation was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("Not authorized to change assignments")]
    NotAuthorized,

    #[error("Supervisor can only be assigned to employees")]
    NotAnEmployee,

    #[error("Supervisor {0} does not exist")]
    SupervisorNotFound(UserId),

    #[error("User {0} is not a supervisor")]
    NotASupervisor(UserId),

    #[error("Supervisor {0} is inactive")]
    SupervisorInactive(UserId),

    #[error("Assignee {0} does not exist")]
    AssigneeNotFound(UserId),

    #[error("Assignee {0} is inactive")]
    AssigneeInactive(UserId),

    #[error("Assignee {0} is outside the viewer's assignable pool")]
    AssigneeOutOfScope(UserId),
}

/// Users the viewer may set as a task's assignee
///
/// - admin: everyone
/// - supervisor: their own team
/// - employee: nobody (their own tasks default to themself)
pub fn assignable_pool<'a>(viewer: &Viewer, users: &'a [User]) -> Vec<&'a User> {
    match viewer.role {
        Role::Admin => users.iter().collect(),
        Role::Supervisor => users
            .iter()
            .filter(|u| u.supervisor_id == Some(viewer.id))
            .collect(),
        Role::Employee => Vec::new(),
    }
}

/// Valid targets for a supervisor assignment: active supervisors only
pub fn eligible_supervisors(users: &[User]) -> Vec<&User> {
    users
        .iter()
        .filter(|u| u.role == Role::Supervisor && u.is_active)
        .collect()
}

/// Validate changing an employee's supervisor
///
/// Admin only. `None` unassigns; `Some(id)` must resolve to an existing,
/// active user with role supervisor. Anything else would create an invalid
/// edge in the supervisor forest and is rejected before any mutation.
pub fn validate_supervisor_change(
    viewer: &Viewer,
    employee: &User,
    new_supervisor_id: Option<UserId>,
    users: &[User],
) -> Result<(), AssignmentError> {
    if viewer.role != Role::Admin {
        return Err(AssignmentError::NotAuthorized);
    }
    if employee.role != Role::Employee {
        return Err(AssignmentError::NotAnEmployee);
    }

    let Some(supervisor_id) = new_supervisor_id else {
        return Ok(());
    };

    let target = users
        .iter()
        .find(|u| u.id == supervisor_id)
        .ok_or(AssignmentError::SupervisorNotFound(supervisor_id))?;
    if target.role != Role::Supervisor {
        return Err(AssignmentError::NotASupervisor(supervisor_id));
    }
    if !target.is_active {
        return Err(AssignmentError::SupervisorInactive(supervisor_id));
    }
    Ok(())
}

/// Validate a task's assignee at creation or reassignment
///
/// The assignee must exist, be active, and fall inside the viewer's
/// assignable pool. Employees may only self-assign (their own tasks default
/// to themself). Deactivating a user later does not retroactively touch
/// tasks already assigned to them; this check applies at mutation time only.
pub fn validate_task_assignment(
    viewer: &Viewer,
    assignee_id: UserId,
    users: &[User],
) -> Result<(), AssignmentError> {
    let assignee = users
        .iter()
        .find(|u| u.id == assignee_id)
        .ok_or(AssignmentError::AssigneeNotFound(assignee_id))?;
    if !assignee.is_active {
        return Err(AssignmentError::AssigneeInactive(assignee_id));
    }

    let in_scope = match viewer.role {
        Role::Admin => true,
        Role::Supervisor => {
            assignee_id == viewer.id || team_member_ids(viewer.id, users).contains(&assignee_id)
        }
        Role::Employee => assignee_id == viewer.id,
    };
    if !in_scope {
        return Err(AssignmentError::AssigneeOutOfScope(assignee_id));
    }
    Ok(())
}
