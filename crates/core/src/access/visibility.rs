//! Visibility filters
//!
//! Scope a task or user collection down to what the viewer may see. Each
//! rule names its roles explicitly; no role falls through to a default.

use std::collections::HashSet;

use super::Viewer;
use crate::task::Task;
use crate::user::{Role, User, UserId};

/// Ids of the employees reporting to the given supervisor
///
/// The team relation is derived from the snapshot on every call, never
/// cached, so it is exactly as fresh as the caller's user collection.
pub fn team_member_ids(supervisor_id: UserId, users: &[User]) -> HashSet<UserId> {
    users
        .iter()
        .filter(|u| u.supervisor_id == Some(supervisor_id))
        .map(|u| u.id)
        .collect()
}

/// Tasks the viewer may see
///
/// - admin: every task
/// - supervisor: tasks they assigned, tasks assigned to them, and tasks
///   assigned to anyone on their team (the union of the three)
/// - employee: only tasks assigned to them
pub fn visible_tasks<'a>(viewer: &Viewer, tasks: &'a [Task], users: &[User]) -> Vec<&'a Task> {
    match viewer.role {
        Role::Admin => tasks.iter().collect(),
        Role::Supervisor => {
            let team_ids = team_member_ids(viewer.id, users);
            tasks
                .iter()
                .filter(|t| {
                    t.assigned_by == viewer.id
                        || t.assigned_to == viewer.id
                        || team_ids.contains(&t.assigned_to)
                })
                .collect()
        }
        Role::Employee => tasks.iter().filter(|t| t.assigned_to == viewer.id).collect(),
    }
}

/// Users the viewer may see on the user-management surface
///
/// - admin: everyone
/// - supervisor: other supervisors, their own team, and themself; never
///   admins or employees outside the team
/// - employee: nobody (the surface is denied outright, see `Action::ManageUsers`)
pub fn visible_users<'a>(viewer: &Viewer, users: &'a [User]) -> Vec<&'a User> {
    match viewer.role {
        Role::Admin => users.iter().collect(),
        Role::Supervisor => users
            .iter()
            .filter(|u| {
                u.role == Role::Supervisor
                    || u.supervisor_id == Some(viewer.id)
                    || u.id == viewer.id
            })
            .collect(),
        Role::Employee => Vec::new(),
    }
}
