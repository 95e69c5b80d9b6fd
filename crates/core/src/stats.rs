//! Dashboard summaries
//!
//! Pure count aggregations over collection snapshots. Task summaries are
//! computed over a visibility-filtered slice, so each role's dashboard
//! reflects only what that role can see.

use serde::Serialize;

use crate::task::{Task, TaskStatus};
use crate::user::{Role, User};

/// Status breakdown of a task slice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
}

impl TaskStats {
    pub fn summarize(tasks: &[&Task]) -> Self {
        let mut stats = Self {
            total: tasks.len(),
            ..Default::default()
        };
        for task in tasks {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }
}

/// Role and activity breakdown of the user collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub admins: usize,
    pub supervisors: usize,
    pub employees: usize,
    /// Employees without a supervisor, flagged for assignment
    pub unassigned_employees: usize,
}

impl UserStats {
    pub fn summarize(users: &[&User]) -> Self {
        let mut stats = Self {
            total: users.len(),
            ..Default::default()
        };
        for user in users {
            if user.is_active {
                stats.active += 1;
            } else {
                stats.inactive += 1;
            }
            match user.role {
                Role::Admin => stats.admins += 1,
                Role::Supervisor => stats.supervisors += 1,
                Role::Employee => {
                    stats.employees += 1;
                    if user.supervisor_id.is_none() {
                        stats.unassigned_employees += 1;
                    }
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::UserId;

    #[test]
    fn test_task_stats() {
        let id = UserId::new();
        let tasks = vec![
            Task::new("a", id, id),
            Task::new("b", id, id).with_status(TaskStatus::InProgress),
            Task::new("c", id, id).with_status(TaskStatus::Completed),
            Task::new("d", id, id).with_status(TaskStatus::Completed),
        ];
        let refs: Vec<&Task> = tasks.iter().collect();

        let stats = TaskStats::summarize(&refs);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.cancelled, 0);
    }

    #[test]
    fn test_user_stats() {
        let supervisor = User::new("s@example.com", "S", "Sup", Role::Supervisor);
        let users = vec![
            User::new("a@example.com", "A", "Admin", Role::Admin),
            supervisor.clone(),
            User::new("e1@example.com", "E", "One", Role::Employee)
                .with_supervisor(supervisor.id),
            User::new("e2@example.com", "E", "Two", Role::Employee),
            User::new("e3@example.com", "E", "Three", Role::Employee).deactivated(),
        ];
        let refs: Vec<&User> = users.iter().collect();

        let stats = UserStats::summarize(&refs);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.active, 4);
        assert_eq!(stats.inactive, 1);
        assert_eq!(stats.admins, 1);
        assert_eq!(stats.supervisors, 1);
        assert_eq!(stats.employees, 3);
        assert_eq!(stats.unassigned_employees, 2);
    }
}
