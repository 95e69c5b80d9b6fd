//! Query narrowing
//!
//! Orthogonal filters applied after role-based visibility. They can only
//! shrink the visible set, never widen it: each filter is a conjunction of
//! exact field matches and case-insensitive substring search.

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskPriority, TaskStatus};
use crate::user::{Role, User, UserId};

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Narrowing filter over an already visibility-scoped task list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl TaskQuery {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.assigned_to.is_none()
            && self.search.is_none()
    }

    /// Whether the task passes every set filter
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(assigned_to) = self.assigned_to {
            if task.assigned_to != assigned_to {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !contains_ci(&task.title, search) && !contains_ci(&task.description, search) {
                return false;
            }
        }
        true
    }

    /// Narrow a visibility-filtered slice
    pub fn apply<'a>(&self, tasks: Vec<&'a Task>) -> Vec<&'a Task> {
        tasks.into_iter().filter(|t| self.matches(t)).collect()
    }
}

/// Supervisor-relation filter for user queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SupervisorFilter {
    /// Employees with no supervisor assigned
    Unassigned,
    /// Users reporting to the given supervisor
    Of(UserId),
}

/// Narrowing filter over an already visibility-scoped user list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor: Option<SupervisorFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl UserQuery {
    /// Whether the user passes every set filter
    pub fn matches(&self, user: &User) -> bool {
        if let Some(role) = self.role {
            if user.role != role {
                return false;
            }
        }
        if let Some(active) = self.active {
            if user.is_active != active {
                return false;
            }
        }
        match self.supervisor {
            Some(SupervisorFilter::Unassigned) => {
                if user.role != Role::Employee || user.supervisor_id.is_some() {
                    return false;
                }
            }
            Some(SupervisorFilter::Of(supervisor_id)) => {
                if user.supervisor_id != Some(supervisor_id) {
                    return false;
                }
            }
            None => {}
        }
        if let Some(search) = &self.search {
            if !contains_ci(&user.first_name, search)
                && !contains_ci(&user.last_name, search)
                && !contains_ci(&user.email, search)
            {
                return false;
            }
        }
        true
    }

    /// Narrow a visibility-filtered slice
    pub fn apply<'a>(&self, users: Vec<&'a User>) -> Vec<&'a User> {
        users.into_iter().filter(|u| self.matches(u)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_search_is_case_insensitive() {
        let id = UserId::new();
        let task = Task::new("Quarterly Report", id, id).with_description("Numbers for Q3");

        let by_title = TaskQuery {
            search: Some("quarterly".to_string()),
            ..Default::default()
        };
        let by_description = TaskQuery {
            search: Some("q3".to_string()),
            ..Default::default()
        };
        let miss = TaskQuery {
            search: Some("payroll".to_string()),
            ..Default::default()
        };

        assert!(by_title.matches(&task));
        assert!(by_description.matches(&task));
        assert!(!miss.matches(&task));
    }

    #[test]
    fn test_task_query_is_conjunctive() {
        let id = UserId::new();
        let task = Task::new("Audit", id, id).with_priority(TaskPriority::High);

        let query = TaskQuery {
            priority: Some(TaskPriority::High),
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };
        assert!(!query.matches(&task));
    }

    #[test]
    fn test_task_query_never_widens() {
        let id = UserId::new();
        let other = UserId::new();
        let tasks = vec![Task::new("a", id, id), Task::new("b", other, other)];
        let visible: Vec<&Task> = tasks.iter().filter(|t| t.assigned_to == id).collect();

        let narrowed = TaskQuery::default().apply(visible.clone());
        assert_eq!(narrowed.len(), visible.len());

        let narrowed = TaskQuery {
            assigned_to: Some(other),
            ..Default::default()
        }
        .apply(visible);
        // The other user's task was outside the visible slice to begin with.
        assert!(narrowed.is_empty());
    }

    #[test]
    fn test_user_search_fields() {
        let user = User::new("maria.lopez@example.com", "María", "López", Role::Employee);

        for term in ["maría", "lópez", "maria.lopez@"] {
            let query = UserQuery {
                search: Some(term.to_string()),
                ..Default::default()
            };
            assert!(query.matches(&user), "expected match on '{term}'");
        }
    }

    #[test]
    fn test_unassigned_filter_only_matches_employees() {
        let unassigned = User::new("e@example.com", "E", "One", Role::Employee);
        let supervisor = User::new("s@example.com", "S", "Two", Role::Supervisor);
        let assigned = User::new("a@example.com", "A", "Three", Role::Employee)
            .with_supervisor(supervisor.id);

        let query = UserQuery {
            supervisor: Some(SupervisorFilter::Unassigned),
            ..Default::default()
        };
        assert!(query.matches(&unassigned));
        assert!(!query.matches(&assigned));
        assert!(!query.matches(&supervisor));
    }

    #[test]
    fn test_supervisor_of_filter() {
        let supervisor = User::new("s@example.com", "S", "Sup", Role::Supervisor);
        let mine = User::new("m@example.com", "M", "Ine", Role::Employee)
            .with_supervisor(supervisor.id);
        let other = User::new("o@example.com", "O", "Ther", Role::Employee)
            .with_supervisor(UserId::new());

        let query = UserQuery {
            supervisor: Some(SupervisorFilter::Of(supervisor.id)),
            ..Default::default()
        };
        assert!(query.matches(&mine));
        assert!(!query.matches(&other));
    }

    #[test]
    fn test_active_filter() {
        let active = User::new("a@example.com", "A", "User", Role::Employee);
        let inactive = User::new("i@example.com", "I", "User", Role::Employee).deactivated();

        let query = UserQuery {
            active: Some(false),
            ..Default::default()
        };
        assert!(!query.matches(&active));
        assert!(query.matches(&inactive));
    }
}
