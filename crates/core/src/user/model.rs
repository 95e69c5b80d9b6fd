//! User model definitions

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Strongly typed user identifier
///
/// Ids are compared as values of this type only, so a user id can never be
/// accidentally matched against a task id or a raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| Error::InvalidInput(format!("Invalid user id '{}'", value)))
    }
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Supervisor,
    Employee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Supervisor => "supervisor",
            Self::Employee => "employee",
        }
    }

    /// Whether this role may create tasks at all
    pub fn can_create_tasks(self) -> bool {
        matches!(self, Self::Admin | Self::Supervisor)
    }

    /// Whether this role may open the user-management surface
    pub fn can_manage_users(self) -> bool {
        matches!(self, Self::Admin | Self::Supervisor)
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "supervisor" => Ok(Self::Supervisor),
            "employee" => Ok(Self::Employee),
            _ => Err(Error::InvalidInput(format!(
                "Unsupported role '{}'",
                value
            ))),
        }
    }
}

/// A user account
///
/// `supervisor_id` carries hierarchy information only for employees. The
/// field is ignored on admin and supervisor accounts; the supervisor/employee
/// relation is a two-level forest by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user with the given role
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role,
            is_active: true,
            supervisor_id: None,
            avatar: None,
            created_at: Utc::now(),
        }
    }

    /// Set the supervisor
    pub fn with_supervisor(mut self, supervisor_id: UserId) -> Self {
        self.supervisor_id = Some(supervisor_id);
        self
    }

    /// Mark the account inactive
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user() {
        let user = User::new("ana@example.com", "Ana", "García", Role::Employee);
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.role, Role::Employee);
        assert!(user.is_active);
        assert!(user.supervisor_id.is_none());
        assert_eq!(user.full_name(), "Ana García");
    }

    #[test]
    fn test_user_with_supervisor() {
        let supervisor = User::new("sup@example.com", "Sam", "Lee", Role::Supervisor);
        let user = User::new("emp@example.com", "Eve", "Ng", Role::Employee)
            .with_supervisor(supervisor.id);
        assert_eq!(user.supervisor_id, Some(supervisor.id));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Supervisor ".parse::<Role>().unwrap(), Role::Supervisor);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Admin.can_create_tasks());
        assert!(Role::Supervisor.can_manage_users());
        assert!(!Role::Employee.can_create_tasks());
        assert!(!Role::Employee.can_manage_users());
    }
}
