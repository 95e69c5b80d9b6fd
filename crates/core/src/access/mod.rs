//! Role-scoped access rules
//!
//! Pure, synchronous decision logic: given the current viewer and a
//! consistent snapshot of the user/task collections, these functions decide
//! what the viewer may see, which actions they may take, and which
//! assignment targets are valid. Nothing in this module performs I/O or
//! mutates state; callers supply the snapshots and dispatch the mutations.
//!
//! These checks run server-side in front of every store operation, but they
//! are written so a client could evaluate the same rules for rendering.

mod assignment;
mod permission;
mod query;
mod visibility;

pub use assignment::{
    assignable_pool, eligible_supervisors, validate_supervisor_change, validate_task_assignment,
    AssignmentError,
};
pub use permission::{can, Action};
pub use query::{SupervisorFilter, TaskQuery, UserQuery};
pub use visibility::{team_member_ids, visible_tasks, visible_users};

use serde::{Deserialize, Serialize};

use crate::user::{Role, User, UserId};

/// The authenticated principal every access decision is made for
///
/// Built from the authenticated user and passed explicitly; the access
/// functions never consult ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: UserId,
    pub role: Role,
}

impl Viewer {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }
}

impl From<&User> for Viewer {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
        }
    }
}
