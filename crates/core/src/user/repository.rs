//! User repository trait
//!
//! Defines the interface for user storage operations.

use async_trait::async_trait;

use super::model::{User, UserId};
use crate::Result;

/// Repository interface for user CRUD operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: User) -> Result<User>;

    /// Get a user by ID
    async fn get(&self, id: UserId) -> Result<Option<User>>;

    /// Get all users
    async fn list(&self) -> Result<Vec<User>>;

    /// Update an existing user
    async fn update(&self, user: User) -> Result<User>;

    /// Delete a user by ID
    async fn delete(&self, id: UserId) -> Result<bool>;

    /// Find a user by email (exact, case-insensitive)
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}
