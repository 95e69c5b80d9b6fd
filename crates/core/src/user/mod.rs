//! User module
//!
//! This module contains user-related types and logic.

mod file_store;
mod model;
mod repository;

pub use file_store::FileUserStore;
pub use model::*;
pub use repository::UserRepository;
