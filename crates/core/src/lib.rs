//! Core library for TeamTasks
//!
//! This crate contains the core business logic, including:
//! - User and task models with file-backed stores
//! - Role-scoped visibility and permission rules
//! - Supervisor assignment rules
//! - Dashboard summaries

pub mod access;
pub mod error;
pub mod stats;
pub mod task;
pub mod user;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
