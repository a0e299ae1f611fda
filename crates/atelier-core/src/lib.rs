//! Atelier Core Library
//!
//! This crate provides the core functionality for Atelier, including:
//! - Storage (SQLite schema, migrations, reference-data seeding)
//! - Repositories for projects, contacts, stages, tasks, roles and task progress
//! - Project views, role slots and checklist assembly
//! - Configuration and error types

pub mod application;
pub mod commands;
pub mod config;
pub mod error;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::application::{ProjectService, ProjectView, RoleSlots, TaskView};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::storage::Database;
}
