//! Storage layer - SQLite
//!
//! Provides database management, migrations and reference data for atelier.
//!
//! # Architecture
//!
//! - `database`: Connection pool management and initialization
//! - `migrations`: Schema versioning and automatic migration
//! - `seed`: Workflow stages and their fixed checklist tasks
//!
//! # Usage
//!
//! ```ignore
//! use atelier_core::storage::Database;
//!
//! // Create an in-memory database for testing
//! let db = Database::in_memory().await?;
//!
//! // Or open the file-backed store
//! let db = Database::open("projects.db").await?;
//! ```

pub mod database;
pub mod migrations;
pub mod seed;

pub use database::{Database, DatabaseConfig, default_database_path};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
pub use seed::{STAGE_TASKS, SeedResult, seed_reference_data};
