//! Repositories, one per table
//!
//! Each module owns its entity type and translates operations to
//! parameterized SQL against the shared [`Database`](crate::storage::Database).

pub mod contact;
pub mod project;
pub mod role;
pub mod stage;
pub mod stage_task;
pub mod task;

pub use contact::{Contact, ContactRepository, NewContact};
pub use project::{NewProject, Project, ProjectRepository};
pub use role::{ProjectRole, ProjectRoleRepository, Role};
pub use stage::{Stage, StageRepository};
pub use stage_task::{ProjectStageTask, ProjectStageTaskRepository, Toggle};
pub use task::{Task, TaskRepository};
