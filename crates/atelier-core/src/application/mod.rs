//! Application layer
//!
//! Orchestration over the repositories: validation, view assembly, forms
//! and document selection.

pub mod forms;
pub mod picker;
pub mod services;
pub mod validators;
pub mod views;

pub use forms::{ContactForm, ProjectForm};
pub use picker::{DocumentPicker, FixedPath};
pub use services::{ContactService, ProjectService};
pub use validators::ProjectValidator;
pub use views::{
    CONTACT_FIELDS, Field, LinkedProject, PROJECT_FIELDS, ProjectView, RoleSlot, RoleSlots,
    TASK_FIELDS, TaskView, field_labels, project_display_name, row_values, sort_by_field,
};
