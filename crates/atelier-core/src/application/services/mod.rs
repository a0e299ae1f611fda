//! Application services

pub mod contact_service;
pub mod project_service;

pub use contact_service::ContactService;
pub use project_service::ProjectService;
