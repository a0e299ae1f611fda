//! Error types for Atelier

use thiserror::Error;

/// Result type alias using Atelier's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Atelier error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Entity errors (E001-E099)
    #[error("Project {0} not found. Run `atelier projects list` to see all projects.")]
    ProjectNotFound(i64),

    #[error("Contact {0} not found. Run `atelier contacts list` to see all contacts.")]
    ContactNotFound(i64),

    #[error("Stage '{0}' not found. Run `atelier stages list` to see all stages.")]
    StageNotFound(String),

    #[error("Task {0} not found.")]
    TaskNotFound(i64),

    #[error("Role assignment {0} not found.")]
    RoleNotFound(i64),

    // Validation errors (E100-E199)
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown role '{0}'. Valid roles: Customer, Inspector, Constructor, Consultant.")]
    InvalidRole(String),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // User errors (E700-E799)
    #[error("User cancelled operation")]
    UserCancelled,

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProjectNotFound(_) => "E001",
            Self::ContactNotFound(_) => "E002",
            Self::StageNotFound(_) => "E003",
            Self::TaskNotFound(_) => "E004",
            Self::RoleNotFound(_) => "E005",
            Self::Validation(_) => "E100",
            Self::InvalidRole(_) => "E101",
            Self::DatabaseError(_) => "E400",
            Self::ConfigError(_) => "E600",
            Self::UserCancelled => "E700",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::ProjectNotFound(_) => Some("atelier projects list".to_string()),
            Self::ContactNotFound(_) => Some("atelier contacts list".to_string()),
            Self::StageNotFound(_) => Some("atelier stages list".to_string()),
            Self::RoleNotFound(_) => Some("atelier roles list <project-id>".to_string()),
            Self::ConfigError(_) => Some("atelier config list".to_string()),
            Self::DatabaseError(_) => Some("atelier doctor".to_string()),
            _ => None,
        }
    }

    /// Whether this error is a business-rule rejection rather than a failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidRole(_))
    }
}
