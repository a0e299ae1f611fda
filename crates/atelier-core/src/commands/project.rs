//! Project management commands
//!
//! Provides CRUD operations for architecture projects.

use crate::Result;
use crate::storage::Database;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// An architecture project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Row identifier
    pub id: i64,
    /// Site address or plot description
    pub location: String,
    /// Start date as entered (usually `YYYY-MM-DD`)
    pub start_date: String,
    /// End date, only meaningful once the project is inactive
    pub end_date: Option<String>,
    /// Whether the project is still running
    pub active: bool,
    /// Current workflow stage
    pub stage_id: Option<i64>,
    /// Path of the project's reference document
    pub document_path: String,
}

/// Field values for a project that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewProject {
    pub location: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub active: bool,
    pub stage_id: Option<i64>,
    pub document_path: String,
}

impl NewProject {
    /// Create an active project at the given location
    pub fn new(location: impl Into<String>, start_date: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            start_date: start_date.into(),
            active: true,
            ..Default::default()
        }
    }

    /// Mark the project finished on the given date
    pub fn finished(mut self, end_date: impl Into<String>) -> Self {
        self.active = false;
        self.end_date = Some(end_date.into());
        self
    }

    /// Set the workflow stage
    pub fn with_stage(mut self, stage_id: i64) -> Self {
        self.stage_id = Some(stage_id);
        self
    }

    /// Set the document path
    pub fn with_document(mut self, path: impl Into<String>) -> Self {
        self.document_path = path.into();
        self
    }

    /// Attach an identifier, producing a stored project
    pub fn into_project(self, id: i64) -> Project {
        Project {
            id,
            location: self.location,
            start_date: self.start_date,
            end_date: self.end_date,
            active: self.active,
            stage_id: self.stage_id,
            document_path: self.document_path,
        }
    }
}

/// Database row for the projects table. Columns are nullable in databases
/// created by the desktop tool, so everything is optional here.
#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: i64,
    location: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    active: Option<bool>,
    stage_id: Option<i64>,
    document_path: Option<String>,
}

impl ProjectRow {
    fn into_project(self) -> Project {
        Project {
            id: self.id,
            location: self.location.unwrap_or_default(),
            start_date: self.start_date.unwrap_or_default(),
            end_date: self.end_date.filter(|d| !d.is_empty()),
            active: self.active.unwrap_or(false),
            stage_id: self.stage_id,
            document_path: self.document_path.unwrap_or_default(),
        }
    }
}

const SELECT_PROJECT: &str =
    "SELECT id, location, start_date, end_date, active, stage_id, document_path FROM projects";

/// Project repository for database operations
pub struct ProjectRepository<'a> {
    db: &'a Database,
}

impl<'a> ProjectRepository<'a> {
    /// Create a new project repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a project and return its identifier
    pub async fn create(&self, project: &NewProject) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO projects (location, start_date, end_date, active, stage_id, document_path)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&project.location)
        .bind(&project.start_date)
        .bind(&project.end_date)
        .bind(project.active)
        .bind(project.stage_id)
        .bind(&project.document_path)
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        info!(project_id = id, location = %project.location, "Project created");
        Ok(id)
    }

    /// Get a project by ID
    pub async fn get(&self, id: i64) -> Result<Option<Project>> {
        let row: Option<ProjectRow> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_PROJECT))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(ProjectRow::into_project))
    }

    /// List projects in insertion order.
    ///
    /// `search` matches a substring of the location; an empty string matches
    /// everything. `active_only` drops finished projects.
    pub async fn list(&self, search: &str, active_only: bool) -> Result<Vec<Project>> {
        let rows: Vec<ProjectRow> = sqlx::query_as(&format!(
            "{} WHERE (? = '' OR location LIKE '%' || ? || '%') AND (? = 0 OR active = 1) ORDER BY id",
            SELECT_PROJECT
        ))
        .bind(search)
        .bind(search)
        .bind(active_only)
        .fetch_all(self.db.pool())
        .await?;

        debug!(count = rows.len(), search = %search, active_only, "Listed projects");
        Ok(rows.into_iter().map(ProjectRow::into_project).collect())
    }

    /// Update every stored field of a project
    pub async fn update(&self, project: &Project) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE projects
            SET location = ?, start_date = ?, end_date = ?, active = ?, stage_id = ?, document_path = ?
            WHERE id = ?
            "#,
        )
        .bind(&project.location)
        .bind(&project.start_date)
        .bind(&project.end_date)
        .bind(project.active)
        .bind(project.stage_id)
        .bind(&project.document_path)
        .bind(project.id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace only the document path
    pub async fn set_document_path(&self, id: i64, path: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE projects SET document_path = ? WHERE id = ?")
            .bind(path)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a project together with its role assignments and task progress.
    ///
    /// Dependent rows go first so the foreign keys never dangle.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        let roles = sqlx::query("DELETE FROM project_roles WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let progress = sqlx::query("DELETE FROM project_stage_tasks WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        tx.commit().await?;

        if deleted {
            info!(project_id = id, roles, progress, "Project deleted");
        }
        Ok(deleted)
    }

    /// Check if a project exists
    pub async fn exists(&self, id: i64) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.is_some())
    }
}
