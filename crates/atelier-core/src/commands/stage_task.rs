//! Per-project task completion
//!
//! Rows are sparse: one appears the first time a task is toggled for a
//! project, and a missing row reads as "not done".

use crate::Result;
use crate::storage::Database;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Completion record of one task on one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStageTask {
    pub id: i64,
    pub project_id: i64,
    pub task_id: i64,
    pub is_done: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectStageTaskRow {
    id: i64,
    project_id: i64,
    task_id: i64,
    is_done: Option<bool>,
}

impl From<ProjectStageTaskRow> for ProjectStageTask {
    fn from(row: ProjectStageTaskRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            task_id: row.task_id,
            is_done: row.is_done.unwrap_or(false),
        }
    }
}

/// Whether `set_done` touched an existing row or created one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Inserted(i64),
    Updated(i64),
}

impl Toggle {
    pub fn row_id(&self) -> i64 {
        match self {
            Toggle::Inserted(id) | Toggle::Updated(id) => *id,
        }
    }
}

/// Task progress repository for database operations
pub struct ProjectStageTaskRepository<'a> {
    db: &'a Database,
}

impl<'a> ProjectStageTaskRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All progress rows of a project, in insertion order
    pub async fn list_by_project(&self, project_id: i64) -> Result<Vec<ProjectStageTask>> {
        let rows: Vec<ProjectStageTaskRow> = sqlx::query_as(
            "SELECT id, project_id, task_id, is_done FROM project_stage_tasks WHERE project_id = ? ORDER BY id",
        )
        .bind(project_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows.into_iter().map(ProjectStageTask::from).collect())
    }

    /// The progress row for (project, task), if any
    pub async fn find(&self, project_id: i64, task_id: i64) -> Result<Option<ProjectStageTask>> {
        let row: Option<ProjectStageTaskRow> = sqlx::query_as(
            "SELECT id, project_id, task_id, is_done FROM project_stage_tasks WHERE project_id = ? AND task_id = ?",
        )
        .bind(project_id)
        .bind(task_id)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(row.map(ProjectStageTask::from))
    }

    /// Set the flag of an existing row by its id
    pub async fn set_done_by_id(&self, id: i64, is_done: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE project_stage_tasks SET is_done = ? WHERE id = ?")
            .bind(is_done)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Update the (project, task) row if present, insert it otherwise.
    ///
    /// The lookup and the write share one transaction.
    pub async fn set_done(&self, project_id: i64, task_id: i64, is_done: bool) -> Result<Toggle> {
        let mut tx = self.db.pool().begin().await?;

        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM project_stage_tasks WHERE project_id = ? AND task_id = ?",
        )
        .bind(project_id)
        .bind(task_id)
        .fetch_optional(&mut *tx)
        .await?;

        let toggle = match existing {
            Some((id,)) => {
                sqlx::query("UPDATE project_stage_tasks SET is_done = ? WHERE id = ?")
                    .bind(is_done)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                Toggle::Updated(id)
            }
            None => {
                let id = sqlx::query(
                    "INSERT INTO project_stage_tasks (project_id, task_id, is_done) VALUES (?, ?, ?)",
                )
                .bind(project_id)
                .bind(task_id)
                .bind(is_done)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();
                Toggle::Inserted(id)
            }
        };

        tx.commit().await?;
        debug!(project_id, task_id, is_done, ?toggle, "Task progress saved");
        Ok(toggle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::project::{NewProject, ProjectRepository};

    async fn setup() -> (Database, i64) {
        let db = Database::in_memory().await.unwrap();
        let project = ProjectRepository::new(&db)
            .create(&NewProject::new("Safed", "2024-01-01"))
            .await
            .unwrap();
        (db, project)
    }

    #[tokio::test]
    async fn test_set_done_inserts_then_updates() {
        let (db, project) = setup().await;
        let repo = ProjectStageTaskRepository::new(&db);

        let first = repo.set_done(project, 2, true).await.unwrap();
        assert!(matches!(first, Toggle::Inserted(_)));

        let second = repo.set_done(project, 2, false).await.unwrap();
        assert_eq!(second, Toggle::Updated(first.row_id()));

        let rows = repo.list_by_project(project).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_done);
    }

    #[tokio::test]
    async fn test_find_and_set_done_by_id() {
        let (db, project) = setup().await;
        let repo = ProjectStageTaskRepository::new(&db);

        assert!(repo.find(project, 3).await.unwrap().is_none());
        let id = repo.set_done(project, 3, false).await.unwrap().row_id();

        assert!(repo.set_done_by_id(id, true).await.unwrap());
        let row = repo.find(project, 3).await.unwrap().expect("row exists");
        assert!(row.is_done);
        assert_eq!(row.id, id);

        assert!(!repo.set_done_by_id(id + 100, true).await.unwrap());
    }
}
