//! Checklist tasks
//!
//! Each stage owns a fixed list of tasks shared by every project.

use crate::Result;
use crate::storage::Database;
use serde::{Deserialize, Serialize};

/// A checklist item belonging to a stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub stage_id: i64,
    pub description: String,
}

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: i64,
    stage_id: Option<i64>,
    description: String,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            stage_id: row.stage_id.unwrap_or_default(),
            description: row.description,
        }
    }
}

/// Task repository for database operations
pub struct TaskRepository<'a> {
    db: &'a Database,
}

impl<'a> TaskRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Tasks of one stage, in seeded order
    pub async fn list_by_stage(&self, stage_id: i64) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> =
            sqlx::query_as("SELECT id, stage_id, description FROM tasks WHERE stage_id = ? ORDER BY id")
                .bind(stage_id)
                .fetch_all(self.db.pool())
                .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Task>> {
        let row: Option<TaskRow> =
            sqlx::query_as("SELECT id, stage_id, description FROM tasks WHERE id = ?")
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;
        Ok(row.map(Task::from))
    }
}
