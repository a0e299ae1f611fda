//! Workflow stages
//!
//! Stages are seeded reference data; only read operations are exposed.

use crate::Result;
use crate::storage::Database;
use serde::{Deserialize, Serialize};

/// One step in the architecture workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Stage {
    pub id: i64,
    pub name: String,
}

/// Stage repository for database operations
pub struct StageRepository<'a> {
    db: &'a Database,
}

impl<'a> StageRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All stages in workflow order
    pub async fn list(&self) -> Result<Vec<Stage>> {
        let stages = sqlx::query_as("SELECT id, name FROM stages ORDER BY id")
            .fetch_all(self.db.pool())
            .await?;
        Ok(stages)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Stage>> {
        let stage = sqlx::query_as("SELECT id, name FROM stages WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(stage)
    }

    /// Look a stage up by its exact name
    pub async fn get_by_name(&self, name: &str) -> Result<Option<Stage>> {
        let stage = sqlx::query_as("SELECT id, name FROM stages WHERE name = ?")
            .bind(name)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_stages_in_workflow_order() {
        let db = Database::in_memory().await.unwrap();
        let stages = StageRepository::new(&db).list().await.unwrap();

        let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Project Definition",
                "Planning Information",
                "Design",
                "Garmoshka",
                "Building approval pre-check",
                "Pikud Haoref",
                "Techen",
                "Final Approval",
            ]
        );
    }

    #[tokio::test]
    async fn test_get_stage_by_id_and_name() {
        let db = Database::in_memory().await.unwrap();
        let repo = StageRepository::new(&db);

        let techen = repo.get_by_name("Techen").await.unwrap().expect("seeded");
        assert_eq!(repo.get(techen.id).await.unwrap(), Some(techen));

        assert!(repo.get_by_name("techen").await.unwrap().is_none());
        assert!(repo.get(1000).await.unwrap().is_none());
    }
}
