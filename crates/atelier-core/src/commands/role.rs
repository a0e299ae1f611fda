//! Project role assignments
//!
//! Links contacts to projects under one of four roles. Listings always come
//! back in insertion order because the "Customer 1"/"Customer 2" slots are
//! derived from that order.

use crate::storage::Database;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Role a contact plays on a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Customer,
    Inspector,
    Constructor,
    Consultant,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Customer,
        Role::Inspector,
        Role::Constructor,
        Role::Consultant,
    ];

    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Inspector => "Inspector",
            Role::Constructor => "Constructor",
            Role::Consultant => "Consultant",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Customer" => Some(Role::Customer),
            "Inspector" => Some(Role::Inspector),
            "Constructor" => Some(Role::Constructor),
            "Consultant" => Some(Role::Consultant),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    /// Case-insensitive parse for user input
    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidRole(s.to_string()))
    }
}

/// A contact assigned to a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRole {
    pub id: i64,
    pub project_id: i64,
    pub contact_id: i64,
    pub role: Role,
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectRoleRow {
    id: i64,
    project_id: Option<i64>,
    contact_id: Option<i64>,
    role: Option<String>,
}

impl ProjectRoleRow {
    fn into_project_role(self) -> Option<ProjectRole> {
        let role = self.role.as_deref().and_then(Role::parse);
        match (self.project_id, self.contact_id, role) {
            (Some(project_id), Some(contact_id), Some(role)) => Some(ProjectRole {
                id: self.id,
                project_id,
                contact_id,
                role,
            }),
            _ => {
                warn!(role_id = self.id, "Skipping incomplete role assignment");
                None
            }
        }
    }
}

const SELECT_ROLE: &str = "SELECT id, project_id, contact_id, role FROM project_roles";

/// Role assignment repository for database operations
pub struct ProjectRoleRepository<'a> {
    db: &'a Database,
}

impl<'a> ProjectRoleRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Assignments for a project, in insertion order
    pub async fn list_by_project(&self, project_id: i64) -> Result<Vec<ProjectRole>> {
        let rows: Vec<ProjectRoleRow> =
            sqlx::query_as(&format!("{} WHERE project_id = ? ORDER BY id", SELECT_ROLE))
                .bind(project_id)
                .fetch_all(self.db.pool())
                .await?;
        Ok(rows.into_iter().filter_map(ProjectRoleRow::into_project_role).collect())
    }

    /// Assignments held by a contact across all projects, in insertion order
    pub async fn list_by_contact(&self, contact_id: i64) -> Result<Vec<ProjectRole>> {
        let rows: Vec<ProjectRoleRow> =
            sqlx::query_as(&format!("{} WHERE contact_id = ? ORDER BY id", SELECT_ROLE))
                .bind(contact_id)
                .fetch_all(self.db.pool())
                .await?;
        Ok(rows.into_iter().filter_map(ProjectRoleRow::into_project_role).collect())
    }

    pub async fn get(&self, id: i64) -> Result<Option<ProjectRole>> {
        let row: Option<ProjectRoleRow> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_ROLE))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.and_then(ProjectRoleRow::into_project_role))
    }

    /// Assign a contact to a project
    pub async fn add(&self, project_id: i64, contact_id: i64, role: Role) -> Result<i64> {
        let id = sqlx::query("INSERT INTO project_roles (project_id, contact_id, role) VALUES (?, ?, ?)")
            .bind(project_id)
            .bind(contact_id)
            .bind(role.as_str())
            .execute(self.db.pool())
            .await?
            .last_insert_rowid();

        info!(project_id, contact_id, role = %role, role_id = id, "Role assigned");
        Ok(id)
    }

    /// Remove one assignment by its row id
    pub async fn remove(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM project_roles WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace every assignment of a project with the given ones, keeping
    /// their order
    pub async fn replace_all(&self, project_id: i64, assignments: &[(i64, Role)]) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;

        sqlx::query("DELETE FROM project_roles WHERE project_id = ?")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        for (contact_id, role) in assignments {
            sqlx::query("INSERT INTO project_roles (project_id, contact_id, role) VALUES (?, ?, ?)")
                .bind(project_id)
                .bind(*contact_id)
                .bind(role.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!(project_id, count = assignments.len(), "Role assignments replaced");
        Ok(())
    }
}
