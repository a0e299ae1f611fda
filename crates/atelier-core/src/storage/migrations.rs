//! Database migrations
//!
//! This module manages the SQLite schema for atelier.
//! Migrations are versioned and applied automatically on database connection.
//! Every statement uses `IF NOT EXISTS` so databases created by earlier
//! releases of the desktop tool are adopted without data loss.

use sqlx::SqlitePool;

/// Current schema version
pub const CURRENT_VERSION: i32 = 2;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: Initial schema
const MIGRATION_V1: &str = r#"
    -- Workflow stages (seeded, read-only in normal operation)
    CREATE TABLE IF NOT EXISTS stages (
        id INTEGER PRIMARY KEY,
        name TEXT UNIQUE NOT NULL
    );

    -- Projects table
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY,
        location TEXT,
        start_date DATE,
        end_date DATE,
        active BOOLEAN,
        stage_id INTEGER,
        document_path TEXT,
        FOREIGN KEY (stage_id) REFERENCES stages(id)
    );

    CREATE INDEX IF NOT EXISTS idx_projects_active ON projects(active);

    -- Contacts table
    CREATE TABLE IF NOT EXISTS contacts (
        id INTEGER PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        phone TEXT,
        email TEXT,
        address TEXT
    );

    -- Checklist tasks per stage (seeded)
    CREATE TABLE IF NOT EXISTS tasks (
        id INTEGER PRIMARY KEY,
        stage_id INTEGER,
        description TEXT NOT NULL,
        FOREIGN KEY (stage_id) REFERENCES stages(id)
    );

    CREATE INDEX IF NOT EXISTS idx_tasks_stage_id ON tasks(stage_id);

    -- Contact assignments to project roles
    CREATE TABLE IF NOT EXISTS project_roles (
        id INTEGER PRIMARY KEY,
        project_id INTEGER,
        contact_id INTEGER,
        role TEXT CHECK(role IN ('Customer', 'Inspector', 'Constructor', 'Consultant')),
        FOREIGN KEY (project_id) REFERENCES projects(id),
        FOREIGN KEY (contact_id) REFERENCES contacts(id)
    );

    CREATE INDEX IF NOT EXISTS idx_project_roles_project_id ON project_roles(project_id);
    CREATE INDEX IF NOT EXISTS idx_project_roles_contact_id ON project_roles(contact_id);

    -- Per-project task completion (sparse)
    CREATE TABLE IF NOT EXISTS project_stage_tasks (
        id INTEGER PRIMARY KEY,
        project_id INTEGER,
        task_id INTEGER,
        is_done BOOLEAN DEFAULT 0,
        FOREIGN KEY (project_id) REFERENCES projects(id),
        FOREIGN KEY (task_id) REFERENCES tasks(id)
    );

    CREATE INDEX IF NOT EXISTS idx_project_stage_tasks_project_id ON project_stage_tasks(project_id);
"#;

/// Migration 2: One completion row per (project, task)
const MIGRATION_V2: &str = r#"
    -- Keep the newest row when older databases hold duplicates
    DELETE FROM project_stage_tasks
    WHERE id NOT IN (
        SELECT MAX(id) FROM project_stage_tasks GROUP BY project_id, task_id
    );

    CREATE UNIQUE INDEX IF NOT EXISTS idx_project_stage_tasks_project_task
        ON project_stage_tasks(project_id, task_id);
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    // Ensure migrations table exists
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    let (version,): (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_one(pool)
        .await?;

    Ok(version.unwrap_or(0))
}

/// Record that a migration has been applied
async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    if current_version < 1 {
        tracing::info!("Applying migration v1: Initial schema");
        sqlx::raw_sql(MIGRATION_V1).execute(pool).await?;
        record_migration(pool, 1).await?;
    }

    if current_version < 2 {
        tracing::info!("Applying migration v2: Unique task progress per project");
        sqlx::raw_sql(MIGRATION_V2).execute(pool).await?;
        record_migration(pool, 2).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Check if the database needs migrations
pub async fn needs_migration(pool: &SqlitePool) -> anyhow::Result<bool> {
    let current_version = get_current_version(pool).await?;
    Ok(current_version < CURRENT_VERSION)
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create test pool")
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_test_pool().await;

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, 0);
        assert!(status.needs_migration);

        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
        assert!(!status.needs_migration);
        assert!(!needs_migration(&pool).await.unwrap());
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let pool = create_test_pool().await;

        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let status = migration_status(&pool).await.unwrap();
        assert_eq!(status.current_version, CURRENT_VERSION);
    }

    #[tokio::test]
    async fn test_tables_created() {
        let pool = create_test_pool().await;
        run_migrations(&pool).await.unwrap();

        let tables = [
            "projects",
            "contacts",
            "stages",
            "tasks",
            "project_roles",
            "project_stage_tasks",
        ];

        for table in tables {
            let result: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
                .unwrap_or_else(|_| panic!("Table {} should exist", table));
            assert_eq!(result.0, 0, "Table {} should be empty", table);
        }
    }

    #[tokio::test]
    async fn test_v2_removes_duplicate_progress_rows() {
        let pool = create_test_pool().await;
        sqlx::query("PRAGMA foreign_keys = OFF").execute(&pool).await.unwrap();
        sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(&pool).await.unwrap();
        sqlx::raw_sql(MIGRATION_V1).execute(&pool).await.unwrap();
        record_migration(&pool, 1).await.unwrap();

        // Legacy databases could hold several rows for the same task
        for done in [0, 1] {
            sqlx::query("INSERT INTO project_stage_tasks (project_id, task_id, is_done) VALUES (1, 1, ?)")
                .bind(done)
                .execute(&pool)
                .await
                .unwrap();
        }

        run_migrations(&pool).await.unwrap();

        let rows: Vec<(i64, bool)> =
            sqlx::query_as("SELECT task_id, is_done FROM project_stage_tasks")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(rows, vec![(1, true)]);

        let duplicate = sqlx::query(
            "INSERT INTO project_stage_tasks (project_id, task_id, is_done) VALUES (1, 1, 0)",
        )
        .execute(&pool)
        .await;
        assert!(duplicate.is_err(), "unique index should reject duplicates");
    }
}
