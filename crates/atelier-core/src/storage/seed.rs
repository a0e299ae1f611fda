//! Reference data seeding
//!
//! Workflow stages and their checklist tasks are fixed. They are inserted once,
//! the first time the tables are found empty, and never touched afterwards.

use sqlx::SqlitePool;
use std::collections::HashMap;

/// Workflow stages with their checklist tasks, in display order
pub const STAGE_TASKS: &[(&str, &[&str])] = &[
    ("Project Definition", &["Collects family needs"]),
    (
        "Planning Information",
        &[
            "צילום ת.ז",
            "כתובת למשלוח מכתבים",
            "פרטי המגרש",
            "חוזה מנהל",
            "מפת מדידה עדכנית",
            "צילומי המגרש עם תאריך",
            "תשלום עבור פתיחת תיק המידע",
            "בדיקה האם קיימים עצים בוגרים במגרש",
        ],
    ),
    ("Design", &["בניית תוכנית אדריכלית"]),
    (
        "Garmoshka",
        &["גרמושקה בסיסית", "חישוב שטחים", "גרמושקה ממוחשבת"],
    ),
    (
        "Building approval pre-check",
        &["קונסטרוקטור נבחר", "יועץ סניטציה נבחר", "חוזה מנהל", "נסח טאבו"],
    ),
    ("Pikud Haoref", &["תוכנית ממד"]),
    ("Techen", &["בחירת מכון"]),
    ("Final Approval", &["חישוב פסולת"]),
];

/// Number of seeded stages
pub fn stage_count() -> usize {
    STAGE_TASKS.len()
}

/// Number of seeded tasks across all stages
pub fn task_count() -> usize {
    STAGE_TASKS.iter().map(|(_, tasks)| tasks.len()).sum()
}

/// Outcome of a seeding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub stages_inserted: usize,
    pub tasks_inserted: usize,
}

impl SeedResult {
    pub fn is_noop(&self) -> bool {
        self.stages_inserted == 0 && self.tasks_inserted == 0
    }
}

async fn table_count(pool: &SqlitePool, table: &str) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Populate stages and tasks when their tables are empty
pub async fn seed_reference_data(pool: &SqlitePool) -> anyhow::Result<SeedResult> {
    let mut result = SeedResult::default();
    let mut tx = pool.begin().await?;

    let (stages,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stages")
        .fetch_one(&mut *tx)
        .await?;
    if stages == 0 {
        for (name, _) in STAGE_TASKS {
            sqlx::query("INSERT INTO stages (name) VALUES (?)")
                .bind(*name)
                .execute(&mut *tx)
                .await?;
            result.stages_inserted += 1;
        }
    }

    let (tasks,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
        .fetch_one(&mut *tx)
        .await?;
    if tasks == 0 {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM stages")
            .fetch_all(&mut *tx)
            .await?;
        let stage_ids: HashMap<String, i64> = rows.into_iter().map(|(id, name)| (name, id)).collect();

        for (stage_name, descriptions) in STAGE_TASKS {
            // Stages renamed by hand keep their (absent) checklist
            let Some(stage_id) = stage_ids.get(*stage_name) else {
                tracing::warn!(stage = %stage_name, "Stage missing, skipping its tasks");
                continue;
            };
            for description in descriptions.iter() {
                sqlx::query("INSERT INTO tasks (stage_id, description) VALUES (?, ?)")
                    .bind(*stage_id)
                    .bind(*description)
                    .execute(&mut *tx)
                    .await?;
                result.tasks_inserted += 1;
            }
        }
    }

    tx.commit().await?;

    if result.is_noop() {
        tracing::debug!("Reference data already present");
    } else {
        tracing::info!(
            stages = result.stages_inserted,
            tasks = result.tasks_inserted,
            "Seeded workflow stages and tasks"
        );
    }

    Ok(result)
}

/// Current (stage, task) row counts
pub async fn reference_counts(pool: &SqlitePool) -> anyhow::Result<(i64, i64)> {
    Ok((table_count(pool, "stages").await?, table_count(pool, "tasks").await?))
}
