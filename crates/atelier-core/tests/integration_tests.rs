//! Atelier Core Integration Tests

use atelier_core::{
    Error,
    application::{ContactService, ProjectService, RoleSlot, TaskView},
    commands::{
        ContactRepository, NewContact, NewProject, ProjectRoleRepository,
        ProjectStageTaskRepository, Role,
    },
    storage::{Database, DatabaseConfig, STAGE_TASKS},
};
use tempfile::TempDir;

async fn memory_db() -> Database {
    Database::in_memory().await.unwrap()
}

async fn add_contact(db: &Database, first: &str, last: &str) -> i64 {
    ContactRepository::new(db)
        .create(&NewContact::new(first, last))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_inactive_end_before_start_is_rejected() {
    let db = memory_db().await;
    let service = ProjectService::new(&db);

    let err = service
        .create_project(NewProject::new("Beersheba", "2024-03-10").finished("2024-03-09"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(err.code(), "E100");

    let id = service
        .create_project(NewProject::new("Beersheba", "2024-03-10").finished("2024-03-10"))
        .await
        .unwrap();

    let mut project = service.get_project(id).await.unwrap().unwrap();
    project.end_date = Some("2023-01-01".to_string());
    assert!(service.update_project(project).await.unwrap_err().is_validation());
}

#[tokio::test]
async fn test_activating_clears_stored_end_date() {
    let db = memory_db().await;
    let service = ProjectService::new(&db);
    let id = service
        .create_project(NewProject::new("Netanya", "2024-01-01").finished("2024-06-30"))
        .await
        .unwrap();

    let mut project = service.get_project(id).await.unwrap().unwrap();
    assert_eq!(project.end_date.as_deref(), Some("2024-06-30"));
    project.active = true;
    service.update_project(project).await.unwrap();

    let project = service.get_project(id).await.unwrap().unwrap();
    assert!(project.active);
    assert_eq!(project.end_date, None);
}

#[tokio::test]
async fn test_delete_project_removes_dependents() {
    let db = memory_db().await;
    let service = ProjectService::new(&db);
    let id = service
        .create_project(NewProject::new("Herzliya", "2024-01-01"))
        .await
        .unwrap();
    let other = service
        .create_project(NewProject::new("Holon", "2024-01-01"))
        .await
        .unwrap();

    let a = add_contact(&db, "Dana", "Levi").await;
    let b = add_contact(&db, "Avi", "Cohen").await;
    service.add_project_role(id, a, Role::Customer).await.unwrap();
    service.add_project_role(id, b, Role::Inspector).await.unwrap();
    service.add_project_role(other, a, Role::Customer).await.unwrap();
    for task in 1..=3 {
        service.set_task_done(id, task, true).await.unwrap();
    }
    service.set_task_done(other, 1, true).await.unwrap();

    service.delete_project(id).await.unwrap();

    assert!(service.get_project(id).await.unwrap().is_none());
    assert!(ProjectRoleRepository::new(&db).list_by_project(id).await.unwrap().is_empty());
    assert!(
        ProjectStageTaskRepository::new(&db)
            .list_by_project(id)
            .await
            .unwrap()
            .is_empty()
    );
    // The other project keeps its rows
    assert_eq!(service.list_project_roles(other).await.unwrap().len(), 1);
    assert_eq!(service.list_project_stage_tasks(other).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_view_without_roles() {
    let db = memory_db().await;
    let service = ProjectService::new(&db);
    let id = service
        .create_project(NewProject::new("Rehovot", "2024-01-01"))
        .await
        .unwrap();

    let view = service.build_project_view(id).await.unwrap().unwrap();
    assert_eq!(view.stage_name, "");
    for (_, name) in view.roles.iter() {
        assert_eq!(name, "");
    }
    assert_eq!(view.display_name(), format!("Project {} - Rehovot", id));
}

#[tokio::test]
async fn test_three_customers_surface_first_two() {
    let db = memory_db().await;
    let service = ProjectService::new(&db);
    let id = service
        .create_project(NewProject::new("Modiin", "2024-01-01"))
        .await
        .unwrap();

    let a = add_contact(&db, "Dana", "Levi").await;
    let b = add_contact(&db, "Avi", "Cohen").await;
    let c = add_contact(&db, "Noa", "Katz").await;
    for contact in [a, b, c] {
        service.add_project_role(id, contact, Role::Customer).await.unwrap();
    }

    let view = service.build_project_view(id).await.unwrap().unwrap();
    assert_eq!(view.roles.get(RoleSlot::Customer1), "Dana Levi");
    assert_eq!(view.roles.get(RoleSlot::Customer2), "Avi Cohen");
    assert!(view.roles.iter().all(|(_, name)| name != "Noa Katz"));
    assert_eq!(view.display_name(), "Dana Levi, Avi Cohen - Modiin");
}

#[tokio::test]
async fn test_task_view_reflects_progress() {
    let db = memory_db().await;
    let service = ProjectService::new(&db);
    let id = service
        .create_project(NewProject::new("Kfar Saba", "2024-01-01"))
        .await
        .unwrap();
    let stage = service
        .find_stage_by_name("Building approval pre-check")
        .await
        .unwrap()
        .unwrap();
    let tasks = service.list_tasks_by_stage(stage.id).await.unwrap();

    service.set_task_done(id, tasks[1].id, true).await.unwrap();

    let views: Vec<TaskView> = service.task_views_for_stage(id, stage.id).await.unwrap();
    let done: Vec<bool> = views.iter().map(|v| v.is_done).collect();
    assert_eq!(done, vec![false, true, false, false]);
    assert_eq!(views[0].description, "קונסטרוקטור נבחר");
}

#[tokio::test]
async fn test_repeated_toggle_keeps_one_row() {
    let db = memory_db().await;
    let service = ProjectService::new(&db);
    let id = service
        .create_project(NewProject::new("Ashkelon", "2024-01-01"))
        .await
        .unwrap();

    service.set_task_done(id, 5, true).await.unwrap();
    service.set_task_done(id, 5, true).await.unwrap();
    service.set_task_done(id, 5, false).await.unwrap();

    let rows = service.list_project_stage_tasks(id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].is_done);
}

#[tokio::test]
async fn test_seeding_is_idempotent_across_restarts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("projects.db");
    let expected_tasks: usize = STAGE_TASKS.iter().map(|(_, tasks)| tasks.len()).sum();

    let db = Database::new(DatabaseConfig::with_path(&path)).await.unwrap();
    assert_eq!(
        db.reference_counts().await.unwrap(),
        (STAGE_TASKS.len() as i64, expected_tasks as i64)
    );
    assert!(db.seed().await.unwrap().is_noop());
    db.close().await;

    let reopened = Database::open(&path).await.unwrap();
    assert_eq!(
        reopened.reference_counts().await.unwrap(),
        (8, expected_tasks as i64)
    );
    reopened.close().await;
}

#[tokio::test]
async fn test_contact_deletion_clears_slots() {
    let db = memory_db().await;
    let projects = ProjectService::new(&db);
    let contacts = ContactService::new(&db);
    let id = projects
        .create_project(NewProject::new("Afula", "2024-01-01"))
        .await
        .unwrap();
    let a = add_contact(&db, "Dana", "Levi").await;
    let b = add_contact(&db, "Avi", "Cohen").await;
    projects.add_project_role(id, a, Role::Customer).await.unwrap();
    projects.add_project_role(id, b, Role::Customer).await.unwrap();

    contacts.delete_contact(a).await.unwrap();

    let view = projects.build_project_view(id).await.unwrap().unwrap();
    assert_eq!(view.roles.customer_1, "Avi Cohen");
    assert_eq!(view.roles.customer_2, "");
}

#[tokio::test]
async fn test_list_views_filters() {
    let db = memory_db().await;
    let service = ProjectService::new(&db);
    service
        .create_project(NewProject::new("Old Jaffa", "2020-01-01").finished("2021-01-01"))
        .await
        .unwrap();
    service
        .create_project(NewProject::new("Jaffa Port", "2024-01-01"))
        .await
        .unwrap();
    service
        .create_project(NewProject::new("Eilat", "2024-01-01"))
        .await
        .unwrap();

    assert_eq!(service.list_project_views("Jaffa", false).await.unwrap().len(), 2);
    let active = service.list_project_views("Jaffa", true).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].location, "Jaffa Port");
    assert_eq!(service.list_project_views("", false).await.unwrap().len(), 3);
}
