//! Project orchestration
//!
//! Composes repository calls into the operations the presentation layer
//! uses: validated writes, view assembly, role slots and task progress.

use crate::application::forms::ProjectForm;
use crate::application::picker::DocumentPicker;
use crate::application::validators::ProjectValidator;
use crate::application::views::{ProjectView, RoleSlot, RoleSlots, TaskView};
use crate::commands::{
    Contact, ContactRepository, NewProject, Project, ProjectRepository, ProjectRole,
    ProjectRoleRepository, ProjectStageTask, ProjectStageTaskRepository, Role, Stage,
    StageRepository, Task, TaskRepository, Toggle,
};
use crate::storage::Database;
use crate::{Error, Result};
use std::collections::HashMap;
use tracing::{debug, info};

/// Service for project operations
pub struct ProjectService<'a> {
    db: &'a Database,
}

impl<'a> ProjectService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn projects(&self) -> ProjectRepository<'a> {
        ProjectRepository::new(self.db)
    }

    fn roles(&self) -> ProjectRoleRepository<'a> {
        ProjectRoleRepository::new(self.db)
    }

    fn stage_tasks(&self) -> ProjectStageTaskRepository<'a> {
        ProjectStageTaskRepository::new(self.db)
    }

    // ---- projects ----

    /// Validate and store a new project
    pub async fn create_project(&self, mut project: NewProject) -> Result<i64> {
        ProjectValidator::validate_dates(
            &project.start_date,
            project.end_date.as_deref(),
            project.active,
        )?;
        project.end_date =
            ProjectValidator::effective_end_date(project.end_date.as_deref(), project.active);

        self.projects().create(&project).await
    }

    /// Validate and overwrite every field of an existing project
    pub async fn update_project(&self, mut project: Project) -> Result<()> {
        ProjectValidator::validate_dates(
            &project.start_date,
            project.end_date.as_deref(),
            project.active,
        )?;
        project.end_date =
            ProjectValidator::effective_end_date(project.end_date.as_deref(), project.active);

        if !self.projects().update(&project).await? {
            return Err(Error::ProjectNotFound(project.id));
        }
        Ok(())
    }

    pub async fn get_project(&self, id: i64) -> Result<Option<Project>> {
        self.projects().get(id).await
    }

    pub async fn list_projects(&self, search: &str, active_only: bool) -> Result<Vec<Project>> {
        self.projects().list(search, active_only).await
    }

    /// Delete a project together with its roles and task progress
    pub async fn delete_project(&self, id: i64) -> Result<()> {
        if !self.projects().delete(id).await? {
            return Err(Error::ProjectNotFound(id));
        }
        Ok(())
    }

    // ---- views ----

    /// Assemble the display view of one project, `None` if it does not exist
    pub async fn build_project_view(&self, project_id: i64) -> Result<Option<ProjectView>> {
        let Some(project) = self.projects().get(project_id).await? else {
            return Ok(None);
        };

        let stage_name = self.stage_name(project.stage_id).await?;
        let roles = self.roles().list_by_project(project_id).await?;
        let contacts = ContactRepository::new(self.db).list("").await?;
        let slots = RoleSlots::resolve(&roles, &contacts);

        Ok(Some(ProjectView::new(project, stage_name, slots)))
    }

    /// Views of every listed project, in id order
    pub async fn list_project_views(
        &self,
        search: &str,
        active_only: bool,
    ) -> Result<Vec<ProjectView>> {
        let projects = self.projects().list(search, active_only).await?;
        let stages: HashMap<i64, String> = StageRepository::new(self.db)
            .list()
            .await?
            .into_iter()
            .map(|stage| (stage.id, stage.name))
            .collect();
        let contacts = ContactRepository::new(self.db).list("").await?;

        let mut views = Vec::with_capacity(projects.len());
        for project in projects {
            let roles = self.roles().list_by_project(project.id).await?;
            let slots = RoleSlots::resolve(&roles, &contacts);
            let stage_name = project
                .stage_id
                .and_then(|id| stages.get(&id).cloned())
                .unwrap_or_default();
            views.push(ProjectView::new(project, stage_name, slots));
        }

        debug!(count = views.len(), "Project views assembled");
        Ok(views)
    }

    async fn stage_name(&self, stage_id: Option<i64>) -> Result<String> {
        let Some(stage_id) = stage_id else {
            return Ok(String::new());
        };
        let stage = StageRepository::new(self.db).get(stage_id).await?;
        Ok(stage.map(|s| s.name).unwrap_or_default())
    }

    /// Checklist of a stage with this project's progress
    pub async fn task_views_for_stage(
        &self,
        project_id: i64,
        stage_id: i64,
    ) -> Result<Vec<TaskView>> {
        let tasks = TaskRepository::new(self.db).list_by_stage(stage_id).await?;
        let progress: HashMap<i64, bool> = self
            .stage_tasks()
            .list_by_project(project_id)
            .await?
            .into_iter()
            .map(|row| (row.task_id, row.is_done))
            .collect();

        Ok(tasks
            .into_iter()
            .map(|task| TaskView {
                is_done: progress.get(&task.id).copied().unwrap_or(false),
                id: task.id,
                description: task.description,
            })
            .collect())
    }

    /// Record a task as done or not done for a project
    pub async fn set_task_done(&self, project_id: i64, task_id: i64, done: bool) -> Result<Toggle> {
        self.stage_tasks().set_done(project_id, task_id, done).await
    }

    pub async fn list_project_stage_tasks(&self, project_id: i64) -> Result<Vec<ProjectStageTask>> {
        self.stage_tasks().list_by_project(project_id).await
    }

    /// Update a progress row by its own id
    pub async fn set_project_stage_task_done(&self, row_id: i64, done: bool) -> Result<bool> {
        self.stage_tasks().set_done_by_id(row_id, done).await
    }

    // ---- stages and tasks ----

    pub async fn list_stages(&self) -> Result<Vec<Stage>> {
        StageRepository::new(self.db).list().await
    }

    pub async fn get_stage(&self, id: i64) -> Result<Option<Stage>> {
        StageRepository::new(self.db).get(id).await
    }

    pub async fn find_stage_by_name(&self, name: &str) -> Result<Option<Stage>> {
        StageRepository::new(self.db).get_by_name(name).await
    }

    pub async fn list_tasks_by_stage(&self, stage_id: i64) -> Result<Vec<Task>> {
        TaskRepository::new(self.db).list_by_stage(stage_id).await
    }

    pub async fn get_task(&self, id: i64) -> Result<Option<Task>> {
        TaskRepository::new(self.db).get(id).await
    }

    // ---- roles ----

    pub async fn list_project_roles(&self, project_id: i64) -> Result<Vec<ProjectRole>> {
        self.roles().list_by_project(project_id).await
    }

    pub async fn add_project_role(&self, project_id: i64, contact_id: i64, role: Role) -> Result<i64> {
        self.roles().add(project_id, contact_id, role).await
    }

    pub async fn remove_project_role(&self, role_id: i64) -> Result<()> {
        if !self.roles().remove(role_id).await? {
            return Err(Error::RoleNotFound(role_id));
        }
        Ok(())
    }

    /// Remove the Customer row shown under `slot`.
    ///
    /// Returns `false` when the project has no customer in that position.
    pub async fn remove_customer_slot(&self, project_id: i64, slot: RoleSlot) -> Result<bool> {
        let position = match slot {
            RoleSlot::Customer1 => 0,
            RoleSlot::Customer2 => 1,
            other => {
                return Err(Error::InvalidInput(format!(
                    "'{}' is not a customer slot",
                    other
                )));
            }
        };

        let customer = self
            .roles()
            .list_by_project(project_id)
            .await?
            .into_iter()
            .filter(|row| row.role == Role::Customer)
            .nth(position);

        match customer {
            Some(row) => self.roles().remove(row.id).await,
            None => Ok(false),
        }
    }

    /// Replace every role row of the project from a slot mapping.
    ///
    /// Rows are written in slot order so the customers come back in the same
    /// positions.
    pub async fn assign_roles(&self, project_id: i64, assignments: &[(RoleSlot, i64)]) -> Result<()> {
        let mut ordered = assignments.to_vec();
        ordered.sort_by_key(|(slot, _)| RoleSlot::ALL.iter().position(|s| s == slot));

        let rows: Vec<(i64, Role)> = ordered
            .into_iter()
            .map(|(slot, contact_id)| (contact_id, slot.role()))
            .collect();

        self.roles().replace_all(project_id, &rows).await
    }

    // ---- forms ----

    /// Store a new project from a filled-in form, returning its id.
    ///
    /// Role names are checked before anything is written.
    pub async fn create_from_form(&self, form: &ProjectForm) -> Result<i64> {
        let project = self.project_from_form(0, form).await?;
        let contacts = ContactRepository::new(self.db).list("").await?;
        let edits = role_edits(&RoleSlots::default(), &form.roles, &contacts)?;

        let new = NewProject {
            location: project.location,
            start_date: project.start_date,
            end_date: project.end_date,
            active: project.active,
            stage_id: project.stage_id,
            document_path: project.document_path,
        };
        let id = self.create_project(new).await?;

        if !edits.is_empty() {
            self.roles().replace_all(id, &merge_role_rows(&[], &edits)).await?;
        }

        info!(project_id = id, "Project created from form");
        Ok(id)
    }

    /// Write a form back to an existing project.
    ///
    /// Only slots whose name differs from the stored view touch the role
    /// rows. Untouched slots keep their contact ids, and customers past the
    /// second or repeated roles survive.
    pub async fn save_form(&self, project_id: i64, form: &ProjectForm) -> Result<()> {
        let project = self.project_from_form(project_id, form).await?;
        let contacts = ContactRepository::new(self.db).list("").await?;
        let rows = self.roles().list_by_project(project_id).await?;
        let current = RoleSlots::resolve(&rows, &contacts);
        let edits = role_edits(&current, &form.roles, &contacts)?;

        self.update_project(project).await?;

        if edits.is_empty() {
            debug!(project_id, "Role slots unchanged");
        } else {
            let merged = merge_role_rows(&rows, &edits);
            self.roles().replace_all(project_id, &merged).await?;
        }

        info!(project_id, "Project form saved");
        Ok(())
    }

    /// Write a form back and replace every role row with the form's slots
    pub async fn replace_form(&self, project_id: i64, form: &ProjectForm) -> Result<()> {
        let project = self.project_from_form(project_id, form).await?;
        let contacts = ContactRepository::new(self.db).list("").await?;
        let edits = role_edits(&RoleSlots::default(), &form.roles, &contacts)?;

        self.update_project(project).await?;
        self.roles()
            .replace_all(project_id, &merge_role_rows(&[], &edits))
            .await?;

        info!(project_id, "Project form saved with new roles");
        Ok(())
    }

    async fn project_from_form(&self, id: i64, form: &ProjectForm) -> Result<Project> {
        let stage_id = if form.stage_name.is_empty() {
            None
        } else {
            let stage = self
                .find_stage_by_name(&form.stage_name)
                .await?
                .ok_or_else(|| Error::StageNotFound(form.stage_name.clone()))?;
            Some(stage.id)
        };

        Ok(Project {
            id,
            location: form.location.clone(),
            start_date: form.start_date.clone(),
            end_date: form.effective_end_date(),
            active: form.active,
            stage_id,
            document_path: form.document_path.clone(),
        })
    }

    // ---- documents ----

    /// Ask the picker for a document and store its path on the project.
    ///
    /// Returns the stored path, or `None` if the picker was cancelled.
    pub async fn attach_document(
        &self,
        project_id: i64,
        picker: &mut dyn DocumentPicker,
    ) -> Result<Option<String>> {
        if !self.projects().exists(project_id).await? {
            return Err(Error::ProjectNotFound(project_id));
        }

        let Some(path) = picker.pick()? else {
            debug!(project_id, "Document selection cancelled");
            return Ok(None);
        };

        let path = path.to_string_lossy().into_owned();
        self.projects().set_document_path(project_id, &path).await?;
        info!(project_id, path = %path, "Document attached");
        Ok(Some(path))
    }
}

fn find_contact_by_name<'c>(contacts: &'c [Contact], name: &str) -> Option<&'c Contact> {
    contacts.iter().find(|c| c.display_name() == name)
}

/// Slots whose wanted name differs from the current one, with the contact
/// now behind them (`None` clears the slot). The first contact with a
/// matching display name wins; an unknown name is an error.
fn role_edits(
    current: &RoleSlots,
    wanted: &RoleSlots,
    contacts: &[Contact],
) -> Result<Vec<(RoleSlot, Option<i64>)>> {
    let mut edits = Vec::new();

    for slot in RoleSlot::ALL {
        let name = wanted.get(slot);
        if name == current.get(slot) {
            continue;
        }
        let contact_id = if name.is_empty() {
            None
        } else {
            let contact = find_contact_by_name(contacts, name).ok_or_else(|| {
                Error::InvalidInput(format!("{}: no contact named '{}'", slot, name))
            })?;
            Some(contact.id)
        };
        edits.push((slot, contact_id));
    }

    Ok(edits)
}

/// Apply slot edits to the stored rows.
///
/// Customer 1 and Customer 2 edit the first and second customer row in
/// place, so the remaining customers keep their positions. An edited
/// constructor, inspector or consultant replaces every row of that role.
fn merge_role_rows(rows: &[ProjectRole], edits: &[(RoleSlot, Option<i64>)]) -> Vec<(i64, Role)> {
    let mut customers: Vec<Option<i64>> = rows
        .iter()
        .filter(|row| row.role == Role::Customer)
        .map(|row| Some(row.contact_id))
        .collect();
    let mut others: Vec<(i64, Role)> = rows
        .iter()
        .filter(|row| row.role != Role::Customer)
        .map(|row| (row.contact_id, row.role))
        .collect();

    for &(slot, contact_id) in edits {
        match slot {
            RoleSlot::Customer1 | RoleSlot::Customer2 => {
                let position = if slot == RoleSlot::Customer1 { 0 } else { 1 };
                if position < customers.len() {
                    customers[position] = contact_id;
                } else if contact_id.is_some() {
                    customers.push(contact_id);
                }
            }
            _ => {
                let role = slot.role();
                others.retain(|(_, r)| *r != role);
                if let Some(id) = contact_id {
                    others.push((id, role));
                }
            }
        }
    }

    customers
        .into_iter()
        .flatten()
        .map(|id| (id, Role::Customer))
        .chain(others)
        .collect()
}
