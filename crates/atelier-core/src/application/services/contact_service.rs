//! Contact orchestration

use crate::application::forms::ContactForm;
use crate::application::views::{LinkedProject, RoleSlots, project_display_name};
use crate::commands::{
    Contact, ContactRepository, NewContact, ProjectRepository, ProjectRoleRepository,
};
use crate::storage::Database;
use crate::{Error, Result};
use tracing::info;

/// Service for contact operations
pub struct ContactService<'a> {
    db: &'a Database,
}

impl<'a> ContactService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    fn contacts(&self) -> ContactRepository<'a> {
        ContactRepository::new(self.db)
    }

    pub async fn create_contact(&self, contact: &NewContact) -> Result<i64> {
        self.contacts().create(contact).await
    }

    pub async fn update_contact(&self, contact: &Contact) -> Result<()> {
        if !self.contacts().update(contact).await? {
            return Err(Error::ContactNotFound(contact.id));
        }
        Ok(())
    }

    pub async fn get_contact(&self, id: i64) -> Result<Option<Contact>> {
        self.contacts().get(id).await
    }

    pub async fn list_contacts(&self, search: &str) -> Result<Vec<Contact>> {
        self.contacts().list(search).await
    }

    /// Delete a contact and every role it holds
    pub async fn delete_contact(&self, id: i64) -> Result<()> {
        if !self.contacts().delete(id).await? {
            return Err(Error::ContactNotFound(id));
        }
        Ok(())
    }

    /// Projects this contact is assigned to, one entry per role row,
    /// ordered by project id
    pub async fn linked_projects(&self, contact_id: i64) -> Result<Vec<LinkedProject>> {
        let roles = ProjectRoleRepository::new(self.db);
        let projects = ProjectRepository::new(self.db);
        let contacts = self.contacts().list("").await?;

        let mut assignments = roles.list_by_contact(contact_id).await?;
        assignments.sort_by_key(|row| (row.project_id, row.id));

        let mut linked = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let Some(project) = projects.get(assignment.project_id).await? else {
                continue;
            };
            let slots = RoleSlots::resolve(&roles.list_by_project(project.id).await?, &contacts);
            linked.push(LinkedProject {
                project_id: project.id,
                display_name: project_display_name(project.id, &project.location, &slots),
                role: assignment.role,
            });
        }

        Ok(linked)
    }

    pub async fn create_from_form(&self, form: &ContactForm) -> Result<i64> {
        let id = self.create_contact(&form.clone().into_new_contact()).await?;
        info!(contact_id = id, "Contact created from form");
        Ok(id)
    }

    pub async fn save_form(&self, contact_id: i64, form: &ContactForm) -> Result<()> {
        let mut contact = self
            .get_contact(contact_id)
            .await?
            .ok_or(Error::ContactNotFound(contact_id))?;
        form.apply_to(&mut contact);
        self.update_contact(&contact).await
    }
}
