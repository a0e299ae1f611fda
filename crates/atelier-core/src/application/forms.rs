//! Editable form state for projects and contacts
//!
//! Forms hold plain strings the way a user types them. Conversion to stored
//! entities happens in the services, which also resolve names to ids.

use crate::application::validators::ProjectValidator;
use crate::application::views::{ProjectView, RoleSlots};
use crate::commands::{Contact, NewContact};
use serde::{Deserialize, Serialize};

/// Project edit form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectForm {
    pub location: String,
    pub start_date: String,
    /// Ignored while `active` is set
    pub end_date: String,
    pub active: bool,
    /// Stage chosen by name; empty means no stage
    pub stage_name: String,
    pub document_path: String,
    /// Contact display names per slot; empty means unassigned
    pub roles: RoleSlots,
}

impl ProjectForm {
    /// Empty form for a new project, starting today
    pub fn blank() -> Self {
        Self {
            location: String::new(),
            start_date: chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
            end_date: String::new(),
            active: true,
            stage_name: String::new(),
            document_path: String::new(),
            roles: RoleSlots::default(),
        }
    }

    /// Form prefilled from an assembled view
    pub fn from_view(view: &ProjectView) -> Self {
        Self {
            location: view.location.clone(),
            start_date: view.start_date.clone(),
            end_date: view.end_date.clone().unwrap_or_default(),
            active: view.active,
            stage_name: view.stage_name.clone(),
            document_path: view.document_path.clone(),
            roles: view.roles.clone(),
        }
    }

    /// Toggle the active flag; turning it on clears the end date
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if active {
            self.end_date.clear();
        }
    }

    /// End date that would be stored
    pub fn effective_end_date(&self) -> Option<String> {
        ProjectValidator::effective_end_date(Some(&self.end_date), self.active)
    }
}

impl Default for ProjectForm {
    fn default() -> Self {
        Self::blank()
    }
}

/// Contact edit form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl ContactForm {
    pub fn from_contact(contact: &Contact) -> Self {
        Self {
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
            address: contact.address.clone(),
        }
    }

    pub fn into_new_contact(self) -> NewContact {
        NewContact {
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            email: self.email,
            address: self.address,
        }
    }

    /// Overwrite every editable field of `contact`
    pub fn apply_to(&self, contact: &mut Contact) {
        contact.first_name = self.first_name.clone();
        contact.last_name = self.last_name.clone();
        contact.phone = self.phone.clone();
        contact.email = self.email.clone();
        contact.address = self.address.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::views::RoleSlot;

    #[test]
    fn test_blank_form_is_active_and_dated() {
        let form = ProjectForm::blank();
        assert!(form.active);
        assert_eq!(form.start_date.len(), 10);
        assert_eq!(form.effective_end_date(), None);
    }

    #[test]
    fn test_activating_clears_end_date() {
        let mut form = ProjectForm::blank();
        form.set_active(false);
        form.end_date = "2030-01-01".to_string();
        assert_eq!(form.effective_end_date().as_deref(), Some("2030-01-01"));

        form.set_active(true);
        assert!(form.end_date.is_empty());
        assert_eq!(form.effective_end_date(), None);
    }

    #[test]
    fn test_from_view() {
        let mut roles = RoleSlots::default();
        roles.set(RoleSlot::Inspector, "Noa Katz");
        let view = ProjectView {
            id: 4,
            location: "Safed".to_string(),
            start_date: "2023-05-01".to_string(),
            end_date: Some("2023-09-01".to_string()),
            active: false,
            stage_id: Some(2),
            stage_name: "Permits".to_string(),
            document_path: "/tmp/plan.pdf".to_string(),
            roles,
        };

        let form = ProjectForm::from_view(&view);
        assert_eq!(form.end_date, "2023-09-01");
        assert_eq!(form.stage_name, "Permits");
        assert_eq!(form.roles.get(RoleSlot::Inspector), "Noa Katz");
    }

    #[test]
    fn test_contact_form_apply() {
        let mut contact = Contact {
            id: 1,
            first_name: "Dana".to_string(),
            last_name: "Levi".to_string(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
        };
        let mut form = ContactForm::from_contact(&contact);
        form.phone = "050-1234567".to_string();
        form.apply_to(&mut contact);

        assert_eq!(contact.id, 1);
        assert_eq!(contact.phone, "050-1234567");
        assert_eq!(form.into_new_contact().first_name, "Dana");
    }
}
