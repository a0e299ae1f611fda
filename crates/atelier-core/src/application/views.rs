//! Read models for presentation
//!
//! Denormalized, display-ready views assembled from the raw tables, plus the
//! static field tables that drive table columns and form fields.

use crate::commands::{Contact, Project, ProjectRole, Role};
use crate::{Error, Result};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// One of the five labels a role assignment can surface under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RoleSlot {
    Customer1,
    Customer2,
    Constructor,
    Inspector,
    Consultant,
}

impl RoleSlot {
    /// Display order
    pub const ALL: [RoleSlot; 5] = [
        RoleSlot::Customer1,
        RoleSlot::Customer2,
        RoleSlot::Constructor,
        RoleSlot::Inspector,
        RoleSlot::Consultant,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RoleSlot::Customer1 => "Customer 1",
            RoleSlot::Customer2 => "Customer 2",
            RoleSlot::Constructor => "Constructor",
            RoleSlot::Inspector => "Inspector",
            RoleSlot::Consultant => "Consultant",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        RoleSlot::ALL.into_iter().find(|slot| slot.label() == label)
    }

    /// Stored role behind this slot
    pub fn role(&self) -> Role {
        match self {
            RoleSlot::Customer1 | RoleSlot::Customer2 => Role::Customer,
            RoleSlot::Constructor => Role::Constructor,
            RoleSlot::Inspector => Role::Inspector,
            RoleSlot::Consultant => Role::Consultant,
        }
    }

    /// Slot for the n-th customer row, `None` past the second
    pub fn customer(position: usize) -> Option<Self> {
        match position {
            0 => Some(RoleSlot::Customer1),
            1 => Some(RoleSlot::Customer2),
            _ => None,
        }
    }
}

impl fmt::Display for RoleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Contact names per role slot; empty string when unassigned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleSlots {
    #[serde(rename = "Customer 1")]
    pub customer_1: String,
    #[serde(rename = "Customer 2")]
    pub customer_2: String,
    #[serde(rename = "Constructor")]
    pub constructor: String,
    #[serde(rename = "Inspector")]
    pub inspector: String,
    #[serde(rename = "Consultant")]
    pub consultant: String,
}

impl RoleSlots {
    pub fn get(&self, slot: RoleSlot) -> &str {
        match slot {
            RoleSlot::Customer1 => &self.customer_1,
            RoleSlot::Customer2 => &self.customer_2,
            RoleSlot::Constructor => &self.constructor,
            RoleSlot::Inspector => &self.inspector,
            RoleSlot::Consultant => &self.consultant,
        }
    }

    pub fn set(&mut self, slot: RoleSlot, name: impl Into<String>) {
        let target = match slot {
            RoleSlot::Customer1 => &mut self.customer_1,
            RoleSlot::Customer2 => &mut self.customer_2,
            RoleSlot::Constructor => &mut self.constructor,
            RoleSlot::Inspector => &mut self.inspector,
            RoleSlot::Consultant => &mut self.consultant,
        };
        *target = name.into();
    }

    /// (label, name) pairs in display order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        RoleSlot::ALL.into_iter().map(|slot| (slot.label(), self.get(slot)))
    }

    /// Non-empty customer names, Customer 1 first
    pub fn customers(&self) -> Vec<&str> {
        [self.customer_1.as_str(), self.customer_2.as_str()]
            .into_iter()
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Map role rows onto the five slots.
    ///
    /// Rows are taken in the given order. Customer rows fill Customer 1 and
    /// Customer 2 positionally and any further customers are dropped; every
    /// customer row advances the position, even one whose contact no longer
    /// exists. Other roles overwrite their slot, so the last row wins. Rows
    /// whose contact cannot be found leave their slot untouched.
    pub fn resolve(roles: &[ProjectRole], contacts: &[Contact]) -> Self {
        let mut slots = RoleSlots::default();
        let mut customers = 0usize;

        for assignment in roles {
            let slot = match assignment.role {
                Role::Customer => {
                    let slot = RoleSlot::customer(customers);
                    customers += 1;
                    slot
                }
                Role::Constructor => Some(RoleSlot::Constructor),
                Role::Inspector => Some(RoleSlot::Inspector),
                Role::Consultant => Some(RoleSlot::Consultant),
            };

            let Some(contact) = contacts.iter().find(|c| c.id == assignment.contact_id) else {
                warn!(
                    role_id = assignment.id,
                    contact_id = assignment.contact_id,
                    "Role points at a missing contact"
                );
                continue;
            };

            match slot {
                Some(slot) => slots.set(slot, contact.display_name()),
                None => debug!(role_id = assignment.id, "Customer beyond the second slot not shown"),
            }
        }

        slots
    }
}

/// Project label used in lists and titles
pub fn project_display_name(id: i64, location: &str, roles: &RoleSlots) -> String {
    let customers = roles.customers();
    if customers.is_empty() {
        format!("Project {} - {}", id, location)
    } else {
        format!("{} - {}", customers.join(", "), location)
    }
}

/// A project with its stage name and role slots resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectView {
    pub id: i64,
    pub location: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub active: bool,
    pub stage_id: Option<i64>,
    pub stage_name: String,
    pub document_path: String,
    pub roles: RoleSlots,
}

impl ProjectView {
    pub fn new(project: Project, stage_name: impl Into<String>, roles: RoleSlots) -> Self {
        Self {
            id: project.id,
            location: project.location,
            start_date: project.start_date,
            end_date: project.end_date,
            active: project.active,
            stage_id: project.stage_id,
            stage_name: stage_name.into(),
            document_path: project.document_path,
            roles,
        }
    }

    pub fn display_name(&self) -> String {
        project_display_name(self.id, &self.location, &self.roles)
    }
}

/// A checklist task with this project's completion state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub id: i64,
    pub description: String,
    pub is_done: bool,
}

/// A project a contact is assigned to, and under which role
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedProject {
    pub project_id: i64,
    pub display_name: String,
    pub role: Role,
}

/// A labelled column: header text and how to render it from a row
pub struct Field<T> {
    pub label: &'static str,
    pub value: fn(&T) -> String,
}

impl<T> Field<T> {
    pub const fn new(label: &'static str, value: fn(&T) -> String) -> Self {
        Self { label, value }
    }
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

fn project_location(v: &ProjectView) -> String {
    v.location.clone()
}

fn project_start_date(v: &ProjectView) -> String {
    v.start_date.clone()
}

fn project_end_date(v: &ProjectView) -> String {
    v.end_date.clone().unwrap_or_default()
}

fn project_active(v: &ProjectView) -> String {
    yes_no(v.active)
}

fn project_document_path(v: &ProjectView) -> String {
    v.document_path.clone()
}

fn project_stage(v: &ProjectView) -> String {
    v.stage_name.clone()
}

/// Project columns, in display order
pub const PROJECT_FIELDS: &[Field<ProjectView>] = &[
    Field::new("Location", project_location),
    Field::new("Start Date", project_start_date),
    Field::new("End Date", project_end_date),
    Field::new("Active", project_active),
    Field::new("Document Path", project_document_path),
    Field::new("Stage", project_stage),
];

fn contact_first_name(c: &Contact) -> String {
    c.first_name.clone()
}

fn contact_last_name(c: &Contact) -> String {
    c.last_name.clone()
}

fn contact_phone(c: &Contact) -> String {
    c.phone.clone()
}

fn contact_email(c: &Contact) -> String {
    c.email.clone()
}

fn contact_address(c: &Contact) -> String {
    c.address.clone()
}

/// Contact columns, in display order
pub const CONTACT_FIELDS: &[Field<Contact>] = &[
    Field::new("First Name", contact_first_name),
    Field::new("Last Name", contact_last_name),
    Field::new("Phone", contact_phone),
    Field::new("Email", contact_email),
    Field::new("Address", contact_address),
];

fn task_description(t: &TaskView) -> String {
    t.description.clone()
}

fn task_is_done(t: &TaskView) -> String {
    yes_no(t.is_done)
}

/// Task columns, in display order
pub const TASK_FIELDS: &[Field<TaskView>] = &[
    Field::new("Description", task_description),
    Field::new("Is Done", task_is_done),
];

/// Rendered cells of one row, following `fields`
pub fn row_values<T>(row: &T, fields: &[Field<T>]) -> Vec<String> {
    fields.iter().map(|field| (field.value)(row)).collect()
}

/// Column headers of a field table
pub fn field_labels<T>(fields: &[Field<T>]) -> Vec<&'static str> {
    fields.iter().map(|field| field.label).collect()
}

/// Sort rows by the rendered text of one column (stable)
pub fn sort_by_field<T>(
    rows: &mut [T],
    fields: &[Field<T>],
    label: &str,
    descending: bool,
) -> Result<()> {
    let field = fields
        .iter()
        .find(|field| field.label.eq_ignore_ascii_case(label))
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "Unknown column '{}'. Available: {}",
                label,
                field_labels(fields).join(", ")
            ))
        })?;

    rows.sort_by_cached_key(|row| (field.value)(row));
    if descending {
        rows.reverse();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: i64, first: &str, last: &str) -> Contact {
        Contact {
            id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
        }
    }

    fn role(id: i64, contact_id: i64, role: Role) -> ProjectRole {
        ProjectRole {
            id,
            project_id: 1,
            contact_id,
            role,
        }
    }

    fn view(id: i64, location: &str, start: &str, active: bool) -> ProjectView {
        ProjectView {
            id,
            location: location.to_string(),
            start_date: start.to_string(),
            end_date: None,
            active,
            stage_id: None,
            stage_name: String::new(),
            document_path: String::new(),
            roles: RoleSlots::default(),
        }
    }

    #[test]
    fn test_no_roles_leaves_every_slot_empty() {
        let slots = RoleSlots::resolve(&[], &[contact(1, "Dana", "Levi")]);
        let labels: Vec<(&str, &str)> = slots.iter().collect();
        assert_eq!(
            labels,
            vec![
                ("Customer 1", ""),
                ("Customer 2", ""),
                ("Constructor", ""),
                ("Inspector", ""),
                ("Consultant", ""),
            ]
        );
    }

    #[test]
    fn test_third_customer_is_dropped() {
        let contacts = [
            contact(1, "Dana", "Levi"),
            contact(2, "Avi", "Cohen"),
            contact(3, "Noa", "Katz"),
        ];
        let roles = [
            role(10, 1, Role::Customer),
            role(11, 2, Role::Customer),
            role(12, 3, Role::Customer),
        ];

        let slots = RoleSlots::resolve(&roles, &contacts);
        assert_eq!(slots.customer_1, "Dana Levi");
        assert_eq!(slots.customer_2, "Avi Cohen");
        assert!(slots.iter().all(|(_, name)| name != "Noa Katz"));
    }

    #[test]
    fn test_missing_contact_still_consumes_customer_slot() {
        let contacts = [contact(2, "Avi", "Cohen")];
        let roles = [role(10, 99, Role::Customer), role(11, 2, Role::Customer)];

        let slots = RoleSlots::resolve(&roles, &contacts);
        assert_eq!(slots.customer_1, "");
        assert_eq!(slots.customer_2, "Avi Cohen");
    }

    #[test]
    fn test_other_roles_last_write_wins() {
        let contacts = [contact(1, "Dana", "Levi"), contact(2, "Avi", "Cohen")];
        let roles = [
            role(10, 1, Role::Inspector),
            role(11, 2, Role::Inspector),
            role(12, 1, Role::Consultant),
            role(13, 99, Role::Consultant),
        ];

        let slots = RoleSlots::resolve(&roles, &contacts);
        assert_eq!(slots.inspector, "Avi Cohen");
        // The dangling row does not clear the earlier value
        assert_eq!(slots.consultant, "Dana Levi");
        assert_eq!(slots.constructor, "");
    }

    #[test]
    fn test_display_name() {
        let mut slots = RoleSlots::default();
        assert_eq!(project_display_name(7, "Haifa", &slots), "Project 7 - Haifa");

        slots.set(RoleSlot::Customer2, "Avi Cohen");
        assert_eq!(project_display_name(7, "Haifa", &slots), "Avi Cohen - Haifa");

        slots.set(RoleSlot::Customer1, "Dana Levi");
        assert_eq!(
            project_display_name(7, "Haifa", &slots),
            "Dana Levi, Avi Cohen - Haifa"
        );
    }

    #[test]
    fn test_role_slot_labels() {
        for slot in RoleSlot::ALL {
            assert_eq!(RoleSlot::from_label(slot.label()), Some(slot));
        }
        assert_eq!(RoleSlot::from_label("Customer 3"), None);
        assert_eq!(RoleSlot::Customer2.role(), Role::Customer);
        assert_eq!(RoleSlot::customer(2), None);
    }

    #[test]
    fn test_role_slots_serialize_with_labels() {
        let mut slots = RoleSlots::default();
        slots.set(RoleSlot::Customer1, "Dana Levi");
        let json = serde_json::to_value(&slots).unwrap();
        assert_eq!(json["Customer 1"], "Dana Levi");
        assert_eq!(json["Consultant"], "");
    }

    #[test]
    fn test_project_fields_render_in_order() {
        let mut v = view(1, "Acre", "2024-01-01", false);
        v.end_date = Some("2024-06-01".to_string());
        v.stage_name = "Design".to_string();

        assert_eq!(
            field_labels(PROJECT_FIELDS),
            vec!["Location", "Start Date", "End Date", "Active", "Document Path", "Stage"]
        );
        assert_eq!(
            row_values(&v, PROJECT_FIELDS),
            vec!["Acre", "2024-01-01", "2024-06-01", "No", "", "Design"]
        );
    }

    #[test]
    fn test_task_fields() {
        let task = TaskView {
            id: 3,
            description: "חישוב שטחים".to_string(),
            is_done: true,
        };
        assert_eq!(row_values(&task, TASK_FIELDS), vec!["חישוב שטחים", "Yes"]);
        assert_eq!(field_labels(CONTACT_FIELDS).len(), 5);
    }

    #[test]
    fn test_sort_by_field() {
        let mut rows = vec![
            view(1, "Tel Aviv", "2024-03-01", true),
            view(2, "Acre", "2024-01-01", true),
            view(3, "Haifa", "2024-02-01", true),
        ];

        sort_by_field(&mut rows, PROJECT_FIELDS, "location", false).unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);

        sort_by_field(&mut rows, PROJECT_FIELDS, "Start Date", true).unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);

        let err = sort_by_field(&mut rows, PROJECT_FIELDS, "Budget", false).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
