//! Contact management commands
//!
//! Customers, constructors, inspectors and consultants share one table; the
//! role a contact plays is recorded per project in `project_roles`.

use crate::Result;
use crate::storage::Database;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A person the firm works with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl Contact {
    /// Name shown in role slots and pickers: first and last name joined by a
    /// single space, untrimmed.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Field values for a contact that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl NewContact {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: i64,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
}

impl ContactRow {
    fn into_contact(self) -> Contact {
        Contact {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            address: self.address.unwrap_or_default(),
        }
    }
}

const SELECT_CONTACT: &str =
    "SELECT id, first_name, last_name, phone, email, address FROM contacts";

/// Contact repository for database operations
pub struct ContactRepository<'a> {
    db: &'a Database,
}

impl<'a> ContactRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a contact and return its identifier
    pub async fn create(&self, contact: &NewContact) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO contacts (first_name, last_name, phone, email, address)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.phone)
        .bind(&contact.email)
        .bind(&contact.address)
        .execute(self.db.pool())
        .await?;

        let id = result.last_insert_rowid();
        info!(contact_id = id, "Contact created");
        Ok(id)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Contact>> {
        let row: Option<ContactRow> = sqlx::query_as(&format!("{} WHERE id = ?", SELECT_CONTACT))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(ContactRow::into_contact))
    }

    /// List contacts in insertion order, optionally filtered by a substring
    /// of the first or last name
    pub async fn list(&self, search: &str) -> Result<Vec<Contact>> {
        let rows: Vec<ContactRow> = sqlx::query_as(&format!(
            "{} WHERE (? = '' OR first_name LIKE '%' || ? || '%' OR last_name LIKE '%' || ? || '%') ORDER BY id",
            SELECT_CONTACT
        ))
        .bind(search)
        .bind(search)
        .bind(search)
        .fetch_all(self.db.pool())
        .await?;

        debug!(count = rows.len(), search = %search, "Listed contacts");
        Ok(rows.into_iter().map(ContactRow::into_contact).collect())
    }

    pub async fn update(&self, contact: &Contact) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE contacts
            SET first_name = ?, last_name = ?, phone = ?, email = ?, address = ?
            WHERE id = ?
            "#,
        )
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.phone)
        .bind(&contact.email)
        .bind(&contact.address)
        .bind(contact.id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a contact after removing every role assignment that points at it
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let mut tx = self.db.pool().begin().await?;

        let roles = sqlx::query("DELETE FROM project_roles WHERE contact_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        tx.commit().await?;

        if deleted {
            info!(contact_id = id, roles, "Contact deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> Database {
        Database::in_memory()
            .await
            .expect("Failed to create database")
    }

    #[test]
    fn test_display_name_is_not_trimmed() {
        let contact = Contact {
            id: 1,
            first_name: "Noa".to_string(),
            last_name: String::new(),
            phone: String::new(),
            email: String::new(),
            address: String::new(),
        };
        assert_eq!(contact.display_name(), "Noa ");
    }

    #[tokio::test]
    async fn test_create_get_update_contact() {
        let db = setup().await;
        let repo = ContactRepository::new(&db);

        let id = repo
            .create(
                &NewContact::new("Dana", "Levi")
                    .with_phone("050-1234567")
                    .with_email("dana@example.com")
                    .with_address("Herzl 1"),
            )
            .await
            .unwrap();

        let mut contact = repo.get(id).await.unwrap().expect("Contact should exist");
        assert_eq!(contact.display_name(), "Dana Levi");
        assert_eq!(contact.phone, "050-1234567");

        contact.email = "dana@levi.co.il".to_string();
        assert!(repo.update(&contact).await.unwrap());
        assert_eq!(repo.get(id).await.unwrap().unwrap().email, "dana@levi.co.il");
    }

    #[tokio::test]
    async fn test_list_contacts_matches_first_or_last_name() {
        let db = setup().await;
        let repo = ContactRepository::new(&db);

        repo.create(&NewContact::new("Dana", "Levi")).await.unwrap();
        repo.create(&NewContact::new("Avi", "Cohen")).await.unwrap();
        repo.create(&NewContact::new("Levana", "Mizrahi")).await.unwrap();

        assert_eq!(repo.list("").await.unwrap().len(), 3);

        let lev: Vec<String> = repo
            .list("Lev")
            .await
            .unwrap()
            .iter()
            .map(Contact::display_name)
            .collect();
        assert_eq!(lev, vec!["Dana Levi", "Levana Mizrahi"]);
    }

    #[tokio::test]
    async fn test_delete_contact_removes_roles_first() {
        let db = setup().await;
        let repo = ContactRepository::new(&db);

        let id = repo.create(&NewContact::new("Dana", "Levi")).await.unwrap();
        sqlx::query("INSERT INTO projects (location, start_date, active) VALUES ('Acre', '2024-01-01', 1)")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO project_roles (project_id, contact_id, role) VALUES (1, ?, 'Inspector')")
            .bind(id)
            .execute(db.pool())
            .await
            .unwrap();

        assert!(repo.delete(id).await.unwrap());
        assert!(repo.get(id).await.unwrap().is_none());

        let (roles,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM project_roles")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(roles, 0);
    }
}
