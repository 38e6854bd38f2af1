//! Contacts and their lifecycle.
//!
//! Contacts are shared across tasks. Deleting one removes its assignment rows
//! first so no task is left pointing at it.

use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{new_id, Contact, ContactAssignment};
use crate::store::{
    delete_record, fetch_all, fetch_one, fetch_where, put_record, DocumentStore, WriteJournal,
    WriteReport,
};

/// Badge colours, handed out round-robin as contacts are created.
pub const COLOR_PALETTE: [&str; 15] = [
    "#FF7A00", "#FF5EB3", "#6E52FF", "#9327FF", "#00BEE8", "#1FD7C1", "#FF745E", "#FFA35E",
    "#FC71FF", "#FFC701", "#0038FF", "#C3FF2B", "#FFE62B", "#FF4646", "#FFBB2B",
];

/// Editable contact fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContact {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub phone: String,
}

impl NewContact {
    /// Split "First Rest Of Name" at the first whitespace.
    pub fn from_full_name(name: &str) -> Self {
        let name = name.trim();
        let (first, last) = name.split_once(char::is_whitespace).unwrap_or((name, ""));
        Self {
            firstname: first.to_string(),
            lastname: last.trim().to_string(),
            ..Self::default()
        }
    }

    fn validated(self) -> Result<Self> {
        let contact = Self {
            firstname: self.firstname.trim().to_string(),
            lastname: self.lastname.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
        };
        if contact.firstname.is_empty() {
            return Err(Error::InvalidArgument(
                "contact first name cannot be empty".to_string(),
            ));
        }
        if !contact.email.is_empty() && !contact.email.contains('@') {
            return Err(Error::InvalidArgument(format!(
                "invalid email address '{}'",
                contact.email
            )));
        }
        Ok(contact)
    }
}

/// Uppercase first letters of first and last name.
pub fn initials(firstname: &str, lastname: &str) -> String {
    [firstname, lastname]
        .iter()
        .filter_map(|name| name.trim().chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn color_for(index: usize) -> &'static str {
    COLOR_PALETTE[index % COLOR_PALETTE.len()]
}

pub async fn create_contact(store: &dyn DocumentStore, fields: NewContact) -> Result<Contact> {
    let fields = fields.validated()?;
    let existing = fetch_all::<Contact>(store).await?.len();
    let contact = Contact {
        id: new_id(),
        initials: initials(&fields.firstname, &fields.lastname),
        color_tag: color_for(existing).to_string(),
        firstname: fields.firstname,
        lastname: fields.lastname,
        email: fields.email,
        phone: fields.phone,
    };
    put_record(store, &contact).await?;
    info!(contact_id = %contact.id, "contact created");
    Ok(contact)
}

/// Replace a contact's fields. Initials are recomputed; the colour stays.
pub async fn update_contact(
    store: &dyn DocumentStore,
    contact_id: &str,
    fields: NewContact,
) -> Result<Contact> {
    let fields = fields.validated()?;
    let current = require_contact(store, contact_id).await?;
    let contact = Contact {
        id: current.id,
        initials: initials(&fields.firstname, &fields.lastname),
        color_tag: current.color_tag,
        firstname: fields.firstname,
        lastname: fields.lastname,
        email: fields.email,
        phone: fields.phone,
    };
    put_record(store, &contact).await?;
    info!(contact_id, "contact updated");
    Ok(contact)
}

/// Remove a contact and every assignment that references it.
pub async fn delete_contact(store: &dyn DocumentStore, contact_id: &str) -> Result<WriteReport> {
    require_contact(store, contact_id).await?;
    let mut journal = WriteJournal::new("delete contact");

    let assignments = fetch_where::<ContactAssignment>(store, "contactId", contact_id).await?;
    for assignment in &assignments {
        journal.record(
            format!("unassign {}", assignment.task_id),
            delete_record::<ContactAssignment>(store, &assignment.id).await,
        )?;
    }
    journal.record(
        format!("contact {contact_id}"),
        delete_record::<Contact>(store, contact_id).await,
    )?;

    info!(contact_id, assignments = assignments.len(), "contact deleted");
    Ok(journal.finish())
}

pub async fn require_contact(store: &dyn DocumentStore, contact_id: &str) -> Result<Contact> {
    fetch_one::<Contact>(store, contact_id)
        .await?
        .ok_or_else(|| Error::ContactNotFound(contact_id.to_string()))
}

/// All contacts, by first then last name (case-insensitive).
pub async fn list_contacts(store: &dyn DocumentStore) -> Result<Vec<Contact>> {
    let mut contacts = fetch_all::<Contact>(store).await?;
    sort_contacts(&mut contacts);
    Ok(contacts)
}

pub fn sort_contacts(contacts: &mut [Contact]) {
    contacts.sort_by_cached_key(|c| {
        (
            c.firstname.to_lowercase(),
            c.lastname.to_lowercase(),
            c.id.clone(),
        )
    });
}

/// Contacts sharing a first letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactGroup {
    pub letter: char,
    pub contacts: Vec<Contact>,
}

/// Group sorted contacts under the uppercase first letter of their first
/// name. Input order is kept inside each group.
pub fn group_by_letter(contacts: &[Contact]) -> Vec<ContactGroup> {
    let mut groups: Vec<ContactGroup> = Vec::new();
    for contact in contacts {
        let letter = contact
            .firstname
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
            .unwrap_or('#');
        match groups.last_mut() {
            Some(group) if group.letter == letter => group.contacts.push(contact.clone()),
            _ => groups.push(ContactGroup {
                letter,
                contacts: vec![contact.clone()],
            }),
        }
    }
    groups
}
