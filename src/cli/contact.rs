//! jb contact command implementations.

use serde::Serialize;

use crate::contacts::{self, ContactGroup, NewContact};
use crate::error::Result;
use crate::events::EventKind;
use crate::model::Contact;
use crate::output::{emit_success, HumanOutput};
use crate::store::WriteReport;

use super::{Context, Globals};

pub struct AddOptions {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub globals: Globals,
}

pub struct EditOptions {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub globals: Globals,
}

pub struct RmOptions {
    pub id: String,
    pub globals: Globals,
}

#[derive(Serialize)]
struct ContactListOutput<'a> {
    total: usize,
    groups: &'a [ContactGroup],
}

#[derive(Serialize)]
struct ContactDeletedOutput<'a> {
    id: &'a str,
    writes: &'a WriteReport,
}

pub async fn run_add(options: AddOptions) -> Result<()> {
    let mut ctx = Context::open(&options.globals)?;
    let mut fields = NewContact::from_full_name(&options.name);
    fields.email = options.email.unwrap_or_default();
    fields.phone = options.phone.unwrap_or_default();

    let contact = contacts::create_contact(&ctx.store, fields).await?;
    let warning = ctx.emit(EventKind::ContactCreated, &contact);

    let mut human = describe_contact("Contact created", &contact);
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    emit_success(ctx.output, "contact add", &contact, Some(&human))
}

pub async fn run_ls(globals: Globals) -> Result<()> {
    let ctx = Context::open(&globals)?;
    let list = contacts::list_contacts(&ctx.store).await?;
    let groups = contacts::group_by_letter(&list);

    let mut human = HumanOutput::new("Contacts");
    human.push_summary("Total", list.len().to_string());
    for group in &groups {
        human.push_detail(group.letter.to_string());
        for contact in &group.contacts {
            let email = if contact.email.is_empty() {
                String::new()
            } else {
                format!("  <{}>", contact.email)
            };
            human.push_detail(format!(
                "  {} {}{email}  ({})",
                contact.initials,
                contact.full_name(),
                contact.id
            ));
        }
    }

    let output = ContactListOutput {
        total: list.len(),
        groups: &groups,
    };
    emit_success(ctx.output, "contact ls", &output, Some(&human))
}

pub async fn run_edit(options: EditOptions) -> Result<()> {
    let mut ctx = Context::open(&options.globals)?;
    let current = contacts::require_contact(&ctx.store, &options.id).await?;

    let mut fields = match options.name.as_deref() {
        Some(name) => NewContact::from_full_name(name),
        None => NewContact {
            firstname: current.firstname.clone(),
            lastname: current.lastname.clone(),
            ..NewContact::default()
        },
    };
    fields.email = options.email.unwrap_or(current.email);
    fields.phone = options.phone.unwrap_or(current.phone);

    let contact = contacts::update_contact(&ctx.store, &options.id, fields).await?;
    let warning = ctx.emit(EventKind::ContactUpdated, &contact);

    let mut human = describe_contact("Contact updated", &contact);
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    emit_success(ctx.output, "contact edit", &contact, Some(&human))
}

pub async fn run_rm(options: RmOptions) -> Result<()> {
    let mut ctx = Context::open(&options.globals)?;
    let report = contacts::delete_contact(&ctx.store, &options.id).await?;

    let output = ContactDeletedOutput {
        id: &options.id,
        writes: &report,
    };
    let warning = ctx.emit(EventKind::ContactDeleted, &output);

    let mut human = HumanOutput::new("Contact deleted");
    human.push_summary("ID", options.id.clone());
    human.push_summary("Assignments removed", (report.len() - 1).to_string());
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    emit_success(ctx.output, "contact rm", &output, Some(&human))
}

fn describe_contact(header: &str, contact: &Contact) -> HumanOutput {
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", contact.id.clone());
    human.push_summary("Name", contact.full_name());
    human.push_summary("Initials", contact.initials.clone());
    human.push_summary("Color", contact.color_tag.clone());
    if !contact.email.is_empty() {
        human.push_summary("Email", contact.email.clone());
    }
    if !contact.phone.is_empty() {
        human.push_summary("Phone", contact.phone.clone());
    }
    human
}
