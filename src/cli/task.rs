//! jb task command implementations.

use serde::Serialize;

use crate::board::{self, TaskDetails};
use crate::cascade;
use crate::create::plan_creation;
use crate::edit::plan_edit;
use crate::error::{Error, Result};
use crate::events::EventKind;
use crate::model::{Priority, Task, TaskState};
use crate::output::{emit_success, HumanOutput};
use crate::session::TaskFormSession;
use crate::store::{DocumentStore, WriteReport};

use super::{Context, Globals};

pub struct AddOptions {
    pub title: String,
    pub description: Option<String>,
    pub due: String,
    pub priority: Option<String>,
    pub category: String,
    pub state: Option<String>,
    pub subtasks: Vec<String>,
    pub contacts: Vec<String>,
    pub globals: Globals,
}

pub struct ShowOptions {
    pub id: String,
    pub globals: Globals,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub state: Option<String>,
    pub add_contacts: Vec<String>,
    pub remove_contacts: Vec<String>,
    pub add_subtasks: Vec<String>,
    pub remove_subtasks: Vec<String>,
    pub globals: Globals,
}

pub struct RmOptions {
    pub id: String,
    pub globals: Globals,
}

pub struct MvOptions {
    pub id: String,
    pub state: String,
    pub globals: Globals,
}

pub struct CheckOptions {
    pub id: String,
    pub undo: bool,
    pub globals: Globals,
}

#[derive(Serialize)]
struct TaskCreatedOutput<'a> {
    task: &'a Task,
    subtasks: usize,
    contacts: Vec<&'a str>,
    creator: Option<&'a str>,
    writes: usize,
}

#[derive(Serialize)]
struct TaskEditedOutput<'a> {
    task: &'a Task,
    changed: bool,
    contacts_added: &'a [String],
    contacts_removed: &'a [String],
    subtasks_added: usize,
    subtasks_removed: usize,
    subtasks_updated: usize,
    writes: usize,
}

#[derive(Serialize)]
struct TaskDeletedOutput<'a> {
    id: &'a str,
    writes: &'a WriteReport,
}

#[derive(Serialize)]
struct TaskMovedOutput<'a> {
    id: &'a str,
    state: TaskState,
}

#[derive(Serialize)]
struct SubtaskToggledOutput<'a> {
    id: &'a str,
    title: &'a str,
    checked: bool,
}

pub async fn run_add(options: AddOptions) -> Result<()> {
    let mut ctx = Context::open(&options.globals)?;
    let mut warnings = Vec::new();

    let state = match options.state.as_deref() {
        Some(raw) => raw.parse()?,
        None => ctx.config.board.state()?,
    };
    let mut session = TaskFormSession::new(state);
    session.title = options.title;
    session.description = options.description.unwrap_or_default();
    session.due_date.input(options.due.trim());
    session.priority = parse_priority(options.priority.as_deref(), &ctx)?;
    let (category_id, warning) = resolve_category(&ctx.store, &options.category).await?;
    warnings.extend(warning);
    session.category_id = Some(category_id);
    for contact_id in &options.contacts {
        if !session.is_selected(contact_id) {
            session.toggle_contact(contact_id);
        }
    }
    for title in &options.subtasks {
        session.add_subtask(title);
    }

    let creator = ctx.creator.clone();
    let task = Task::new(session.to_new_task()?)?;
    let plan = plan_creation(
        task,
        &session.subtask_titles(),
        session.contact_ids(),
        creator.as_deref(),
    );
    if creator.is_none() {
        warnings.push("no creator contact configured (use --as or JOIN_CONTACT_ID)".to_string());
    }
    let report = plan.persist(&ctx.store).await?;

    let output = TaskCreatedOutput {
        task: &plan.task,
        subtasks: plan.subtasks.len(),
        contacts: plan.assignments.iter().map(|a| a.contact_id.as_str()).collect(),
        creator: creator.as_deref(),
        writes: report.len(),
    };
    warnings.extend(ctx.emit(EventKind::TaskCreated, &output));

    let mut human = HumanOutput::new("Task created");
    human.push_summary("ID", plan.task.id.clone());
    human.push_summary("Title", plan.task.title.clone());
    human.push_summary("Column", plan.task.state_category.label());
    human.push_summary("Due", plan.task.due_date.clone());
    human.push_summary("Subtasks", plan.subtasks.len().to_string());
    human.push_summary("Contacts", plan.assignments.len().to_string());
    for warning in warnings {
        human.push_warning(warning);
    }
    human.push_next_step(format!("jb task show {}", plan.task.id));

    emit_success(ctx.output, "task add", &output, Some(&human))
}

pub async fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = Context::open(&options.globals)?;
    let details = board::require_task(&ctx.store, &options.id).await?;

    let human = describe_task(&details);
    emit_success(ctx.output, "task show", &details, Some(&human))
}

pub async fn run_edit(options: EditOptions) -> Result<()> {
    let mut ctx = Context::open(&options.globals)?;
    let mut warnings = Vec::new();
    let details = board::require_task(&ctx.store, &options.id).await?;

    let mut session = TaskFormSession::from_details(&details);
    if let Some(title) = options.title {
        session.title = title;
    }
    if let Some(description) = options.description {
        session.description = description;
    }
    if let Some(due) = options.due {
        session.due_date.input(due.trim());
    }
    if let Some(priority) = options.priority.as_deref() {
        session.priority = priority.parse()?;
    }
    if let Some(category) = options.category.as_deref() {
        let (category_id, warning) = resolve_category(&ctx.store, category).await?;
        warnings.extend(warning);
        session.category_id = Some(category_id);
    }
    if let Some(state) = options.state.as_deref() {
        session.state = state.parse()?;
    }
    for contact_id in &options.add_contacts {
        if !session.is_selected(contact_id) {
            session.toggle_contact(contact_id);
        }
    }
    for contact_id in &options.remove_contacts {
        if session.is_selected(contact_id) {
            session.toggle_contact(contact_id);
        } else {
            warnings.push(format!("contact {contact_id} was not assigned"));
        }
    }
    for subtask_id in &options.remove_subtasks {
        let index = session
            .subtasks()
            .iter()
            .position(|draft| draft.id.as_deref() == Some(subtask_id.as_str()))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "task {} has no subtask {subtask_id}",
                    details.task.id
                ))
            })?;
        session.remove_subtask(index)?;
    }
    for title in &options.add_subtasks {
        session.add_subtask(title);
    }

    let plan = plan_edit(&details, session.to_edit()?)?;
    let report = if plan.is_noop() {
        WriteReport::default()
    } else {
        plan.persist(&ctx.store).await?
    };

    let output = TaskEditedOutput {
        task: &plan.task,
        changed: !plan.is_noop(),
        contacts_added: &plan.contacts.added,
        contacts_removed: &plan.contacts.removed,
        subtasks_added: plan.subtasks.added.len(),
        subtasks_removed: plan.subtasks.removed.len(),
        subtasks_updated: plan.subtasks.updated.len(),
        writes: report.len(),
    };
    if output.changed {
        warnings.extend(ctx.emit(EventKind::TaskEdited, &output));
    }

    let header = if output.changed {
        "Task updated"
    } else {
        "Task unchanged"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", plan.task.id.clone());
    human.push_summary("Writes", report.len().to_string());
    if !plan.contacts.added.is_empty() {
        human.push_summary("Assigned", plan.contacts.added.join(", "));
    }
    if !plan.contacts.removed.is_empty() {
        human.push_summary("Unassigned", plan.contacts.removed.join(", "));
    }
    for warning in warnings {
        human.push_warning(warning);
    }

    emit_success(ctx.output, "task edit", &output, Some(&human))
}

pub async fn run_rm(options: RmOptions) -> Result<()> {
    let mut ctx = Context::open(&options.globals)?;
    let report = cascade::delete_task(&ctx.store, &options.id).await?;

    let output = TaskDeletedOutput {
        id: &options.id,
        writes: &report,
    };
    let warning = ctx.emit(EventKind::TaskDeleted, &output);

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", options.id.clone());
    human.push_summary("Rows removed", report.len().to_string());
    if let Some(warning) = warning {
        human.push_warning(warning);
    }

    emit_success(ctx.output, "task rm", &output, Some(&human))
}

pub async fn run_mv(options: MvOptions) -> Result<()> {
    let mut ctx = Context::open(&options.globals)?;
    let state: TaskState = options.state.parse()?;
    board::move_task(&ctx.store, &options.id, state).await?;

    let output = TaskMovedOutput {
        id: &options.id,
        state,
    };
    let warning = ctx.emit(EventKind::TaskMoved, &output);

    let mut human = HumanOutput::new(format!("Task moved to {}", state.label()));
    human.push_summary("ID", options.id.clone());
    if let Some(warning) = warning {
        human.push_warning(warning);
    }

    emit_success(ctx.output, "task mv", &output, Some(&human))
}

pub async fn run_check(options: CheckOptions) -> Result<()> {
    let mut ctx = Context::open(&options.globals)?;
    let subtask = board::set_subtask_checked(&ctx.store, &options.id, !options.undo).await?;

    let output = SubtaskToggledOutput {
        id: &subtask.id,
        title: &subtask.title,
        checked: subtask.task_checked,
    };
    let warning = ctx.emit(EventKind::SubtaskToggled, &output);

    let header = if subtask.task_checked {
        "Subtask checked"
    } else {
        "Subtask unchecked"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", subtask.id.clone());
    human.push_summary("Title", subtask.title.clone());
    if let Some(warning) = warning {
        human.push_warning(warning);
    }

    emit_success(ctx.output, "task check", &output, Some(&human))
}

fn parse_priority(raw: Option<&str>, ctx: &Context) -> Result<Priority> {
    match raw {
        Some(value) => value.parse(),
        None => ctx.config.board.priority(),
    }
}

/// Accept a category id or a case-insensitive name. Unknown values are used
/// as ids as given, with a warning.
async fn resolve_category(
    store: &dyn DocumentStore,
    raw: &str,
) -> Result<(String, Option<String>)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::InvalidArgument("category cannot be empty".to_string()));
    }
    let categories = board::list_categories(store).await?;
    let found = categories
        .iter()
        .find(|category| category.id == raw)
        .or_else(|| {
            categories
                .iter()
                .find(|category| category.name.eq_ignore_ascii_case(raw))
        });
    match found {
        Some(category) => Ok((category.id.clone(), None)),
        None => Ok((
            raw.to_string(),
            Some(format!("category '{raw}' is not in the categories table")),
        )),
    }
}

fn describe_task(details: &TaskDetails) -> HumanOutput {
    let task = &details.task;
    let mut human = HumanOutput::new(task.title.clone());
    human.push_summary("ID", task.id.clone());
    human.push_summary("Column", task.state_category.label());
    human.push_summary("Due", task.due_date.clone());
    human.push_summary("Priority", task.priority.as_str());
    human.push_summary("Category", task.category_id.clone());
    if !task.description.is_empty() {
        human.push_summary("Description", task.description.clone());
    }
    let (done, total) = details.progress();
    human.push_summary("Subtasks", format!("{done}/{total}"));
    if !details.contacts.is_empty() {
        let names: Vec<String> = details.contacts.iter().map(|c| c.full_name()).collect();
        human.push_summary("Contacts", names.join(", "));
    }
    for subtask in &details.subtasks {
        let mark = if subtask.task_checked { "x" } else { " " };
        human.push_detail(format!("[{mark}] {} ({})", subtask.title, subtask.id));
    }
    human
}
