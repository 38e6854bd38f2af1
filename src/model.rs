//! Entity records stored in the document store.
//!
//! Every table holds flat rows keyed by `id`. Field names are camelCase on the
//! wire so rows written by the browser client and by this crate are
//! interchangeable.
//!
//! Tasks reach their subtasks and contacts only through the join tables
//! (`taskSubtask`, `taskContactAssigned`); nothing is denormalized onto the
//! task row itself.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::due_date;
use crate::error::{Error, Result};

/// Table names in the document store
pub mod tables {
    pub const TASKS: &str = "tasks";
    pub const SUBTASKS: &str = "subTasks";
    pub const SUBTASK_LINKS: &str = "taskSubtask";
    pub const CONTACT_ASSIGNMENTS: &str = "taskContactAssigned";
    pub const CONTACTS: &str = "contacts";
    pub const CATEGORIES: &str = "categories";
}

/// A row type living in exactly one table.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    const TABLE: &'static str;

    fn id(&self) -> &str;

    /// Store path of this row (`<table>/<id>`)
    fn path(&self) -> String {
        format!("{}/{}", Self::TABLE, self.id())
    }
}

/// Generate a fresh globally unique row id
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Urgent,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Urgent, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "invalid priority '{trimmed}' (expected Urgent|Medium|Low)"
                ))
            })
    }
}

/// Board column a task lives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    #[default]
    Todo,
    InProgress,
    Awaiting,
    Done,
}

impl TaskState {
    /// Column order on the board
    pub const ALL: [TaskState; 4] = [
        TaskState::Todo,
        TaskState::InProgress,
        TaskState::Awaiting,
        TaskState::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Todo => "todo",
            TaskState::InProgress => "inprogress",
            TaskState::Awaiting => "awaiting",
            TaskState::Done => "done",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskState::Todo => "To do",
            TaskState::InProgress => "In progress",
            TaskState::Awaiting => "Await feedback",
            TaskState::Done => "Done",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-' && !ch.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "todo" => Ok(TaskState::Todo),
            "inprogress" => Ok(TaskState::InProgress),
            "awaiting" | "awaitfeedback" => Ok(TaskState::Awaiting),
            "done" => Ok(TaskState::Done),
            _ => Err(Error::InvalidArgument(format!(
                "invalid state '{}' (expected todo|inprogress|awaiting|done)",
                raw.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `dd/mm/yyyy`
    pub due_date: String,
    #[serde(default)]
    pub priority: Priority,
    pub category_id: String,
    #[serde(default)]
    pub state_category: TaskState,
}

/// Field values for a task that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: Priority,
    pub category_id: String,
    pub state: TaskState,
}

impl Task {
    /// Build a task with a freshly generated id.
    ///
    /// Title and category are required and the due date must be a real
    /// `dd/mm/yyyy` calendar date. Whether the date lies in the future is the
    /// form's concern, not the record's.
    pub fn new(fields: NewTask) -> Result<Self> {
        let title = fields.title.trim();
        if title.is_empty() {
            return Err(Error::InvalidArgument("task title cannot be empty".to_string()));
        }
        let category_id = fields.category_id.trim();
        if category_id.is_empty() {
            return Err(Error::InvalidArgument("task category cannot be empty".to_string()));
        }
        let due_date = fields.due_date.trim();
        if due_date::parse_due_date(due_date).is_none() {
            return Err(Error::InvalidDueDate(due_date.to_string()));
        }

        Ok(Self {
            id: new_id(),
            title: title.to_string(),
            description: fields.description.trim().to_string(),
            due_date: due_date.to_string(),
            priority: fields.priority,
            category_id: category_id.to_string(),
            state_category: fields.state,
        })
    }
}

impl Record for Task {
    const TABLE: &'static str = tables::TASKS;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Checklist item owned by exactly one task through a [`SubtaskLink`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub task_checked: bool,
    #[serde(default)]
    pub position: u32,
}

impl Subtask {
    pub fn new(title: impl Into<String>, position: u32) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            task_checked: false,
            position,
        }
    }
}

impl Record for Subtask {
    const TABLE: &'static str = tables::SUBTASKS;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskLink {
    pub id: String,
    pub main_task_id: String,
    pub sub_task_id: String,
}

impl SubtaskLink {
    pub fn new(task_id: impl Into<String>, subtask_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            main_task_id: task_id.into(),
            sub_task_id: subtask_id.into(),
        }
    }
}

impl Record for SubtaskLink {
    const TABLE: &'static str = tables::SUBTASK_LINKS;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAssignment {
    pub id: String,
    pub task_id: String,
    pub contact_id: String,
}

impl ContactAssignment {
    pub fn new(task_id: impl Into<String>, contact_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            task_id: task_id.into(),
            contact_id: contact_id.into(),
        }
    }
}

impl Record for ContactAssignment {
    const TABLE: &'static str = tables::CONTACT_ASSIGNMENTS;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub initials: String,
    #[serde(default)]
    pub color_tag: String,
}

impl Contact {
    pub fn full_name(&self) -> String {
        if self.lastname.is_empty() {
            self.firstname.clone()
        } else {
            format!("{} {}", self.firstname, self.lastname)
        }
    }
}

impl Record for Contact {
    const TABLE: &'static str = tables::CONTACTS;

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color_tag: String,
}

impl Record for Category {
    const TABLE: &'static str = tables::CATEGORIES;

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task() -> NewTask {
        NewTask {
            title: "  Write release notes ".to_string(),
            description: "for 1.2".to_string(),
            due_date: "15/06/2030".to_string(),
            priority: Priority::Urgent,
            category_id: "cat-1".to_string(),
            state: TaskState::Todo,
        }
    }

    #[test]
    fn task_serializes_with_camel_case_fields() {
        let task = Task::new(new_task()).unwrap();
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["title"], "Write release notes");
        assert_eq!(value["dueDate"], "15/06/2030");
        assert_eq!(value["categoryId"], "cat-1");
        assert_eq!(value["stateCategory"], "todo");
        assert_eq!(value["priority"], "Urgent");
    }

    #[test]
    fn in_progress_state_uses_wire_name() {
        let value = serde_json::to_value(TaskState::InProgress).unwrap();
        assert_eq!(value, "inprogress");
        let parsed: TaskState = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, TaskState::InProgress);
    }

    #[test]
    fn task_state_parses_loose_spellings() {
        assert_eq!("in_progress".parse::<TaskState>().unwrap(), TaskState::InProgress);
        assert_eq!("In-Progress".parse::<TaskState>().unwrap(), TaskState::InProgress);
        assert_eq!("await feedback".parse::<TaskState>().unwrap(), TaskState::Awaiting);
        assert!("backlog".parse::<TaskState>().is_err());
    }

    #[test]
    fn priority_parse_is_case_insensitive() {
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!(" LOW ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("P0".parse::<Priority>().is_err());
    }

    #[test]
    fn task_requires_title_category_and_real_date() {
        let mut fields = new_task();
        fields.title = "   ".to_string();
        assert!(matches!(Task::new(fields), Err(Error::InvalidArgument(_))));

        let mut fields = new_task();
        fields.category_id = String::new();
        assert!(matches!(Task::new(fields), Err(Error::InvalidArgument(_))));

        let mut fields = new_task();
        fields.due_date = "31/02/2030".to_string();
        assert!(matches!(Task::new(fields), Err(Error::InvalidDueDate(_))));
    }

    #[test]
    fn sparse_rows_deserialize_with_defaults() {
        let raw = serde_json::json!({
            "id": "s1",
            "title": "Draft",
        });
        let subtask: Subtask = serde_json::from_value(raw).unwrap();
        assert!(!subtask.task_checked);
        assert_eq!(subtask.position, 0);

        let raw = serde_json::json!({ "id": "c1", "firstname": "Ada" });
        let contact: Contact = serde_json::from_value(raw).unwrap();
        assert_eq!(contact.full_name(), "Ada");
    }

    #[test]
    fn record_path_joins_table_and_id() {
        let link = SubtaskLink::new("t1", "s1");
        assert_eq!(link.path(), format!("taskSubtask/{}", link.id));
    }
}
