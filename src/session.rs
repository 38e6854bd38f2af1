//! Add/edit task form state.
//!
//! One [`TaskFormSession`] lives as long as a task dialog is open. It owns
//! the selections the user makes (contacts, subtask drafts, priority) and the
//! due-date field, and turns them into a [`NewTask`] or a [`TaskEdit`].

use serde::Serialize;

use crate::board::TaskDetails;
use crate::due_date::DueDateField;
use crate::edit::{SubtaskDraft, TaskEdit};
use crate::error::{Error, Result};
use crate::model::{NewTask, Priority, TaskState};

/// Which required inputs are missing or wrong. All `false` means the form
/// can be submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FormValidation {
    pub title_missing: bool,
    pub due_date_invalid: bool,
    pub category_missing: bool,
}

impl FormValidation {
    pub fn is_ok(&self) -> bool {
        !(self.title_missing || self.due_date_invalid || self.category_missing)
    }

    fn problems(&self) -> Vec<&'static str> {
        let mut problems = Vec::new();
        if self.title_missing {
            problems.push("title is required");
        }
        if self.due_date_invalid {
            problems.push("due date must be a future dd/mm/yyyy date");
        }
        if self.category_missing {
            problems.push("category is required");
        }
        problems
    }
}

#[derive(Debug, Clone)]
pub struct TaskFormSession {
    pub title: String,
    pub description: String,
    pub due_date: DueDateField,
    pub priority: Priority,
    pub category_id: Option<String>,
    /// Column the task is created in
    pub state: TaskState,
    contact_ids: Vec<String>,
    subtasks: Vec<SubtaskDraft>,
    /// Set when editing an existing task
    task_id: Option<String>,
}

impl Default for TaskFormSession {
    fn default() -> Self {
        Self::new(TaskState::Todo)
    }
}

impl TaskFormSession {
    /// Empty add-task form targeting `state`.
    pub fn new(state: TaskState) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            due_date: DueDateField::new(),
            priority: Priority::Medium,
            category_id: None,
            state,
            contact_ids: Vec::new(),
            subtasks: Vec::new(),
            task_id: None,
        }
    }

    /// Swap in a due-date field, e.g. one pinned to a fixed clock.
    pub fn with_due_date_field(mut self, field: DueDateField) -> Self {
        self.due_date = field;
        self
    }

    /// Edit form prefilled from a stored task.
    pub fn from_details(details: &TaskDetails) -> Self {
        let task = &details.task;
        let mut session = Self::new(task.state_category);
        session.title = task.title.clone();
        session.description = task.description.clone();
        session.due_date.prefill(&task.due_date);
        session.priority = task.priority;
        session.category_id = Some(task.category_id.clone());
        session.task_id = Some(task.id.clone());
        for contact_id in details.contact_ids() {
            if !session.contact_ids.contains(&contact_id) {
                session.contact_ids.push(contact_id);
            }
        }
        session.subtasks = details.subtasks.iter().map(SubtaskDraft::existing).collect();
        session
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn is_editing(&self) -> bool {
        self.task_id.is_some()
    }

    pub fn contact_ids(&self) -> &[String] {
        &self.contact_ids
    }

    pub fn is_selected(&self, contact_id: &str) -> bool {
        self.contact_ids.iter().any(|id| id == contact_id)
    }

    /// Select or deselect a contact. Returns whether it is now selected.
    pub fn toggle_contact(&mut self, contact_id: &str) -> bool {
        if let Some(index) = self.contact_ids.iter().position(|id| id == contact_id) {
            self.contact_ids.remove(index);
            false
        } else {
            self.contact_ids.push(contact_id.to_string());
            true
        }
    }

    pub fn subtasks(&self) -> &[SubtaskDraft] {
        &self.subtasks
    }

    /// Append a subtask draft; blank titles are ignored.
    pub fn add_subtask(&mut self, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        self.subtasks.push(SubtaskDraft::new(title));
        true
    }

    /// Rename a draft. A blank title removes it.
    pub fn edit_subtask(&mut self, index: usize, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return self.remove_subtask(index).map(|_| ());
        }
        let draft = self.draft_mut(index)?;
        draft.title = title.to_string();
        Ok(())
    }

    pub fn remove_subtask(&mut self, index: usize) -> Result<SubtaskDraft> {
        self.draft_mut(index)?;
        Ok(self.subtasks.remove(index))
    }

    pub fn toggle_subtask(&mut self, index: usize) -> Result<bool> {
        let draft = self.draft_mut(index)?;
        draft.checked = !draft.checked;
        Ok(draft.checked)
    }

    fn draft_mut(&mut self, index: usize) -> Result<&mut SubtaskDraft> {
        let len = self.subtasks.len();
        self.subtasks.get_mut(index).ok_or_else(|| {
            Error::InvalidArgument(format!("no subtask at index {index} (have {len})"))
        })
    }

    /// Check required inputs. Runs the due-date check as a blur would.
    pub fn validate(&mut self) -> FormValidation {
        FormValidation {
            title_missing: self.title.trim().is_empty(),
            due_date_invalid: !self.due_date.blur().valid,
            category_missing: self
                .category_id
                .as_deref()
                .map_or(true, |id| id.trim().is_empty()),
        }
    }

    fn ensure_valid(&mut self) -> Result<()> {
        let validation = self.validate();
        if validation.is_ok() {
            return Ok(());
        }
        if !validation.title_missing && !validation.category_missing {
            return Err(Error::InvalidDueDate(self.due_date.value().to_string()));
        }
        Err(Error::InvalidArgument(validation.problems().join("; ")))
    }

    /// Field values for the creation flow.
    pub fn to_new_task(&mut self) -> Result<NewTask> {
        self.ensure_valid()?;
        Ok(NewTask {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            due_date: self.due_date.value().to_string(),
            priority: self.priority,
            category_id: self.category_id.clone().unwrap_or_default(),
            state: self.state,
        })
    }

    /// Subtask titles for the creation flow, in form order.
    pub fn subtask_titles(&self) -> Vec<String> {
        self.subtasks.iter().map(|draft| draft.title.clone()).collect()
    }

    /// Desired state for the edit flow.
    pub fn to_edit(&mut self) -> Result<TaskEdit> {
        if self.task_id.is_none() {
            return Err(Error::InvalidArgument(
                "form is not editing an existing task".to_string(),
            ));
        }
        self.ensure_valid()?;
        Ok(TaskEdit {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            due_date: self.due_date.value().to_string(),
            priority: self.priority,
            contact_ids: self.contact_ids.clone(),
            subtasks: self.subtasks.clone(),
            category_id: self.category_id.clone(),
            state: Some(self.state),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::model::{Subtask, Task};

    fn field() -> DueDateField {
        let now = NaiveDate::from_ymd_opt(2026, 10, 16)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        DueDateField::at(now)
    }

    fn filled() -> TaskFormSession {
        let mut session = TaskFormSession::default().with_due_date_field(field());
        session.title = "Design review".to_string();
        session.due_date.input("15/06/2030");
        session.category_id = Some("cat".to_string());
        session
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(TaskFormSession::default().priority, Priority::Medium);
    }

    #[test]
    fn validate_reports_each_missing_field() {
        let mut session = TaskFormSession::default().with_due_date_field(field());
        let validation = session.validate();
        assert!(validation.title_missing);
        assert!(validation.due_date_invalid);
        assert!(validation.category_missing);
        assert!(!validation.is_ok());

        assert!(filled().validate().is_ok());
    }

    #[test]
    fn past_date_alone_is_a_due_date_error() {
        let mut session = filled();
        session.due_date.input("15/06/2020");
        assert!(matches!(session.to_new_task(), Err(Error::InvalidDueDate(_))));
    }

    #[test]
    fn contacts_toggle_on_and_off() {
        let mut session = filled();
        assert!(session.toggle_contact("c1"));
        assert!(session.toggle_contact("c2"));
        assert!(!session.toggle_contact("c1"));
        assert_eq!(session.contact_ids(), ["c2".to_string()]);
    }

    #[test]
    fn subtask_drafts_can_be_edited_and_removed() {
        let mut session = filled();
        assert!(session.add_subtask(" one "));
        assert!(!session.add_subtask("  "));
        assert!(session.add_subtask("two"));
        session.edit_subtask(1, "second").unwrap();
        assert_eq!(session.subtask_titles(), vec!["one", "second"]);

        session.edit_subtask(0, " ").unwrap();
        assert_eq!(session.subtask_titles(), vec!["second"]);
        assert!(session.remove_subtask(5).is_err());
    }

    #[test]
    fn to_new_task_carries_form_values() {
        let mut session = filled();
        session.priority = Priority::Urgent;
        let task = session.to_new_task().unwrap();
        assert_eq!(task.title, "Design review");
        assert_eq!(task.due_date, "15/06/2030");
        assert_eq!(task.priority, Priority::Urgent);
        assert_eq!(task.state, TaskState::Todo);
    }

    #[test]
    fn edit_round_trip_keeps_ids() {
        let details = TaskDetails {
            task: Task {
                id: "t1".to_string(),
                title: "Old".to_string(),
                description: String::new(),
                // already in the past but still accepted when prefilled
                due_date: "01/01/2024".to_string(),
                priority: Priority::Low,
                category_id: "cat".to_string(),
                state_category: TaskState::Awaiting,
            },
            subtasks: vec![Subtask {
                id: "s1".to_string(),
                title: "Sub".to_string(),
                task_checked: true,
                position: 0,
            }],
            links: Vec::new(),
            assignments: Vec::new(),
            contacts: Vec::new(),
        };
        let mut session = TaskFormSession::from_details(&details);
        assert!(session.is_editing());
        session.title = "New".to_string();

        let edit = session.to_edit().unwrap();
        assert_eq!(edit.title, "New");
        assert_eq!(edit.state, Some(TaskState::Awaiting));
        assert_eq!(edit.subtasks[0].id.as_deref(), Some("s1"));
        assert!(edit.subtasks[0].checked);

        assert!(filled().to_edit().is_err());
    }
}
