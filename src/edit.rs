//! Task edit reconciliation.
//!
//! An edit compares the task as stored ([`TaskDetails`]) with the state the
//! form asks for ([`TaskEdit`]) and writes only the difference: scalar fields
//! when they changed, join rows for contacts that were added or removed, and
//! subtask rows that were added, removed or changed. Untouched relations
//! produce no writes at all.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::board::TaskDetails;
use crate::due_date::parse_due_date;
use crate::error::{Error, Result};
use crate::model::{ContactAssignment, Priority, Subtask, SubtaskLink, Task, TaskState};
use crate::store::{
    delete_record, put_record, update_record, DocumentStore, WriteJournal, WriteReport,
};

/// A subtask as the edit form holds it. `id` is `None` for new entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubtaskDraft {
    pub id: Option<String>,
    pub title: String,
    pub checked: bool,
}

impl SubtaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            checked: false,
        }
    }

    pub fn existing(subtask: &Subtask) -> Self {
        Self {
            id: Some(subtask.id.clone()),
            title: subtask.title.clone(),
            checked: subtask.task_checked,
        }
    }
}

/// Desired state of a task after editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: Priority,
    pub contact_ids: Vec<String>,
    /// Desired subtasks in display order
    pub subtasks: Vec<SubtaskDraft>,
    /// Keeps the current category when `None`
    pub category_id: Option<String>,
    /// Keeps the current column when `None`
    pub state: Option<TaskState>,
}

impl TaskEdit {
    /// An edit that changes nothing; callers adjust fields from here.
    pub fn from_details(details: &TaskDetails) -> Self {
        Self {
            title: details.task.title.clone(),
            description: details.task.description.clone(),
            due_date: details.task.due_date.clone(),
            priority: details.task.priority,
            contact_ids: details.contact_ids(),
            subtasks: details.subtasks.iter().map(SubtaskDraft::existing).collect(),
            category_id: None,
            state: None,
        }
    }
}

/// Contact ids to unassign and to assign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactDiff {
    pub removed: Vec<String>,
    pub added: Vec<String>,
    pub unchanged: Vec<String>,
}

impl ContactDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Diff two contact id lists. Order of first appearance is kept and
/// duplicates collapse.
pub fn diff_contacts(existing: &[String], desired: &[String]) -> ContactDiff {
    let existing = unique(existing);
    let desired = unique(desired);
    let existing_set: HashSet<&str> = existing.iter().map(String::as_str).collect();
    let desired_set: HashSet<&str> = desired.iter().map(String::as_str).collect();

    let mut diff = ContactDiff::default();
    for id in &existing {
        if desired_set.contains(id.as_str()) {
            diff.unchanged.push(id.clone());
        } else {
            diff.removed.push(id.clone());
        }
    }
    diff.added = desired
        .into_iter()
        .filter(|id| !existing_set.contains(id.as_str()))
        .collect();
    diff
}

fn unique(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Subtask rows to delete, create and patch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubtaskDiff {
    pub removed: Vec<Subtask>,
    pub added: Vec<Subtask>,
    pub updated: Vec<Subtask>,
}

impl SubtaskDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.updated.is_empty()
    }
}

/// Diff stored subtasks against drafts by id.
///
/// Drafts with blank titles are dropped. Positions are the drafts' indexes.
/// A draft whose id the task does not own (or that repeats an id) counts as
/// new.
pub fn diff_subtasks(existing: &[Subtask], desired: &[SubtaskDraft]) -> SubtaskDiff {
    let mut remaining: HashMap<&str, &Subtask> =
        existing.iter().map(|s| (s.id.as_str(), s)).collect();
    let mut diff = SubtaskDiff::default();

    let drafts = desired.iter().filter(|draft| !draft.title.trim().is_empty());
    for (position, draft) in drafts.enumerate() {
        let position = position as u32;
        let title = draft.title.trim();
        let current = draft
            .id
            .as_deref()
            .and_then(|id| remaining.remove(id));

        match current {
            Some(current) => {
                let wanted = Subtask {
                    id: current.id.clone(),
                    title: title.to_string(),
                    task_checked: draft.checked,
                    position,
                };
                if &wanted != current {
                    diff.updated.push(wanted);
                }
            }
            None => {
                let mut subtask = Subtask::new(title, position);
                subtask.task_checked = draft.checked;
                diff.added.push(subtask);
            }
        }
    }

    diff.removed = existing
        .iter()
        .filter(|s| remaining.contains_key(s.id.as_str()))
        .cloned()
        .collect();
    diff
}

/// Every write an edit needs.
#[derive(Debug, Clone, Serialize)]
pub struct EditPlan {
    pub task: Task,
    pub task_changed: bool,
    pub contacts: ContactDiff,
    pub removed_assignments: Vec<ContactAssignment>,
    pub added_assignments: Vec<ContactAssignment>,
    pub subtasks: SubtaskDiff,
    pub removed_links: Vec<SubtaskLink>,
    pub added_links: Vec<SubtaskLink>,
}

/// Compute the writes that move `existing` to `edit`.
pub fn plan_edit(existing: &TaskDetails, edit: TaskEdit) -> Result<EditPlan> {
    let title = edit.title.trim();
    if title.is_empty() {
        return Err(Error::InvalidArgument("task title cannot be empty".to_string()));
    }
    let due_date = edit.due_date.trim();
    if parse_due_date(due_date).is_none() {
        return Err(Error::InvalidDueDate(due_date.to_string()));
    }
    let category_id = match edit.category_id.as_deref().map(str::trim) {
        Some("") => {
            return Err(Error::InvalidArgument("task category cannot be empty".to_string()))
        }
        Some(category) => category.to_string(),
        None => existing.task.category_id.clone(),
    };

    let task = Task {
        id: existing.task.id.clone(),
        title: title.to_string(),
        description: edit.description.trim().to_string(),
        due_date: due_date.to_string(),
        priority: edit.priority,
        category_id,
        state_category: edit.state.unwrap_or(existing.task.state_category),
    };
    let task_changed = task != existing.task;

    let contacts = diff_contacts(&existing.contact_ids(), &edit.contact_ids);
    let removed_assignments = existing
        .assignments
        .iter()
        .filter(|a| contacts.removed.contains(&a.contact_id))
        .cloned()
        .collect();
    let added_assignments = contacts
        .added
        .iter()
        .map(|contact_id| ContactAssignment::new(&task.id, contact_id))
        .collect();

    let subtasks = diff_subtasks(&existing.subtasks, &edit.subtasks);
    let removed_links = subtasks
        .removed
        .iter()
        .filter_map(|s| existing.link_for(&s.id).cloned())
        .collect();
    let added_links = subtasks
        .added
        .iter()
        .map(|s| SubtaskLink::new(&task.id, &s.id))
        .collect();

    Ok(EditPlan {
        task,
        task_changed,
        contacts,
        removed_assignments,
        added_assignments,
        subtasks,
        removed_links,
        added_links,
    })
}

impl EditPlan {
    pub fn is_noop(&self) -> bool {
        !self.task_changed && self.contacts.is_empty() && self.subtasks.is_empty()
    }

    /// Apply the plan. The first failed write stops the sequence; earlier
    /// writes are not undone.
    pub async fn persist(&self, store: &dyn DocumentStore) -> Result<WriteReport> {
        let mut journal = WriteJournal::new("edit task");
        let task = &self.task;

        if self.task_changed {
            let fields = json!({
                "title": task.title,
                "description": task.description,
                "dueDate": task.due_date,
                "priority": task.priority,
                "categoryId": task.category_id,
                "stateCategory": task.state_category,
            });
            journal.record(
                format!("task {}", task.id),
                update_record::<Task>(store, &task.id, fields).await,
            )?;
        }

        for assignment in &self.removed_assignments {
            journal.record(
                format!("unassign {}", assignment.contact_id),
                delete_record::<ContactAssignment>(store, &assignment.id).await,
            )?;
        }
        for assignment in &self.added_assignments {
            journal.record(
                format!("assign {}", assignment.contact_id),
                put_record(store, assignment).await,
            )?;
        }

        for link in &self.removed_links {
            journal.record(
                format!("unlink {}", link.sub_task_id),
                delete_record::<SubtaskLink>(store, &link.id).await,
            )?;
        }
        for subtask in &self.subtasks.removed {
            journal.record(
                format!("remove subtask {}", subtask.id),
                delete_record::<Subtask>(store, &subtask.id).await,
            )?;
        }
        for (subtask, link) in self.subtasks.added.iter().zip(&self.added_links) {
            journal.record(
                format!("add subtask {}", subtask.id),
                put_record(store, subtask).await,
            )?;
            journal.record(format!("link {}", subtask.id), put_record(store, link).await)?;
        }
        for subtask in &self.subtasks.updated {
            let fields = json!({
                "title": subtask.title,
                "taskChecked": subtask.task_checked,
                "position": subtask.position,
            });
            journal.record(
                format!("update subtask {}", subtask.id),
                update_record::<Subtask>(store, &subtask.id, fields).await,
            )?;
        }

        info!(
            task_id = %task.id,
            writes = journal.completed(),
            contacts_added = self.contacts.added.len(),
            contacts_removed = self.contacts.removed.len(),
            "task edited"
        );
        Ok(journal.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn subtask(id: &str, title: &str, position: u32) -> Subtask {
        Subtask {
            id: id.to_string(),
            title: title.to_string(),
            task_checked: false,
            position,
        }
    }

    #[test]
    fn contact_diff_is_exact() {
        let diff = diff_contacts(&ids(&["A", "B", "C"]), &ids(&["B", "C", "D"]));
        assert_eq!(diff.removed, ids(&["A"]));
        assert_eq!(diff.added, ids(&["D"]));
        assert_eq!(diff.unchanged, ids(&["B", "C"]));
    }

    #[test]
    fn contact_diff_ignores_duplicates_and_blanks() {
        let diff = diff_contacts(&ids(&["A", "A"]), &ids(&["A", " ", "B", "B"]));
        assert!(diff.removed.is_empty());
        assert_eq!(diff.added, ids(&["B"]));
    }

    #[test]
    fn identical_contact_lists_produce_no_changes() {
        let diff = diff_contacts(&ids(&["A", "B"]), &ids(&["B", "A"]));
        assert!(diff.is_empty());
    }

    #[test]
    fn subtask_diff_by_id() {
        let existing = vec![
            subtask("s1", "Keep", 0),
            subtask("s2", "Drop", 1),
            subtask("s3", "Rename me", 2),
        ];
        let mut renamed = SubtaskDraft::existing(&existing[2]);
        renamed.title = "Renamed".to_string();
        let desired = vec![
            SubtaskDraft::existing(&existing[0]),
            renamed,
            SubtaskDraft::new("Brand new"),
        ];

        let diff = diff_subtasks(&existing, &desired);
        assert_eq!(diff.removed.len(), 1);
        assert_eq!(diff.removed[0].id, "s2");
        assert_eq!(diff.updated.len(), 1);
        assert_eq!(diff.updated[0].id, "s3");
        assert_eq!(diff.updated[0].title, "Renamed");
        assert_eq!(diff.updated[0].position, 1);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.added[0].title, "Brand new");
        assert_eq!(diff.added[0].position, 2);
    }

    #[test]
    fn unknown_or_repeated_ids_count_as_new() {
        let existing = vec![subtask("s1", "One", 0)];
        let desired = vec![
            SubtaskDraft {
                id: Some("s1".to_string()),
                title: "One".to_string(),
                checked: false,
            },
            SubtaskDraft {
                id: Some("s1".to_string()),
                title: "Copy".to_string(),
                checked: true,
            },
            SubtaskDraft {
                id: Some("foreign".to_string()),
                title: "Other".to_string(),
                checked: false,
            },
        ];
        let diff = diff_subtasks(&existing, &desired);
        assert!(diff.removed.is_empty());
        assert!(diff.updated.is_empty());
        assert_eq!(diff.added.len(), 2);
        assert!(diff.added[0].task_checked);
        assert!(diff.added.iter().all(|s| s.id != "s1" && s.id != "foreign"));
    }

    #[test]
    fn unchanged_subtasks_produce_no_diff() {
        let existing = vec![subtask("s1", "One", 0), subtask("s2", "Two", 5)];
        let desired: Vec<SubtaskDraft> = existing.iter().map(SubtaskDraft::existing).collect();
        let diff = diff_subtasks(&existing, &desired);
        // s2 moves from position 5 to 1 (gap closed by the form order)
        assert!(diff.added.is_empty() && diff.removed.is_empty());
        assert_eq!(diff.updated.len(), 1);
        assert_eq!(diff.updated[0].position, 1);
    }
}
