//! Read side of the board.
//!
//! Tasks are resolved through the join tables into [`TaskDetails`]
//! snapshots: the task row, its subtasks in display order and its assigned
//! contacts. These snapshots are what a render layer consumes.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::{
    tables, Category, Contact, ContactAssignment, Subtask, SubtaskLink, Task, TaskState,
};
use crate::store::{
    fetch_all, fetch_one, fetch_where, record_path, update_record, DocumentStore,
};

/// A task with its relations resolved.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetails {
    pub task: Task,
    /// Ascending `position`
    pub subtasks: Vec<Subtask>,
    pub links: Vec<SubtaskLink>,
    pub assignments: Vec<ContactAssignment>,
    pub contacts: Vec<Contact>,
}

impl TaskDetails {
    /// Assigned contact ids, one per assignment row.
    pub fn contact_ids(&self) -> Vec<String> {
        self.assignments
            .iter()
            .map(|assignment| assignment.contact_id.clone())
            .collect()
    }

    /// (checked, total) subtasks
    pub fn progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.task_checked).count();
        (done, self.subtasks.len())
    }

    pub fn link_for(&self, subtask_id: &str) -> Option<&SubtaskLink> {
        self.links.iter().find(|link| link.sub_task_id == subtask_id)
    }

    fn matches(&self, needle: &str) -> bool {
        self.task.title.to_lowercase().contains(needle)
            || self.task.description.to_lowercase().contains(needle)
    }
}

/// One board column.
#[derive(Debug, Clone, Serialize)]
pub struct Column {
    pub state: TaskState,
    pub tasks: Vec<TaskDetails>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Board {
    /// Always four columns, in [`TaskState::ALL`] order
    pub columns: Vec<Column>,
}

impl Board {
    pub fn column(&self, state: TaskState) -> &[TaskDetails] {
        self.columns
            .iter()
            .find(|column| column.state == state)
            .map(|column| column.tasks.as_slice())
            .unwrap_or_default()
    }

    pub fn find(&self, task_id: &str) -> Option<&TaskDetails> {
        self.tasks().find(|details| details.task.id == task_id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskDetails> {
        self.columns.iter().flat_map(|column| column.tasks.iter())
    }

    /// Case-insensitive match on title or description. An empty query
    /// matches everything.
    pub fn search(&self, query: &str) -> Vec<&TaskDetails> {
        let needle = query.trim().to_lowercase();
        self.tasks()
            .filter(|details| needle.is_empty() || details.matches(&needle))
            .collect()
    }
}

/// Tables a snapshot is assembled from, indexed by id.
struct Relations {
    links: Vec<SubtaskLink>,
    subtasks: HashMap<String, Subtask>,
    assignments: Vec<ContactAssignment>,
    contacts: HashMap<String, Contact>,
}

impl Relations {
    fn new(
        links: Vec<SubtaskLink>,
        subtasks: Vec<Subtask>,
        assignments: Vec<ContactAssignment>,
        contacts: Vec<Contact>,
    ) -> Self {
        Self {
            links,
            subtasks: subtasks.into_iter().map(|s| (s.id.clone(), s)).collect(),
            assignments,
            contacts: contacts.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    fn resolve(&self, task: Task) -> TaskDetails {
        let links: Vec<SubtaskLink> = self
            .links
            .iter()
            .filter(|link| link.main_task_id == task.id)
            .cloned()
            .collect();

        let mut subtasks: Vec<Subtask> = links
            .iter()
            .filter_map(|link| {
                let found = self.subtasks.get(&link.sub_task_id).cloned();
                if found.is_none() {
                    warn!(task_id = %task.id, subtask_id = %link.sub_task_id, "dangling subtask link");
                }
                found
            })
            .collect();
        sort_subtasks(&mut subtasks);

        let assignments: Vec<ContactAssignment> = self
            .assignments
            .iter()
            .filter(|assignment| assignment.task_id == task.id)
            .cloned()
            .collect();

        let contacts = assignments
            .iter()
            .filter_map(|assignment| {
                let found = self.contacts.get(&assignment.contact_id).cloned();
                if found.is_none() {
                    warn!(task_id = %task.id, contact_id = %assignment.contact_id, "assigned contact missing");
                }
                found
            })
            .collect();

        TaskDetails {
            task,
            subtasks,
            links,
            assignments,
            contacts,
        }
    }
}

/// Display order: ascending position, id as tie-breaker.
pub fn sort_subtasks(subtasks: &mut [Subtask]) {
    subtasks.sort_by(|left, right| {
        left.position
            .cmp(&right.position)
            .then_with(|| left.id.cmp(&right.id))
    });
}

/// Resolve one task. `None` when the task row does not exist.
pub async fn load_task(store: &dyn DocumentStore, task_id: &str) -> Result<Option<TaskDetails>> {
    let Some(task) = fetch_one::<Task>(store, task_id).await? else {
        return Ok(None);
    };
    let links = fetch_where::<SubtaskLink>(store, "mainTaskId", task_id).await?;
    let assignments = fetch_where::<ContactAssignment>(store, "taskId", task_id).await?;
    let subtasks = if links.is_empty() {
        Vec::new()
    } else {
        fetch_all::<Subtask>(store).await?
    };
    let contacts = if assignments.is_empty() {
        Vec::new()
    } else {
        fetch_all::<Contact>(store).await?
    };

    let relations = Relations::new(links, subtasks, assignments, contacts);
    Ok(Some(relations.resolve(task)))
}

/// Like [`load_task`] but a missing task is an error.
pub async fn require_task(store: &dyn DocumentStore, task_id: &str) -> Result<TaskDetails> {
    load_task(store, task_id)
        .await?
        .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
}

/// Fetch every table once and assemble the whole board.
pub async fn load_board(store: &dyn DocumentStore) -> Result<Board> {
    let tasks = fetch_all::<Task>(store).await?;
    let relations = Relations::new(
        fetch_all::<SubtaskLink>(store).await?,
        fetch_all::<Subtask>(store).await?,
        fetch_all::<ContactAssignment>(store).await?,
        fetch_all::<Contact>(store).await?,
    );

    let mut columns: Vec<Column> = TaskState::ALL
        .into_iter()
        .map(|state| Column {
            state,
            tasks: Vec::new(),
        })
        .collect();
    for task in tasks {
        let state = task.state_category;
        let details = relations.resolve(task);
        if let Some(column) = columns.iter_mut().find(|column| column.state == state) {
            column.tasks.push(details);
        }
    }
    Ok(Board { columns })
}

/// Persist a drag-and-drop move to another column.
///
/// The row is looked up first; a `PATCH` on a missing path would create it.
pub async fn move_task(store: &dyn DocumentStore, task_id: &str, state: TaskState) -> Result<()> {
    if fetch_one::<Task>(store, task_id).await?.is_none() {
        return Err(Error::TaskNotFound(task_id.to_string()));
    }
    update_record::<Task>(store, task_id, json!({ "stateCategory": state })).await?;
    info!(task_id, %state, "task moved");
    Ok(())
}

/// Tick or untick a subtask.
pub async fn set_subtask_checked(
    store: &dyn DocumentStore,
    subtask_id: &str,
    checked: bool,
) -> Result<Subtask> {
    let Some(mut subtask) = fetch_one::<Subtask>(store, subtask_id).await? else {
        return Err(Error::NotFound(record_path(tables::SUBTASKS, subtask_id)));
    };
    update_record::<Subtask>(store, subtask_id, json!({ "taskChecked": checked })).await?;
    subtask.task_checked = checked;
    info!(subtask_id, checked, "subtask toggled");
    Ok(subtask)
}

/// Categories sorted by name.
pub async fn list_categories(store: &dyn DocumentStore) -> Result<Vec<Category>> {
    let mut categories = fetch_all::<Category>(store).await?;
    categories.sort_by(|left, right| left.name.to_lowercase().cmp(&right.name.to_lowercase()));
    Ok(categories)
}
