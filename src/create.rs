//! Task creation.
//!
//! A new task is a small graph: the task row, one row per subtask, one join
//! row per subtask (`taskSubtask`) and one join row per assigned contact
//! (`taskContactAssigned`). The graph is planned in memory first and then
//! written row by row.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{ContactAssignment, Subtask, SubtaskLink, Task};
use crate::store::{put_record, DocumentStore, WriteJournal, WriteReport};

/// Every row a new task needs.
#[derive(Debug, Clone, Serialize)]
pub struct CreationPlan {
    pub task: Task,
    pub subtasks: Vec<Subtask>,
    pub assignments: Vec<ContactAssignment>,
    pub links: Vec<SubtaskLink>,
}

/// Build the rows for `task`.
///
/// Blank subtask titles are dropped; the rest get positions `0..n` in the
/// given order. Contact ids are de-duplicated, and the creator (when known)
/// is assigned too unless already listed.
pub fn plan_creation(
    task: Task,
    subtask_titles: &[String],
    contact_ids: &[String],
    creator: Option<&str>,
) -> CreationPlan {
    let subtasks: Vec<Subtask> = subtask_titles
        .iter()
        .map(|title| title.trim())
        .filter(|title| !title.is_empty())
        .enumerate()
        .map(|(position, title)| Subtask::new(title, position as u32))
        .collect();

    let mut seen = HashSet::new();
    let assignments = contact_ids
        .iter()
        .map(String::as_str)
        .chain(creator)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(|contact_id| ContactAssignment::new(&task.id, contact_id))
        .collect();

    let links = subtasks
        .iter()
        .map(|subtask| SubtaskLink::new(&task.id, &subtask.id))
        .collect();

    CreationPlan {
        task,
        subtasks,
        assignments,
        links,
    }
}

impl CreationPlan {
    /// Write the plan: task, subtasks, assignments, then links.
    ///
    /// Stops at the first failed write; rows already written stay.
    pub async fn persist(&self, store: &dyn DocumentStore) -> Result<WriteReport> {
        let mut journal = WriteJournal::new("create task");
        let task_id = self.task.id.as_str();

        journal.record(format!("task {task_id}"), put_record(store, &self.task).await)?;
        for subtask in &self.subtasks {
            journal.record(
                format!("subtask {}", subtask.id),
                put_record(store, subtask).await,
            )?;
        }
        for assignment in &self.assignments {
            journal.record(
                format!("assignment {}", assignment.contact_id),
                put_record(store, assignment).await,
            )?;
        }
        for link in &self.links {
            journal.record(format!("link {}", link.sub_task_id), put_record(store, link).await)?;
        }

        debug!(task_id, writes = journal.completed(), "creation graph written");
        info!(
            task_id,
            subtasks = self.subtasks.len(),
            contacts = self.assignments.len(),
            "task created"
        );
        Ok(journal.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{tables, NewTask, Priority, TaskState};
    use crate::store::{MemoryStore, StoreOp};

    fn task() -> Task {
        Task::new(NewTask {
            title: "Plan sprint".to_string(),
            description: String::new(),
            due_date: "01/03/2031".to_string(),
            priority: Priority::Low,
            category_id: "cat-tech".to_string(),
            state: TaskState::Todo,
        })
        .unwrap()
    }

    fn titles(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plan_positions_follow_input_order() {
        let plan = plan_creation(task(), &titles(&["a", "  ", "b", "c"]), &[], None);
        let positions: Vec<(String, u32)> = plan
            .subtasks
            .iter()
            .map(|s| (s.title.clone(), s.position))
            .collect();
        assert_eq!(
            positions,
            vec![("a".to_string(), 0), ("b".to_string(), 1), ("c".to_string(), 2)]
        );
        assert!(plan.subtasks.iter().all(|s| !s.task_checked));
        assert_eq!(plan.links.len(), 3);
        for (link, subtask) in plan.links.iter().zip(&plan.subtasks) {
            assert_eq!(link.main_task_id, plan.task.id);
            assert_eq!(link.sub_task_id, subtask.id);
        }
    }

    #[test]
    fn plan_adds_creator_once() {
        let plan = plan_creation(task(), &[], &titles(&["c1", "me", "c1"]), Some("me"));
        let contacts: Vec<&str> = plan
            .assignments
            .iter()
            .map(|a| a.contact_id.as_str())
            .collect();
        assert_eq!(contacts, vec!["c1", "me"]);

        let plan = plan_creation(task(), &[], &[], None);
        assert!(plan.assignments.is_empty());
    }

    #[tokio::test]
    async fn persist_writes_in_dependency_order() {
        let store = MemoryStore::new();
        let plan = plan_creation(task(), &titles(&["one"]), &titles(&["c1"]), None);
        let report = plan.persist(&store).await.unwrap();
        assert_eq!(report.len(), 4);

        let tables_written: Vec<String> = store
            .writes()
            .into_iter()
            .map(|(_, path)| path.split('/').next().unwrap().to_string())
            .collect();
        assert_eq!(
            tables_written,
            vec![
                tables::TASKS,
                tables::SUBTASKS,
                tables::CONTACT_ASSIGNMENTS,
                tables::SUBTASK_LINKS,
            ]
        );
    }

    #[tokio::test]
    async fn persist_stops_at_first_failure() {
        let store = MemoryStore::new();
        store.fail_on(StoreOp::Put, tables::CONTACT_ASSIGNMENTS);
        let plan = plan_creation(task(), &titles(&["one", "two"]), &titles(&["c1"]), None);

        let err = plan.persist(&store).await.unwrap_err();
        match err {
            Error::PartialWrite { completed, .. } => assert_eq!(completed, 3),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.count(tables::TASKS), 1);
        assert_eq!(store.count(tables::SUBTASKS), 2);
        assert_eq!(store.count(tables::SUBTASK_LINKS), 0);
    }
}
