//! Task deletion.
//!
//! Join rows are removed before the rows they point at: contact assignments
//! first, then each subtask link with its subtask, then the task itself.
//! Contacts are never touched.

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::{ContactAssignment, Subtask, SubtaskLink, Task};
use crate::store::{
    delete_record, fetch_one, fetch_where, DocumentStore, WriteJournal, WriteReport,
};

/// Delete `task_id` and everything that hangs off it.
///
/// A row that is already gone counts as deleted. Any other failure stops the
/// cascade with [`Error::PartialWrite`]; earlier deletes stay deleted.
pub async fn delete_task(store: &dyn DocumentStore, task_id: &str) -> Result<WriteReport> {
    let mut journal = WriteJournal::new("delete task");

    let assignments = fetch_where::<ContactAssignment>(store, "taskId", task_id).await?;
    for assignment in &assignments {
        journal.record(
            format!("unassign {}", assignment.contact_id),
            tolerate_missing(delete_record::<ContactAssignment>(store, &assignment.id).await),
        )?;
    }

    let links = fetch_where::<SubtaskLink>(store, "mainTaskId", task_id).await?;
    for link in &links {
        journal.record(
            format!("unlink {}", link.sub_task_id),
            tolerate_missing(delete_record::<SubtaskLink>(store, &link.id).await),
        )?;
        journal.record(
            format!("subtask {}", link.sub_task_id),
            tolerate_missing(delete_record::<Subtask>(store, &link.sub_task_id).await),
        )?;
    }

    // REST deletes of a missing path succeed, so a bare id is looked up first
    if assignments.is_empty()
        && links.is_empty()
        && fetch_one::<Task>(store, task_id).await?.is_none()
    {
        return Err(Error::TaskNotFound(task_id.to_string()));
    }

    let removed = match delete_record::<Task>(store, task_id).await {
        Err(Error::NotFound(path)) if journal.completed() > 0 => {
            warn!(%path, task_id, "task row already gone");
            Ok(())
        }
        Err(Error::NotFound(_)) => return Err(Error::TaskNotFound(task_id.to_string())),
        other => other,
    };
    journal.record(format!("task {task_id}"), removed)?;

    info!(
        task_id,
        assignments = assignments.len(),
        subtasks = links.len(),
        "task deleted"
    );
    Ok(journal.finish())
}

fn tolerate_missing(outcome: Result<()>) -> Result<()> {
    match outcome {
        Err(Error::NotFound(path)) => {
            warn!(%path, "row already gone");
            Ok(())
        }
        other => other,
    }
}
