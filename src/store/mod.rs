//! Document store adapter.
//!
//! The store is a path-addressable JSON tree: each table is a map of rows
//! keyed by id, addressed as `<table>` or `<table>/<id>`.
//!
//! # Layout
//!
//! ```text
//! tasks/<id>                 Task
//! subTasks/<id>              Subtask
//! taskSubtask/<id>           SubtaskLink (mainTaskId -> subTaskId)
//! taskContactAssigned/<id>   ContactAssignment (taskId -> contactId)
//! contacts/<id>              Contact
//! categories/<id>            Category
//! ```
//!
//! Backends implement [`DocumentStore`] on untyped JSON rows; the free
//! functions below add the typed layer on top of any backend.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::Record;

pub mod auth;
pub mod memory;
pub mod rest;

pub use auth::{AuthGate, AuthSignal, GatedStore};
pub use memory::{MemoryStore, StoreOp};
pub use rest::RestStore;

/// Characters the backing store refuses inside a key
const FORBIDDEN_KEY_CHARS: [char; 6] = ['.', '$', '#', '[', ']', '/'];

/// Uniform access to the remote document tables.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All rows of a table (empty when the table does not exist).
    async fn get(&self, table: &str) -> Result<Vec<Value>>;

    /// Write a full row, replacing whatever was at `path`.
    async fn put(&self, path: &str, record: Value) -> Result<()>;

    /// Merge the given fields into the row at `path`.
    async fn update(&self, path: &str, partial: Value) -> Result<()>;

    /// Remove the row at `path`.
    async fn delete(&self, path: &str) -> Result<()>;

    /// First row whose `key` field equals `value`, if any.
    async fn get_by_key(&self, table: &str, key: &str, value: &str) -> Result<Option<Value>> {
        let rows = self.get(table).await?;
        Ok(rows.into_iter().find(|row| field_matches(row, key, value)))
    }

    /// Every row whose `key` field equals `value`.
    async fn find_by_key(&self, table: &str, key: &str, value: &str) -> Result<Vec<Value>> {
        let rows = self.get(table).await?;
        Ok(rows
            .into_iter()
            .filter(|row| field_matches(row, key, value))
            .collect())
    }
}

fn field_matches(row: &Value, key: &str, value: &str) -> bool {
    row.get(key).and_then(Value::as_str) == Some(value)
}

/// Split and check a store path: `table` or `table/key`.
pub fn split_path(path: &str) -> Result<(&str, Option<&str>)> {
    let mut parts = path.split('/');
    let table = parts.next().unwrap_or_default();
    let key = parts.next();
    if parts.next().is_some() {
        return Err(Error::InvalidArgument(format!(
            "store path too deep: {path}"
        )));
    }
    validate_segment(table, path)?;
    if let Some(key) = key {
        validate_segment(key, path)?;
    }
    Ok((table, key))
}

fn validate_segment(segment: &str, path: &str) -> Result<()> {
    if segment.trim().is_empty() {
        return Err(Error::InvalidArgument(format!(
            "store path has an empty segment: '{path}'"
        )));
    }
    if let Some(ch) = segment.chars().find(|ch| FORBIDDEN_KEY_CHARS.contains(ch)) {
        return Err(Error::InvalidArgument(format!(
            "store path segment '{segment}' contains forbidden character '{ch}'"
        )));
    }
    Ok(())
}

/// Path of a row in a table
pub fn record_path(table: &str, id: &str) -> String {
    format!("{table}/{id}")
}

// =============================================================================
// Typed helpers
// =============================================================================

pub async fn fetch_all<T: Record>(store: &dyn DocumentStore) -> Result<Vec<T>> {
    decode_rows(store.get(T::TABLE).await?)
}

pub async fn fetch_where<T: Record>(
    store: &dyn DocumentStore,
    key: &str,
    value: &str,
) -> Result<Vec<T>> {
    decode_rows(store.find_by_key(T::TABLE, key, value).await?)
}

pub async fn fetch_one<T: Record>(store: &dyn DocumentStore, id: &str) -> Result<Option<T>> {
    match store.get_by_key(T::TABLE, "id", id).await? {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

pub async fn put_record<T: Record>(store: &dyn DocumentStore, record: &T) -> Result<()> {
    let path = record.path();
    debug!(%path, "put");
    store.put(&path, serde_json::to_value(record)?).await
}

pub async fn update_record<T: Record>(
    store: &dyn DocumentStore,
    id: &str,
    partial: Value,
) -> Result<()> {
    let path = record_path(T::TABLE, id);
    debug!(%path, "update");
    store.update(&path, partial).await
}

pub async fn delete_record<T: Record>(store: &dyn DocumentStore, id: &str) -> Result<()> {
    let path = record_path(T::TABLE, id);
    debug!(%path, "delete");
    store.delete(&path).await
}

fn decode_rows<T: Record>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Error::from))
        .collect()
}

// =============================================================================
// Multi-step writes
// =============================================================================

/// Completed steps of a multi-row write.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct WriteReport {
    pub operation: &'static str,
    pub steps: Vec<String>,
}

impl WriteReport {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Tracks a sequence of independent writes.
///
/// There is no transaction: the first failure is wrapped in
/// [`Error::PartialWrite`] and earlier writes stay in place.
#[derive(Debug)]
pub struct WriteJournal {
    report: WriteReport,
}

impl WriteJournal {
    pub fn new(operation: &'static str) -> Self {
        Self {
            report: WriteReport {
                operation,
                steps: Vec::new(),
            },
        }
    }

    /// Record the outcome of one write.
    pub fn record(&mut self, step: impl Into<String>, outcome: Result<()>) -> Result<()> {
        let step = step.into();
        match outcome {
            Ok(()) => {
                self.report.steps.push(step);
                Ok(())
            }
            Err(source) => Err(Error::PartialWrite {
                operation: self.report.operation,
                step,
                completed: self.report.steps.len(),
                source: Box::new(source),
            }),
        }
    }

    pub fn completed(&self) -> usize {
        self.report.steps.len()
    }

    pub fn finish(self) -> WriteReport {
        self.report
    }
}
