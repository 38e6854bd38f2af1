//! In-process document store.
//!
//! Mirrors the REST backend's semantics (shallow-merge updates, rows keyed by
//! id) and adds what tests need: a journal of every call in order and
//! injectable failures.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use super::{split_path, DocumentStore};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOp {
    Get,
    Put,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
struct FailRule {
    op: StoreOp,
    prefix: String,
}

#[derive(Debug, Default)]
struct Inner {
    tables: BTreeMap<String, BTreeMap<String, Value>>,
    journal: Vec<(StoreOp, String)>,
    failures: Vec<FailRule>,
}

/// Shared handle; clones see the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a row directly, bypassing the journal.
    pub fn seed<T: Serialize>(&self, table: &str, id: &str, row: &T) -> Result<()> {
        let value = serde_json::to_value(row)?;
        self.lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .insert(id.to_string(), value);
        Ok(())
    }

    /// Rows of a table in key order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock()
            .tables
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn row(&self, table: &str, id: &str) -> Option<Value> {
        self.lock()
            .tables
            .get(table)
            .and_then(|rows| rows.get(id).cloned())
    }

    pub fn count(&self, table: &str) -> usize {
        self.lock().tables.get(table).map_or(0, |rows| rows.len())
    }

    /// Every call made so far, in order.
    pub fn journal(&self) -> Vec<(StoreOp, String)> {
        self.lock().journal.clone()
    }

    /// Journal entries other than reads.
    pub fn writes(&self) -> Vec<(StoreOp, String)> {
        self.journal()
            .into_iter()
            .filter(|(op, _)| *op != StoreOp::Get)
            .collect()
    }

    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    /// Make every `op` on a path starting with `prefix` fail as unavailable.
    pub fn fail_on(&self, op: StoreOp, prefix: impl Into<String>) {
        self.lock().failures.push(FailRule {
            op,
            prefix: prefix.into(),
        });
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    fn begin(&self, op: StoreOp, path: &str) -> Result<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        inner.journal.push((op, path.to_string()));
        let failing = inner
            .failures
            .iter()
            .any(|rule| rule.op == op && path.starts_with(&rule.prefix));
        if failing {
            return Err(Error::StoreUnavailable(format!(
                "injected failure on {op:?} {path}"
            )));
        }
        Ok(inner)
    }
}

fn into_object(value: Value, path: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(Error::InvalidArgument(format!(
            "expected an object for {path}"
        ))),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, table: &str) -> Result<Vec<Value>> {
        split_path(table)?;
        let inner = self.begin(StoreOp::Get, table)?;
        Ok(inner
            .tables
            .get(table)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn put(&self, path: &str, record: Value) -> Result<()> {
        let (table, key) = split_path(path)?;
        let mut inner = self.begin(StoreOp::Put, path)?;
        match key {
            Some(key) => {
                inner
                    .tables
                    .entry(table.to_string())
                    .or_default()
                    .insert(key.to_string(), record);
            }
            None => {
                let rows = into_object(record, path)?;
                inner
                    .tables
                    .insert(table.to_string(), rows.into_iter().collect());
            }
        }
        Ok(())
    }

    async fn update(&self, path: &str, partial: Value) -> Result<()> {
        let (table, key) = split_path(path)?;
        let fields = into_object(partial, path)?;
        let mut inner = self.begin(StoreOp::Update, path)?;
        match key {
            Some(key) => {
                let row = inner
                    .tables
                    .get_mut(table)
                    .and_then(|rows| rows.get_mut(key))
                    .ok_or_else(|| Error::NotFound(path.to_string()))?;
                let row = row
                    .as_object_mut()
                    .ok_or_else(|| Error::InvalidArgument(format!("row at {path} is not an object")))?;
                for (field, value) in fields {
                    row.insert(field, value);
                }
            }
            None => {
                let rows = inner.tables.entry(table.to_string()).or_default();
                for (id, value) in fields {
                    rows.insert(id, value);
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let (table, key) = split_path(path)?;
        let mut inner = self.begin(StoreOp::Delete, path)?;
        let removed = match key {
            Some(key) => inner
                .tables
                .get_mut(table)
                .and_then(|rows| rows.remove(key))
                .is_some(),
            None => inner.tables.remove(table).is_some(),
        };
        if !removed {
            return Err(Error::NotFound(path.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn put_get_update_delete_round() {
        let store = MemoryStore::new();
        store
            .put("tasks/t1", json!({ "id": "t1", "title": "Old", "dueDate": "01/01/2030" }))
            .await
            .unwrap();
        store
            .update("tasks/t1", json!({ "title": "New" }))
            .await
            .unwrap();

        let row = store.row("tasks", "t1").unwrap();
        assert_eq!(row["title"], "New");
        assert_eq!(row["dueDate"], "01/01/2030");

        let found = store.get_by_key("tasks", "title", "New").await.unwrap();
        assert_eq!(found.unwrap()["id"], "t1");
        assert!(store.get_by_key("tasks", "title", "Old").await.unwrap().is_none());

        store.delete("tasks/t1").await.unwrap();
        assert_eq!(store.count("tasks"), 0);
    }

    #[tokio::test]
    async fn missing_rows_report_not_found() {
        let store = MemoryStore::new();
        let err = store.update("tasks/nope", json!({ "a": 1 })).await.unwrap_err();
        assert!(err.is_not_found());
        let err = store.delete("tasks/nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn injected_failures_are_journaled() {
        let store = MemoryStore::new();
        store.fail_on(StoreOp::Put, "subTasks/");

        store.put("tasks/t1", json!({ "id": "t1" })).await.unwrap();
        let err = store.put("subTasks/s1", json!({ "id": "s1" })).await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
        assert_eq!(store.count("subTasks"), 0);
        assert_eq!(
            store.writes(),
            vec![
                (StoreOp::Put, "tasks/t1".to_string()),
                (StoreOp::Put, "subTasks/s1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn find_by_key_returns_every_match() {
        let store = MemoryStore::new();
        for (id, task) in [("a1", "t1"), ("a2", "t1"), ("a3", "t2")] {
            store
                .seed("taskContactAssigned", id, &json!({ "id": id, "taskId": task }))
                .unwrap();
        }
        let rows = store
            .find_by_key("taskContactAssigned", "taskId", "t1")
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }
}
