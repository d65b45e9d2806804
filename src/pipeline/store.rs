//! In-memory task table.
//!
//! The one shared resource in the pipeline. It is explicitly owned and
//! injected into the manager at construction (no process-wide registry), so
//! independent pipeline instances never share state and tests can inspect
//! the table directly.
//!
//! Safety model: queues carry task ids only, a task id sits in at most one
//! queue at a time, so at most one worker mutates a given record at any
//! instant. The `RwLock` guards the map itself; it is never held across an
//! await point.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use super::types::{TaskRecord, TaskView};

/// Concurrent map of task id → task record, process-lifetime only.
/// Durable state lives entirely in whatever the persistence capability
/// writes.
#[derive(Clone, Default)]
pub struct TaskTable {
    inner: Arc<RwLock<HashMap<String, TaskRecord>>>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: TaskRecord) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.insert(record.task_id.clone(), record);
    }

    /// Mutate a record in place under the write lock.
    ///
    /// Returns `None` if the id is unknown (wrong id, or already evicted).
    pub fn with_record<R>(
        &self,
        task_id: &str,
        f: impl FnOnce(&mut TaskRecord) -> R,
    ) -> Option<R> {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.get_mut(task_id).map(f)
    }

    /// Non-blocking snapshot for status queries.
    pub fn view(&self, task_id: &str) -> Option<TaskView> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(task_id).map(TaskRecord::view)
    }

    /// Drop terminal records whose completion time is before `cutoff`.
    /// Returns how many were evicted.
    pub fn evict_terminal_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let before = map.len();
        map.retain(|_, task| {
            !(task.status.is_terminal()
                && task.completed_at.is_some_and(|done| done < cutoff))
        });
        before - map.len()
    }

    pub fn len(&self) -> usize {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
