//! In-memory task repository
//!
//! Used when MongoDB is unavailable in dev mode, and by tests. Counts every
//! write so callers can check that unchanged tasks are left alone.

use bson::oid::ObjectId;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::db::TaskDoc;
use crate::tasks::{Priority, TaskChanges, TaskRepository};
use crate::types::{PrioritizerError, Result};

/// Task store kept in process memory, in insertion order
#[derive(Debug)]
pub struct InMemoryTaskRepository {
    tasks: RwLock<Vec<TaskDoc>>,
    writes: AtomicUsize,
    available: AtomicBool,
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(Vec::new()),
            writes: AtomicUsize::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Seed tasks without counting them as writes. Missing IDs are assigned.
    pub async fn with_tasks(tasks: impl IntoIterator<Item = TaskDoc>) -> Self {
        let repo = Self::new();
        {
            let mut store = repo.tasks.write().await;
            for mut task in tasks {
                task._id.get_or_insert_with(ObjectId::new);
                store.push(task);
            }
        }
        repo
    }

    /// Number of inserts, updates, deletes and priority writes applied
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Simulate the store going away (ping fails)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

fn find_mut<'a>(store: &'a mut [TaskDoc], id: &ObjectId) -> Option<&'a mut TaskDoc> {
    store.iter_mut().find(|t| t._id.as_ref() == Some(id))
}

#[async_trait::async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn find_all(&self) -> Result<Vec<TaskDoc>> {
        Ok(self.tasks.read().await.clone())
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<TaskDoc>> {
        let store = self.tasks.read().await;
        Ok(store.iter().find(|t| t._id.as_ref() == Some(id)).cloned())
    }

    async fn insert(&self, mut task: TaskDoc) -> Result<TaskDoc> {
        let id = ObjectId::new();
        task._id = Some(id);
        self.tasks.write().await.push(task.clone());
        self.record_write();
        Ok(task)
    }

    async fn update(&self, id: &ObjectId, changes: &TaskChanges) -> Result<Option<TaskDoc>> {
        let mut store = self.tasks.write().await;
        let Some(task) = find_mut(&mut store, id) else {
            return Ok(None);
        };
        if !changes.is_empty() {
            changes.apply(task);
            self.record_write();
        }
        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool> {
        let mut store = self.tasks.write().await;
        let before = store.len();
        store.retain(|t| t._id.as_ref() != Some(id));
        let removed = store.len() < before;
        if removed {
            self.record_write();
        }
        Ok(removed)
    }

    async fn set_priority(
        &self,
        id: &ObjectId,
        expected: Option<Priority>,
        priority: Priority,
    ) -> Result<bool> {
        let mut store = self.tasks.write().await;
        match find_mut(&mut store, id) {
            Some(task) if task.priority == expected && task.priority != Some(priority) => {
                task.priority = Some(priority);
                self.record_write();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ping(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PrioritizerError::Database("in-memory store marked unavailable".into()))
        }
    }
}
