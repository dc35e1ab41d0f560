//! Task storage abstraction
//!
//! The service only talks to `TaskRepository`, so MongoDB can be swapped for
//! the in-memory store in dev mode and tests.

use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use tracing::debug;

use crate::db::{MongoClient, MongoCollection, TaskDoc};
use crate::tasks::Priority;
use crate::types::Result;

/// Partial update of a task. `deadline: Some(None)` clears the deadline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<Option<DateTime>>,
    pub priority: Option<Priority>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.deadline.is_none()
            && self.priority.is_none()
    }

    /// Fields for a `$set` update
    pub fn to_set_document(&self) -> Document {
        let mut set = Document::new();
        if let Some(ref title) = self.title {
            set.insert("title", title.clone());
        }
        if let Some(ref description) = self.description {
            set.insert("description", description.clone());
        }
        if let Some(deadline) = self.deadline {
            set.insert("deadline", deadline.map(Bson::DateTime).unwrap_or(Bson::Null));
        }
        if let Some(priority) = self.priority {
            set.insert("priority", priority.as_str());
        }
        set
    }

    /// Apply the changes to an in-memory document
    pub fn apply(&self, task: &mut TaskDoc) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(ref description) = self.description {
            task.description = description.clone();
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
        if let Some(priority) = self.priority {
            task.priority = Some(priority);
        }
    }
}

/// Storage operations the task service needs
#[async_trait::async_trait]
pub trait TaskRepository: Send + Sync {
    /// All tasks in store order
    async fn find_all(&self) -> Result<Vec<TaskDoc>>;
    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<TaskDoc>>;
    /// Store a new task; the returned document carries its ID
    async fn insert(&self, task: TaskDoc) -> Result<TaskDoc>;
    /// Apply a partial update, returning the updated task if it exists
    async fn update(&self, id: &ObjectId, changes: &TaskChanges) -> Result<Option<TaskDoc>>;
    /// Returns whether a task was deleted
    async fn delete(&self, id: &ObjectId) -> Result<bool>;
    /// Write `priority` only if the stored label still equals `expected`.
    /// Returns whether a document changed.
    async fn set_priority(
        &self,
        id: &ObjectId,
        expected: Option<Priority>,
        priority: Priority,
    ) -> Result<bool>;
    /// Check the backing store is reachable
    async fn ping(&self) -> Result<()>;
}

/// Filter value matching a stored label equal to `expected`.
/// `None` matches missing, null and unrecognised labels.
pub(crate) fn expected_priority_filter(expected: Option<Priority>) -> Bson {
    match expected {
        Some(p) => Bson::String(p.as_str().to_string()),
        None => {
            let labels: Vec<Bson> = Priority::all()
                .iter()
                .map(|p| Bson::String(p.as_str().to_string()))
                .collect();
            Bson::Document(doc! { "$nin": labels })
        }
    }
}

/// MongoDB-backed task repository
#[derive(Clone)]
pub struct MongoTaskRepository {
    mongo: MongoClient,
    tasks: MongoCollection<TaskDoc>,
}

impl MongoTaskRepository {
    pub async fn new(mongo: MongoClient, collection: &str) -> Result<Self> {
        let tasks = mongo.collection::<TaskDoc>(collection).await?;
        Ok(Self { mongo, tasks })
    }
}

#[async_trait::async_trait]
impl TaskRepository for MongoTaskRepository {
    async fn find_all(&self) -> Result<Vec<TaskDoc>> {
        self.tasks.find_many(doc! {}).await
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<TaskDoc>> {
        self.tasks.find_one(doc! { "_id": *id }).await
    }

    async fn insert(&self, mut task: TaskDoc) -> Result<TaskDoc> {
        let id = self.tasks.insert_one(&task).await?;
        task._id = Some(id);
        Ok(task)
    }

    async fn update(&self, id: &ObjectId, changes: &TaskChanges) -> Result<Option<TaskDoc>> {
        if !changes.is_empty() {
            let result = self
                .tasks
                .update_one(doc! { "_id": *id }, doc! { "$set": changes.to_set_document() })
                .await?;
            if result.matched_count == 0 {
                return Ok(None);
            }
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool> {
        let result = self.tasks.delete_one(doc! { "_id": *id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn set_priority(
        &self,
        id: &ObjectId,
        expected: Option<Priority>,
        priority: Priority,
    ) -> Result<bool> {
        let filter = doc! {
            "_id": *id,
            "priority": expected_priority_filter(expected),
        };
        let result = self
            .tasks
            .update_one(filter, doc! { "$set": { "priority": priority.as_str() } })
            .await?;

        debug!(
            "set_priority {} {:?} -> {} (matched {}, modified {})",
            id, expected, priority, result.matched_count, result.modified_count
        );

        Ok(result.modified_count > 0)
    }

    async fn ping(&self) -> Result<()> {
        self.mongo.ping().await
    }
}
