//! Task service
//!
//! Runs the prioritization pass over every stored task and offers the basic
//! CRUD operations the HTTP layer exposes.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::TaskDoc;
use crate::logging::PriorityAuditLogger;
use crate::tasks::{Priority, TaskChanges, TaskRepository, Thresholds};
use crate::types::{PrioritizerError, Result};

/// Task as returned by the API
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
}

/// A stored label outside the closed set (e.g. lowercase `"high"`) shows as
/// `null` until the next prioritization pass rewrites it.
impl From<TaskDoc> for TaskView {
    fn from(task: TaskDoc) -> Self {
        Self {
            id: task.id_hex(),
            title: task.title,
            description: task.description,
            deadline: task.deadline.map(|d| d.to_chrono()),
            priority: task.priority,
        }
    }
}

/// Body of a create request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    /// Derived from the deadline when omitted
    #[serde(default)]
    pub priority: Option<Priority>,
}

/// Body of an update request. Omitted fields are left alone;
/// `"deadline": null` clears the deadline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub deadline: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl UpdateTask {
    fn into_changes(self) -> Result<TaskChanges> {
        let title = match self.title {
            Some(title) => {
                let title = title.trim();
                if title.is_empty() {
                    return Err(PrioritizerError::BadRequest("title must not be empty".into()));
                }
                Some(title.to_string())
            }
            None => None,
        };
        Ok(TaskChanges {
            title,
            description: self.description,
            deadline: self.deadline.map(|d| d.map(bson::DateTime::from_chrono)),
            priority: self.priority,
        })
    }
}

/// Parse a task ID from its hex form
pub fn parse_task_id(id: &str) -> Result<ObjectId> {
    Ok(ObjectId::parse_str(id)?)
}

/// Prioritization and CRUD over a task repository
#[derive(Clone)]
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
    thresholds: Thresholds,
    audit: Option<PriorityAuditLogger>,
}

impl TaskService {
    pub fn new(repo: Arc<dyn TaskRepository>, thresholds: Thresholds) -> Self {
        Self {
            repo,
            thresholds,
            audit: None,
        }
    }

    /// Record applied priority changes in the given audit log
    pub fn with_audit(mut self, audit: PriorityAuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn repository(&self) -> &Arc<dyn TaskRepository> {
        &self.repo
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    /// Reclassify every task against the current time
    pub async fn prioritize(&self) -> Result<Vec<TaskDoc>> {
        self.prioritize_at(Utc::now()).await
    }

    /// Reclassify every task as of `now`, writing back only changed labels.
    ///
    /// Writes are conditional on the label read, so a concurrent edit is not
    /// overwritten. The returned list carries the labels computed for `now`.
    pub async fn prioritize_at(&self, now: DateTime<Utc>) -> Result<Vec<TaskDoc>> {
        let mut tasks = self.repo.find_all().await?;
        let mut updated = 0usize;

        for task in tasks.iter_mut() {
            let (Some(id), Some(deadline)) = (task._id, task.deadline) else {
                debug!("Skipping task '{}' without id or deadline", task.title);
                continue;
            };

            let deadline = deadline.to_chrono();
            let label = self.thresholds.classify(deadline, now);
            if task.priority == Some(label) {
                continue;
            }

            let previous = task.priority;
            if self.repo.set_priority(&id, previous, label).await? {
                updated += 1;
                info!(
                    "Task {} ('{}') priority {} -> {}",
                    id,
                    task.title,
                    previous.map(|p| p.as_str()).unwrap_or("none"),
                    label
                );
                if let Some(ref audit) = self.audit {
                    audit
                        .log_change(
                            id.to_hex(),
                            task.title.clone(),
                            previous,
                            label,
                            (deadline - now).num_seconds(),
                        )
                        .await;
                }
            } else {
                debug!("Task {} changed since it was read; priority left as stored", id);
            }

            task.priority = Some(label);
        }

        info!("Prioritized {} task(s), {} label(s) updated", tasks.len(), updated);
        Ok(tasks)
    }

    pub async fn list(&self) -> Result<Vec<TaskDoc>> {
        self.repo.find_all().await
    }

    pub async fn get(&self, id: &str) -> Result<TaskDoc> {
        let id = parse_task_id(id)?;
        self.repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| PrioritizerError::NotFound("Task not found".into()))
    }

    pub async fn create(&self, new: NewTask) -> Result<TaskDoc> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(PrioritizerError::BadRequest("title is required".into()));
        }

        let priority = match (new.priority, new.deadline) {
            (Some(p), _) => p,
            (None, Some(deadline)) => self.thresholds.classify(deadline, Utc::now()),
            (None, None) => {
                return Err(PrioritizerError::BadRequest(
                    "priority is required when no deadline is given".into(),
                ))
            }
        };

        let task = TaskDoc::new(
            title.to_string(),
            new.description.unwrap_or_default(),
            new.deadline.map(bson::DateTime::from_chrono),
            Some(priority),
        );

        let task = self.repo.insert(task).await?;
        info!("Created task {} ('{}') as {}", task.id_hex(), task.title, priority);
        Ok(task)
    }

    pub async fn update(&self, id: &str, update: UpdateTask) -> Result<TaskDoc> {
        let id = parse_task_id(id)?;
        let changes = update.into_changes()?;
        self.repo
            .update(&id, &changes)
            .await?
            .ok_or_else(|| PrioritizerError::NotFound("Task not found".into()))
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = parse_task_id(id)?;
        if self.repo.delete(&id).await? {
            info!("Deleted task {}", id);
            Ok(())
        } else {
            Err(PrioritizerError::NotFound("Task not found".into()))
        }
    }
}
