//! Task endpoints
//!
//! ## Endpoints
//!
//! - `GET /api/tasks/prioritize` - Reclassify all tasks and return them
//! - `GET /api/tasks` - List tasks as stored
//! - `POST /api/tasks` - Create a task
//! - `GET /api/tasks/{id}` - Fetch one task
//! - `PUT /api/tasks/{id}` - Partially update a task
//! - `DELETE /api/tasks/{id}` - Delete a task
//!
//! `priority` is always one of `HIGH`, `MEDIUM`, `LOW` or `null`. A stored
//! label outside that set reads as `null` on the plain listing and is
//! replaced on the next `prioritize` call.

use http_body_util::{BodyExt, Limited};
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use crate::db::TaskDoc;
use crate::routes::response::{json_response, FullBody};
use crate::server::AppState;
use crate::tasks::{NewTask, TaskView, UpdateTask};
use crate::types::{PrioritizerError, Result};

/// Base path for task routes
pub const TASKS_BASE: &str = "/api/tasks";

/// Largest request body accepted
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Which task resource a path names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRoute {
    /// `/api/tasks`
    Collection,
    /// `/api/tasks/prioritize`
    Prioritize,
    /// `/api/tasks/{id}`
    Item(String),
}

impl TaskRoute {
    /// Methods served on this resource, as listed in `Allow`
    pub fn allowed_methods(&self) -> &'static str {
        match self {
            Self::Collection => "GET, POST, OPTIONS",
            Self::Prioritize => "GET, OPTIONS",
            Self::Item(_) => "GET, PUT, DELETE, OPTIONS",
        }
    }
}

/// Match a request path against the task routes
pub fn match_task_route(path: &str) -> Option<TaskRoute> {
    let remainder = path.strip_prefix(TASKS_BASE)?;
    if remainder.is_empty() || remainder == "/" {
        return Some(TaskRoute::Collection);
    }

    let segment = remainder.strip_prefix('/')?;
    let segment = segment.strip_suffix('/').unwrap_or(segment);
    if segment.is_empty() || segment.contains('/') {
        return None;
    }

    match segment {
        "prioritize" => Some(TaskRoute::Prioritize),
        id => Some(TaskRoute::Item(id.to_string())),
    }
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

fn views(tasks: Vec<TaskDoc>) -> Vec<TaskView> {
    tasks.into_iter().map(TaskView::from).collect()
}

/// Read and parse a JSON request body
async fn read_json<T, B>(req: Request<B>) -> Result<T>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| PrioritizerError::BadRequest(format!("Failed to read request body: {}", e)))?
        .to_bytes();

    Ok(serde_json::from_slice(&bytes)?)
}

/// Handle a request already matched to a task route
pub async fn handle_tasks_request<B>(
    state: Arc<AppState>,
    req: Request<B>,
    route: TaskRoute,
) -> Result<Response<FullBody>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let service = &state.tasks;

    match (method, route) {
        (Method::GET, TaskRoute::Prioritize) => {
            let tasks = service.prioritize().await?;
            Ok(json_response(StatusCode::OK, &views(tasks)))
        }
        (Method::GET, TaskRoute::Collection) => {
            let tasks = service.list().await?;
            Ok(json_response(StatusCode::OK, &views(tasks)))
        }
        (Method::POST, TaskRoute::Collection) => {
            let new: NewTask = read_json(req).await?;
            let task = service.create(new).await?;
            Ok(json_response(StatusCode::CREATED, &TaskView::from(task)))
        }
        (Method::GET, TaskRoute::Item(id)) => {
            let task = service.get(&id).await?;
            Ok(json_response(StatusCode::OK, &TaskView::from(task)))
        }
        (Method::PUT, TaskRoute::Item(id)) => {
            let update: UpdateTask = read_json(req).await?;
            let task = service.update(&id, update).await?;
            Ok(json_response(StatusCode::OK, &TaskView::from(task)))
        }
        (Method::DELETE, TaskRoute::Item(id)) => {
            service.delete(&id).await?;
            Ok(json_response(
                StatusCode::OK,
                &MessageResponse {
                    message: "Task deleted successfully",
                },
            ))
        }
        (method, route) => Err(PrioritizerError::MethodNotAllowed(format!(
            "{} is not supported on {:?}",
            method, route
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_task_route() {
        assert_eq!(match_task_route("/api/tasks"), Some(TaskRoute::Collection));
        assert_eq!(match_task_route("/api/tasks/"), Some(TaskRoute::Collection));
        assert_eq!(
            match_task_route("/api/tasks/prioritize"),
            Some(TaskRoute::Prioritize)
        );
        assert_eq!(
            match_task_route("/api/tasks/65f0c0ffee00000000000001"),
            Some(TaskRoute::Item("65f0c0ffee00000000000001".into()))
        );
        assert_eq!(match_task_route("/api/tasks/a/b"), None);
        assert_eq!(match_task_route("/api/tasksx"), None);
        assert_eq!(match_task_route("/api/other"), None);
    }

    #[test]
    fn test_allowed_methods_per_route() {
        assert_eq!(TaskRoute::Prioritize.allowed_methods(), "GET, OPTIONS");
        assert!(TaskRoute::Collection.allowed_methods().contains("POST"));
        assert!(!TaskRoute::Collection.allowed_methods().contains("DELETE"));
        assert!(TaskRoute::Item("x".into()).allowed_methods().contains("PUT"));
    }
}
