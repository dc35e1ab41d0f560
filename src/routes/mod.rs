//! HTTP routes for the prioritizer

pub mod health;
pub mod response;
pub mod tasks;

pub use health::{health_check, readiness_check, version_info};
pub use response::{error_response, json_response, not_found_response, FullBody};
pub use tasks::{handle_tasks_request, match_task_route, TaskRoute};
