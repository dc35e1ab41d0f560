//! Database schemas for the prioritizer
//!
//! Defines MongoDB document structures for tasks.

mod task;

pub use task::{TaskDoc, TASK_COLLECTION};
