//! Database layer for the prioritizer
//!
//! Provides MongoDB storage for task documents.

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection};
pub use schemas::{TaskDoc, TASK_COLLECTION};
