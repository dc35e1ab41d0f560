//! Prioritizer - deadline-based task prioritization service
//!
//! Reads tasks from MongoDB, relabels each one HIGH, MEDIUM or LOW from the
//! time left until its deadline, writes back only the labels that changed,
//! and serves the result over HTTP.
//!
//! ## Modules
//!
//! - **tasks**: priority rule, repository abstraction, prioritization service
//! - **db**: MongoDB client, typed collections, task schema
//! - **routes** / **server**: hyper HTTP server, CORS, health checks
//! - **logging**: tracing setup and the priority-change audit log

pub mod config;
pub mod db;
pub mod logging;
pub mod routes;
pub mod server;
pub mod tasks;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{PrioritizerError, Result};
