//! Task prioritization
//!
//! - **priority**: the HIGH/MEDIUM/LOW label set and the deadline rule
//! - **repository**: storage abstraction with a MongoDB implementation
//! - **memory**: in-memory repository for dev mode and tests
//! - **service**: prioritization pass plus basic task CRUD

pub mod memory;
pub mod priority;
pub mod repository;
pub mod service;

pub use memory::InMemoryTaskRepository;
pub use priority::{classify, Priority, Thresholds};
pub use repository::{MongoTaskRepository, TaskChanges, TaskRepository};
pub use service::{parse_task_id, NewTask, TaskService, TaskView, UpdateTask};
