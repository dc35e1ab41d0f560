//! Shared types for the prioritizer

pub mod error;

pub use error::{PrioritizerError, Result};
