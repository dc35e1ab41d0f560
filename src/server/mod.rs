//! HTTP server for the prioritizer

pub mod cors;
pub mod http;

pub use cors::{CorsDecision, CorsPolicy};
pub use http::{handle_request, run, AppState};
