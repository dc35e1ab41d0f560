//! Logging infrastructure for the prioritizer
//!
//! Sets up the tracing subscriber and provides the priority-change audit log.

pub mod audit;

pub use audit::{PriorityAuditLogger, PriorityChange};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `prioritizer=<log_level>,info`.
pub fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("prioritizer={},info", log_level).into());

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
