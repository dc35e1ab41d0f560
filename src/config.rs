//! Configuration for the prioritizer
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use uuid::Uuid;

use crate::db::TASK_COLLECTION;
use crate::tasks::Thresholds;
use crate::types::{PrioritizerError, Result};

/// Prioritizer - deadline-based task prioritization service
#[derive(Parser, Debug, Clone)]
#[command(name = "prioritizer")]
#[command(about = "Recomputes task priorities from deadlines and serves them over HTTP")]
pub struct Args {
    /// Unique node identifier for this instance (recorded in the audit log)
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Enable development mode (falls back to an in-memory store if MongoDB is unreachable)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "taskzen")]
    pub mongodb_db: String,

    /// Collection holding task documents
    #[arg(long, env = "TASKS_COLLECTION", default_value = TASK_COLLECTION)]
    pub tasks_collection: String,

    /// Comma-separated list of origins allowed to call the API cross-origin
    #[arg(long, env = "ALLOWED_ORIGINS", default_value = "http://localhost:5001")]
    pub allowed_origins: String,

    /// Deadlines closer than this many hours are HIGH
    #[arg(long, env = "PRIORITY_HIGH_HOURS", default_value = "24")]
    pub priority_high_hours: i64,

    /// Deadlines closer than this many hours (and not HIGH) are MEDIUM
    #[arg(long, env = "PRIORITY_MEDIUM_HOURS", default_value = "72")]
    pub priority_medium_hours: i64,

    /// Request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Append-only JSONL file recording every applied priority change
    #[arg(long, env = "PRIORITY_AUDIT_LOG")]
    pub audit_log: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (text, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,
}

impl Args {
    /// Get the list of allowed CORS origins
    pub fn allowed_origin_list(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Classification thresholds derived from the hour settings
    pub fn thresholds(&self) -> Result<Thresholds> {
        Thresholds::from_hours(self.priority_high_hours, self.priority_medium_hours).ok_or_else(
            || {
                PrioritizerError::Config(
                    "PRIORITY_HIGH_HOURS and PRIORITY_MEDIUM_HOURS must fit in a duration"
                        .to_string(),
                )
            },
        )
    }

    /// Whether logs should be emitted as JSON
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.allowed_origin_list().is_empty() {
            return Err(config_error("ALLOWED_ORIGINS must name at least one origin"));
        }

        if self.priority_high_hours <= 0 {
            return Err(config_error("PRIORITY_HIGH_HOURS must be positive"));
        }

        if self.priority_high_hours > self.priority_medium_hours {
            return Err(config_error(
                "PRIORITY_HIGH_HOURS must be less than or equal to PRIORITY_MEDIUM_HOURS",
            ));
        }

        self.thresholds()?;

        if self.request_timeout_ms == 0 {
            return Err(config_error("REQUEST_TIMEOUT_MS must be greater than zero"));
        }

        match self.log_format.to_ascii_lowercase().as_str() {
            "text" | "json" => {}
            other => {
                return Err(PrioritizerError::Config(format!(
                    "Unknown LOG_FORMAT '{}' (expected text or json)",
                    other
                )))
            }
        }

        if self.tasks_collection.trim().is_empty() {
            return Err(config_error("TASKS_COLLECTION must not be empty"));
        }

        Ok(())
    }
}

fn config_error(msg: &str) -> PrioritizerError {
    PrioritizerError::Config(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["prioritizer"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_validate() {
        let args = parse(&[]);
        assert!(args.validate().is_ok());
        assert_eq!(args.allowed_origin_list(), vec!["http://localhost:5001"]);
        assert_eq!(args.thresholds().unwrap(), Thresholds::default());
        assert_eq!(args.tasks_collection, TASK_COLLECTION);
        assert!(!args.json_logs());
    }

    #[test]
    fn test_origin_list_trims_entries() {
        let args = parse(&["--allowed-origins", " http://a.test/ , ,http://b.test"]);
        assert_eq!(
            args.allowed_origin_list(),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let args = parse(&["--priority-high-hours", "80", "--priority-medium-hours", "72"]);
        let err = args.validate().unwrap_err();
        assert!(matches!(err, PrioritizerError::Config(_)));
        assert!(err.to_string().starts_with("Configuration error: PRIORITY_HIGH_HOURS"));
    }

    #[test]
    fn test_rejects_out_of_range_thresholds() {
        let args = parse(&[
            "--priority-high-hours",
            "24",
            "--priority-medium-hours",
            "9223372036854775807",
        ]);
        assert!(matches!(args.validate(), Err(PrioritizerError::Config(_))));
        assert!(args.thresholds().is_err());

        let args = parse(&[
            "--priority-high-hours",
            "9223372036854775807",
            "--priority-medium-hours",
            "9223372036854775807",
        ]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_origins() {
        let args = parse(&["--allowed-origins", " , "]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let args = parse(&["--log-format", "xml"]);
        assert!(args.validate().is_err());

        let args = parse(&["--log-format", "JSON"]);
        assert!(args.validate().is_ok());
        assert!(args.json_logs());
    }
}
