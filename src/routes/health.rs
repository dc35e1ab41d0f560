//! Health check endpoints
//!
//! Provides Kubernetes-style health endpoints:
//! - /health, /healthz - Liveness (is the service running?)
//! - /ready, /readyz - Readiness (can the task store be reached?)
//!
//! Liveness always returns 200. Readiness pings the task repository and
//! returns 503 when it fails.

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::response::{json_response, FullBody};
use crate::server::AppState;

/// Health response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall health status (true if service is running)
    pub healthy: bool,
    /// 'online' or 'degraded' (store unreachable)
    pub status: &'static str,
    /// Service version
    pub version: &'static str,
    /// Seconds since startup
    pub uptime: u64,
    /// Current timestamp
    pub timestamp: String,
    /// Operating mode
    pub mode: &'static str,
    /// Node identifier
    pub node_id: String,
    /// Task store status
    pub store: StoreHealth,
    /// Active classification boundaries, in hours
    pub thresholds: ThresholdHours,
    /// Error message if the store is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Task store health details
#[derive(Serialize)]
pub struct StoreHealth {
    /// "mongodb" or "memory"
    pub backend: &'static str,
    /// Whether the last check reached the store (None for liveness, which skips the store)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
}

#[derive(Serialize)]
pub struct ThresholdHours {
    pub high: i64,
    pub medium: i64,
}

fn build_health_response(state: &AppState, connected: Option<bool>, error: Option<String>) -> HealthResponse {
    let thresholds = state.tasks.thresholds();
    HealthResponse {
        healthy: true,
        status: if connected == Some(false) { "degraded" } else { "online" },
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        node_id: state.args.node_id.to_string(),
        store: StoreHealth {
            backend: state.store_backend,
            connected,
        },
        thresholds: ThresholdHours {
            high: thresholds.high_within.num_hours(),
            medium: thresholds.medium_within.num_hours(),
        },
        error,
    }
}

/// Handle liveness check (/health, /healthz)
pub fn health_check(state: &AppState) -> Response<FullBody> {
    json_response(StatusCode::OK, &build_health_response(state, None, None))
}

/// Handle readiness check (/ready, /readyz)
///
/// Returns 200 only if the task repository answers a ping.
pub async fn readiness_check(state: &AppState) -> Response<FullBody> {
    let (status, response) = match state.tasks.repository().ping().await {
        Ok(()) => (StatusCode::OK, build_health_response(state, Some(true), None)),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            build_health_response(state, Some(false), Some(e.to_string())),
        ),
    };

    json_response(status, &response)
}

/// Version information for deployment verification
#[derive(Serialize)]
pub struct VersionResponse {
    /// Cargo package version
    pub version: &'static str,
    /// Git commit hash (short)
    pub commit: &'static str,
    /// Git commit hash (full)
    pub commit_full: &'static str,
    /// Build timestamp
    pub build_time: &'static str,
    /// Service name
    pub service: &'static str,
}

/// Handle version endpoint (/version)
pub fn version_info() -> Response<FullBody> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_COMMIT_SHORT").unwrap_or("unknown"),
        commit_full: option_env!("GIT_COMMIT_FULL").unwrap_or("unknown"),
        build_time: option_env!("BUILD_TIMESTAMP").unwrap_or("unknown"),
        service: "prioritizer",
    };

    json_response(StatusCode::OK, &response)
}
