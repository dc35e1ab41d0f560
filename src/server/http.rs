//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::routes::{self, error_response, FullBody};
use crate::server::cors::{self, CorsDecision, CorsPolicy};
use crate::tasks::TaskService;
use crate::types::{PrioritizerError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Prioritization and CRUD over the configured repository
    pub tasks: TaskService,
    /// Allowed cross-origin callers
    pub cors: CorsPolicy,
    /// Which repository backs `tasks` ("mongodb" or "memory")
    pub store_backend: &'static str,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, tasks: TaskService, store_backend: &'static str) -> Self {
        let cors = CorsPolicy::new(args.allowed_origin_list());
        Self {
            args,
            tasks,
            cors,
            store_backend,
            started_at: Instant::now(),
        }
    }
}

/// Accept connections until the process exits
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Prioritizer listening on {} as node {}",
        state.args.listen, state.args.node_id
    );
    info!(
        "Cross-origin access allowed for: {}",
        state.cors.allowed_origins().join(", ")
    );

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, Infallible>(handle_request(state, addr, req).await) }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route an incoming HTTP request, applying CORS and the request timeout
pub async fn handle_request<B>(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<B>,
) -> Response<FullBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    // OPTIONS on an unknown path falls through to the 404 below
    if method == Method::OPTIONS {
        if let Some(allow) = allowed_methods(&path) {
            return state.cors.preflight(req.headers(), allow);
        }
    }

    let decision = state.cors.check(req.headers());
    if decision == CorsDecision::Rejected {
        warn!("[{}] Rejected cross-origin request to {}", addr, path);
        return cors::rejected_response();
    }

    let timeout_ms = state.args.request_timeout_ms;
    let result = match tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        dispatch(Arc::clone(&state), req, &method, &path),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(PrioritizerError::Timeout(timeout_ms)),
    };

    let mut response = match result {
        Ok(response) => response,
        Err(e) => {
            if e.status_code().is_server_error() {
                error!("[{}] {} {} failed: {}", addr, method, path, e);
            } else {
                warn!("[{}] {} {} -> {}", addr, method, path, e);
            }
            error_response(&e)
        }
    };

    state.cors.apply(&mut response, &decision);
    response
}

/// Methods served on `path`, or `None` if nothing is routed there
fn allowed_methods(path: &str) -> Option<&'static str> {
    match path {
        "/health" | "/healthz" | "/ready" | "/readyz" | "/version" => Some("GET, OPTIONS"),
        p => routes::match_task_route(p).map(|route| route.allowed_methods()),
    }
}

async fn dispatch<B>(
    state: Arc<AppState>,
    req: Request<B>,
    method: &Method,
    path: &str,
) -> Result<Response<FullBody>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match (method, path) {
        // Liveness
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => Ok(routes::health_check(&state)),

        // Readiness - pings the task store
        (&Method::GET, "/ready") | (&Method::GET, "/readyz") => {
            Ok(routes::readiness_check(&state).await)
        }

        (&Method::GET, "/version") => Ok(routes::version_info()),

        (_, p) => match routes::match_task_route(p) {
            Some(route) => routes::handle_tasks_request(Arc::clone(&state), req, route).await,
            None => Ok(routes::not_found_response(p)),
        },
    }
}
