//! HTTP API integration tests against the in-memory task store

use bytes::Bytes;
use chrono::{TimeDelta, Utc};
use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;

use prioritizer::config::Args;
use prioritizer::db::TaskDoc;
use prioritizer::routes::FullBody;
use prioritizer::server::{handle_request, AppState};
use prioritizer::tasks::{InMemoryTaskRepository, Priority, TaskService, Thresholds};

const ORIGIN: &str = "http://localhost:5001";

fn addr() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

fn task(title: &str, due_in: Option<TimeDelta>, priority: Option<Priority>) -> TaskDoc {
    TaskDoc::new(
        title.to_string(),
        format!("{} details", title),
        due_in.map(|d| bson::DateTime::from_chrono(Utc::now() + d)),
        priority,
    )
}

async fn setup(tasks: Vec<TaskDoc>) -> (Arc<AppState>, Arc<InMemoryTaskRepository>) {
    let args = Args::try_parse_from(["prioritizer", "--allowed-origins", ORIGIN]).unwrap();
    let repo = Arc::new(InMemoryTaskRepository::with_tasks(tasks).await);
    let service = TaskService::new(repo.clone(), Thresholds::default());
    (Arc::new(AppState::new(args, service, "memory")), repo)
}

fn request(method: &str, uri: &str, body: Option<&str>) -> Request<Full<Bytes>> {
    let body = body.map(|b| Bytes::from(b.to_string())).unwrap_or_default();
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Full::new(body))
        .unwrap()
}

async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> Response<FullBody> {
    handle_request(Arc::clone(state), addr(), req).await
}

async fn json_body(response: Response<FullBody>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_prioritize_returns_relabelled_tasks() {
    let (state, repo) = setup(vec![
        task("tomorrow-ish", Some(TimeDelta::hours(6)), Some(Priority::Low)),
        task("in two days", Some(TimeDelta::hours(48)), Some(Priority::Low)),
        task("next week", Some(TimeDelta::days(7)), Some(Priority::Low)),
    ])
    .await;

    let response = send(&state, request("GET", "/api/tasks/prioritize", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let tasks = body.as_array().unwrap();
    assert_eq!(tasks.len(), 3);

    let priorities: Vec<&str> = tasks.iter().map(|t| t["priority"].as_str().unwrap()).collect();
    assert_eq!(priorities, vec!["HIGH", "MEDIUM", "LOW"]);

    for t in tasks {
        assert_eq!(t["id"].as_str().unwrap().len(), 24);
        assert!(t["title"].is_string());
        assert!(t["description"].is_string());
        assert!(t["deadline"].is_string());
    }

    // Only the two changed labels were written
    assert_eq!(repo.write_count(), 2);
}

#[tokio::test]
async fn test_prioritize_twice_is_stable() {
    let (state, repo) = setup(vec![
        task("a", Some(TimeDelta::hours(2)), None),
        task("b", Some(TimeDelta::days(2)), Some(Priority::High)),
        task("c", None, Some(Priority::Low)),
    ])
    .await;

    let first = json_body(send(&state, request("GET", "/api/tasks/prioritize", None)).await).await;
    let writes = repo.write_count();
    let second = json_body(send(&state, request("GET", "/api/tasks/prioritize", None)).await).await;

    assert_eq!(first, second);
    assert_eq!(repo.write_count(), writes);
    assert_eq!(second[2]["deadline"], Value::Null);
    assert_eq!(second[2]["priority"], "LOW");
}

#[tokio::test]
async fn test_cors_allowed_origin_is_echoed() {
    let (state, _repo) = setup(vec![]).await;

    let mut req = request("GET", "/api/tasks/prioritize", None);
    req.headers_mut().insert("origin", ORIGIN.parse().unwrap());
    let response = send(&state, req).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        ORIGIN
    );
}

#[tokio::test]
async fn test_cors_foreign_origin_is_rejected() {
    let (state, repo) = setup(vec![task("a", Some(TimeDelta::hours(1)), None)]).await;

    let mut req = request("GET", "/api/tasks/prioritize", None);
    req.headers_mut()
        .insert("origin", "http://elsewhere.test".parse().unwrap());
    let response = send(&state, req).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"Invalid CORS request");
    // Rejected before reaching the service
    assert_eq!(repo.write_count(), 0);
}

#[tokio::test]
async fn test_no_origin_gets_no_cors_headers() {
    let (state, _repo) = setup(vec![]).await;
    let response = send(&state, request("GET", "/api/tasks", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_preflight() {
    let (state, _repo) = setup(vec![]).await;

    let mut req = request("OPTIONS", "/api/tasks/prioritize", None);
    req.headers_mut().insert("origin", ORIGIN.parse().unwrap());
    req.headers_mut()
        .insert("access-control-request-method", "GET".parse().unwrap());
    let response = send(&state, req).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        ORIGIN
    );
    assert!(response
        .headers()
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("GET"));
}

#[tokio::test]
async fn test_options_is_route_aware() {
    let (state, _repo) = setup(vec![]).await;

    let response = send(&state, request("OPTIONS", "/api/tasks", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("allow").unwrap(), "GET, POST, OPTIONS");

    let response = send(&state, request("OPTIONS", "/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("allow").unwrap(), "GET, OPTIONS");

    let response = send(&state, request("OPTIONS", "/nowhere", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("allow").is_none());

    // Preflight for a method the resource does not serve
    let mut req = request("OPTIONS", "/api/tasks/prioritize", None);
    req.headers_mut().insert("origin", ORIGIN.parse().unwrap());
    req.headers_mut()
        .insert("access-control-request-method", "DELETE".parse().unwrap());
    assert_eq!(send(&state, req).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_task_crud_roundtrip() {
    let (state, _repo) = setup(vec![]).await;

    let deadline = (Utc::now() + TimeDelta::hours(30)).to_rfc3339();
    let create = format!(r#"{{"title":"Book flights","deadline":"{}"}}"#, deadline);
    let response = send(&state, request("POST", "/api/tasks", Some(&create))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["priority"], "MEDIUM");
    assert_eq!(created["description"], "");
    let id = created["id"].as_str().unwrap().to_string();

    let response = send(&state, request("GET", &format!("/api/tasks/{}", id), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["title"], "Book flights");

    let response = send(
        &state,
        request(
            "PUT",
            &format!("/api/tasks/{}", id),
            Some(r#"{"title":"Book trains","priority":"LOW"}"#),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["title"], "Book trains");
    assert_eq!(updated["priority"], "LOW");

    let list = json_body(send(&state, request("GET", "/api/tasks", None)).await).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let response = send(&state, request("DELETE", &format!("/api/tasks/{}", id), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["message"], "Task deleted successfully");

    let response = send(&state, request("GET", &format!("/api/tasks/{}", id), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_client_errors() {
    let (state, _repo) = setup(vec![]).await;

    let response = send(&state, request("GET", "/api/tasks/not-an-id", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Bad Request");

    let response = send(&state, request("POST", "/api/tasks", Some("{not json"))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(
        &state,
        request("POST", "/api/tasks", Some(r#"{"title":"x","priority":"URGENT"}"#)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&state, request("POST", "/api/tasks/prioritize", None)).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let response = send(&state, request("GET", "/nowhere", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_readiness() {
    let (state, repo) = setup(vec![]).await;

    let response = send(&state, request("GET", "/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["healthy"], true);
    assert_eq!(body["store"]["backend"], "memory");
    assert_eq!(body["thresholds"]["high"], 24);
    assert_eq!(body["thresholds"]["medium"], 72);

    let response = send(&state, request("GET", "/ready", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    repo.set_available(false);
    let response = send(&state, request("GET", "/readyz", None)).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["store"]["connected"], false);

    let response = send(&state, request("GET", "/version", None)).await;
    assert_eq!(json_body(response).await["service"], "prioritizer");
}
