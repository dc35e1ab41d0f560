//! JSON response helpers shared by all routes

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::types::PrioritizerError;

pub type FullBody = Full<Bytes>;

/// Error body: `{"error": <reason phrase>, "message": <detail>}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Build a response with an arbitrary body and content type
pub fn raw_response(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<FullBody> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    raw_response(status, "application/json", Bytes::from(json))
}

pub fn error_response(err: &PrioritizerError) -> Response<FullBody> {
    let status = err.status_code();
    json_response(
        status,
        &ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: err.to_string(),
        },
    )
}

pub fn not_found_response(path: &str) -> Response<FullBody> {
    error_response(&PrioritizerError::NotFound(format!("No route for {}", path)))
}
