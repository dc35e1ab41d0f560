//! Cross-origin policy
//!
//! Only the configured origins may call the API from a browser. Requests
//! without an `Origin` header are not CORS requests and pass through
//! untouched; a foreign origin gets `403 Invalid CORS request`.

use bytes::Bytes;
use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
    ACCESS_CONTROL_REQUEST_METHOD, ALLOW, ORIGIN, VARY,
};
use hyper::{Response, StatusCode};

use crate::routes::response::{raw_response, FullBody};

/// How long browsers may cache a preflight answer
pub const PREFLIGHT_MAX_AGE_SECS: u32 = 1800;

const VARY_VALUE: &str = "Origin, Access-Control-Request-Method, Access-Control-Request-Headers";

/// Outcome of checking a request's `Origin`
#[derive(Debug, Clone, PartialEq)]
pub enum CorsDecision {
    /// No `Origin` header
    NotCors,
    /// Origin is allowed; echo it back
    Allowed(HeaderValue),
    Rejected,
}

/// Allow-list of origins
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
}

impl CorsPolicy {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Self { allowed_origins }
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        let origin = origin.trim_end_matches('/');
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed.eq_ignore_ascii_case(origin))
    }

    pub fn check(&self, headers: &HeaderMap) -> CorsDecision {
        match headers.get(ORIGIN) {
            None => CorsDecision::NotCors,
            Some(value) => match value.to_str() {
                Ok(origin) if self.is_allowed(origin) => CorsDecision::Allowed(value.clone()),
                _ => CorsDecision::Rejected,
            },
        }
    }

    /// Whether an `OPTIONS` request is a CORS preflight
    pub fn is_preflight(headers: &HeaderMap) -> bool {
        headers.contains_key(ORIGIN) && headers.contains_key(ACCESS_CONTROL_REQUEST_METHOD)
    }

    /// Add CORS headers to an outgoing response
    pub fn apply(&self, response: &mut Response<FullBody>, decision: &CorsDecision) {
        if let CorsDecision::Allowed(origin) = decision {
            let headers = response.headers_mut();
            headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            headers.insert(VARY, HeaderValue::from_static(VARY_VALUE));
        }
    }

    /// Answer an `OPTIONS` request (preflight or plain) for a resource
    /// serving the comma-separated `allow` methods
    pub fn preflight(&self, headers: &HeaderMap, allow: &'static str) -> Response<FullBody> {

        if !Self::is_preflight(headers) {
            let decision = self.check(headers);
            if decision == CorsDecision::Rejected {
                return rejected_response();
            }
            let mut response = raw_response(StatusCode::OK, "text/plain", Bytes::new());
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static(allow));
            self.apply(&mut response, &decision);
            return response;
        }

        let origin = match self.check(headers) {
            CorsDecision::Allowed(origin) => origin,
            _ => return rejected_response(),
        };

        let method_allowed = headers
            .get(ACCESS_CONTROL_REQUEST_METHOD)
            .and_then(|m| m.to_str().ok())
            .map(|m| allow.split(',').any(|allowed| allowed.trim().eq_ignore_ascii_case(m.trim())))
            .unwrap_or(false);
        if !method_allowed {
            return rejected_response();
        }

        let mut response = raw_response(StatusCode::OK, "text/plain", Bytes::new());
        let out = response.headers_mut();
        out.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        out.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(allow));
        if let Some(requested) = headers.get(ACCESS_CONTROL_REQUEST_HEADERS) {
            out.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        }
        out.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(PREFLIGHT_MAX_AGE_SECS));
        out.insert(VARY, HeaderValue::from_static(VARY_VALUE));
        response
    }
}

/// `403 Invalid CORS request`
pub fn rejected_response() -> Response<FullBody> {
    raw_response(
        StatusCode::FORBIDDEN,
        "text/plain",
        Bytes::from_static(b"Invalid CORS request"),
    )
}
