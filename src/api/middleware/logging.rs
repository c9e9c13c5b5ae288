//! Request/response logging middleware with sensitive header redaction

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

const REDACTED: &str = "[REDACTED]";

/// Logs each request and its outcome.
///
/// Runs inside the `TraceLayer` span, so it opens no span of its own.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = matched_path(&request);
    let request_id = request_id(request.headers());

    info!(
        method = %method,
        path = %path,
        uri = %request.uri(),
        request_id = %request_id,
        headers = %redact_headers(request.headers()),
        "Incoming request"
    );

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis();

    if status.is_server_error() {
        warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = %duration_ms,
            request_id = %request_id,
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = %duration_ms,
            request_id = %request_id,
            "Request completed"
        );
    }

    response
}

fn matched_path(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

/// Renders the loggable headers as `name=value` pairs with credentials masked
fn redact_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .filter(|(name, _)| should_log_header(name.as_str()))
        .map(|(name, value)| {
            let value = if is_sensitive_header(name.as_str()) {
                REDACTED
            } else {
                value.to_str().unwrap_or("[invalid]")
            };
            format!("{}={}", name.as_str(), value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name,
        "authorization" | "cookie" | "set-cookie" | "x-auth-token" | "proxy-authorization"
    )
}

fn should_log_header(name: &str) -> bool {
    matches!(
        name,
        "content-type"
            | "content-length"
            | "accept"
            | "user-agent"
            | "x-request-id"
            | "x-forwarded-for"
            | "x-real-ip"
            | "authorization"
            | "cookie"
    )
}
