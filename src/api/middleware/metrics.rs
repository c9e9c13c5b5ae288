//! HTTP metrics middleware for recording request/response metrics

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::infrastructure::observability::record_http_request;

/// Middleware to record HTTP request metrics
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = extract_path(&request);

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status().as_u16();

    record_http_request(method.as_str(), &path, status, duration);

    response
}

/// Route template when matched, raw path otherwise
fn extract_path(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_middleware_passes_response_through() {
        let app = Router::new()
            .route("/user/{id}", get(|| async { "ok" }))
            .layer(middleware::from_fn(metrics_middleware));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/user/550e8400-e29b-41d4-a716-446655440000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
