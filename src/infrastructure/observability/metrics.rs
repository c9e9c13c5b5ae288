//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::MetricsSettings;

const MAX_PATH_LABEL_LEN: usize = 50;

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static NUMERIC_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Installs the global Prometheus recorder
///
/// Returns `None` when disabled or when a recorder is already installed.
pub fn init_metrics(config: &MetricsSettings) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("user_accounts_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!(path = %config.path, "Prometheus metrics initialized");

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Router exposing the scrape endpoint at `path`
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record the outcome of a user record operation (`create`, `update`, ...)
pub fn record_user_operation(operation: &'static str, success: bool) {
    let outcome = if success { "success" } else { "error" };

    counter!("user_operations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

/// Collapses ids in a path so labels stay low-cardinality
fn sanitize_path(path: &str) -> String {
    let path = UUID_SEGMENT.replace_all(path, "{id}");
    let path = NUMERIC_SEGMENT.replace_all(&path, "/{id}$1");

    path.chars().take(MAX_PATH_LABEL_LEN).collect()
}
