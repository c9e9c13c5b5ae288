//! Health check endpoints for Kubernetes probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};

use serde::Serialize;

use super::state::AppState;
use super::types::Json;

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Simple health check - returns 200 if the service is running
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check: the user store must answer a count query
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let storage_check = check_user_storage(&state).await;
    let overall_status = storage_check.status;

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(vec![storage_check]),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness check for orchestrator probes
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn check_user_storage(state: &AppState) -> HealthCheck {
    let start = Instant::now();
    let result = state.user_service.count().await;
    let latency_ms = Some(start.elapsed().as_millis() as u64);

    match result {
        Ok(_) => HealthCheck {
            name: "user_storage".to_string(),
            status: HealthStatus::Healthy,
            message: None,
            latency_ms,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            HealthCheck {
                name: "user_storage".to_string(),
                status: HealthStatus::Unhealthy,
                message: Some(e.to_string()),
                latency_ms,
            }
        }
    }
}
