//! Serve command - runs the HTTP API

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::api::{create_router_with_options, RouterOptions};
use crate::config::AppConfig;
use crate::infrastructure::observability::init_metrics;

/// Run the API server until SIGINT/SIGTERM
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let state = crate::create_app_state_with_config(&config).await?;
    let metrics = init_metrics(&config.metrics).map(|m| (m, config.metrics.path.clone()));

    let app = create_router_with_options(
        state,
        RouterOptions {
            body_limit_bytes: config.server.body_limit_bytes,
            metrics,
        },
    );

    let addr = build_socket_addr(&config)?;
    info!("Starting API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}
