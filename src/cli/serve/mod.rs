//! Serve command - runs the HTTP API

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::api::{create_router, AppState, RouterOptions};
use crate::config::{AppConfig, ServerConfig};
use crate::infrastructure::observability::{init_metrics, init_tracing, shutdown_tracing};

/// Run the API server until Ctrl+C or SIGTERM
pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging, &config.observability.tracing);
    config.validate()?;

    let service = crate::create_initialized_service(&config).await?;
    let metrics = init_metrics(&config.observability.metrics)
        .map(|m| (m, config.observability.metrics.path.clone()));

    let app = create_router(
        AppState::new(Arc::new(service)),
        RouterOptions {
            cors_permissive: config.server.cors_permissive,
            metrics,
        },
    );

    let addr = build_socket_addr(&config.server)?;
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tracing();
    info!("Server shutdown complete");

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

fn build_socket_addr(server: &ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        server.host.parse::<std::net::IpAddr>()?,
        server.port,
    )))
}
