use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use relay_bridge::config::{self, Config, Policy};
use relay_bridge::gateway;
use relay_bridge::observability;
use relay_bridge::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Config::parse();
    observability::init(&cli.log_level);

    let coordinator_addr = config::resolve_coordinator_addr().await?;
    let policy = Arc::new(Policy::from_config(&cli, coordinator_addr));
    let state = AppState::new(policy.clone());

    let app = gateway::router(state);

    let listen_addr = SocketAddr::from(([0, 0, 0, 0], policy.listen_port));
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(target: "server", %listen_addr, "relay-bridge listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!(target: "server", "relay-bridge shut down");
    Ok(())
}

/// Waits for Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!(target: "server", "shutdown signal received");
}
