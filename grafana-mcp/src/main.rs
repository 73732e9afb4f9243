//! Grafana MCP Server Binary
//!
//! ## Usage
//!
//! ```bash
//! # Run as MCP server (stdio)
//! GRAFANA_URL=http://localhost:3000 GRAFANA_SERVICE_ACCOUNT_TOKEN=glsa_... mcp-grafana
//!
//! # Without the admin and Loki tools
//! mcp-grafana --disable-admin --disable-loki
//! ```

use std::sync::Arc;

use clap::Parser;
use grafana_mcp::cli::Cli;
use grafana_mcp::{tools, GrafanaClient, McpError, McpServer};
use grafana_mcp_core::Transport;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing (to stderr so it doesn't interfere with stdio MCP)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Grafana MCP Server v{}", grafana_mcp::SERVER_VERSION);

    let config = cli.to_config().map_err(McpError::from)?;
    if config.transport != Transport::Stdio {
        return Err(McpError::UnsupportedTransport(config.transport.to_string()).into());
    }
    tracing::info!(
        enabled = ?config.enabled_categories,
        "Tool categories"
    );

    let client = Arc::new(GrafanaClient::new(&config.backend)?);
    let server = McpServer::builder(config).tools(tools::all(client)).build();

    let (signal_tx, signal_rx) = tokio::sync::oneshot::channel();
    let signalled = tokio::spawn(async move {
        shutdown_signal().await;
        let _ = signal_tx.send(());
    });

    server
        .run_stdio(async {
            let _ = signal_rx.await;
        })
        .await?;

    // A blocked stdin read keeps the runtime alive after a signal
    if signalled.is_finished() {
        std::process::exit(0);
    }
    signalled.abort();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
