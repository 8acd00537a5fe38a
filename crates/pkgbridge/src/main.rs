//! PkgBridge - aggregation gateway for GitLab package registries

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;
use pkgbridge_api::{AppState, create_router};
use pkgbridge_core::{IndexConfig, ProjectIndex};
use pkgbridge_proxy::{GitLabClient, GitLabClientConfig};

/// PkgBridge - aggregation gateway for GitLab package registries
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "pkgbridge.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "PKGBRIDGE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "PKGBRIDGE_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting PkgBridge v{}", env!("CARGO_PKG_VERSION"));

    // Initialize upstream client
    let client = Arc::new(GitLabClient::new(GitLabClientConfig {
        instance: config.gitlab.instance.clone(),
    })?);

    // Initialize index cache and begin polling
    let index = ProjectIndex::new(
        IndexConfig {
            groups: config.gitlab.groups.clone(),
            poll_interval: Duration::from_secs(config.gitlab.poll_interval_secs),
        },
        client.clone(),
    );
    ProjectIndex::start(&index);

    // Create application state
    let state = AppState::new(
        index.clone(),
        client.clone(),
        config.gitlab.instance.clone(),
        config.gitlab.groups.len(),
    );

    // Create router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    // Shutdown is triggered by stdin commands or CTRL+C; triggering it
    // more than once is harmless.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let command_task = spawn_command_task(shutdown_tx);

    info!("Listening on {}", addr);
    info!("GitLab instance: {}", config.gitlab.instance);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await?;

    // In-flight requests have drained; tear down the rest in order.
    index.close().await;
    drop(client);

    // The command task may still be blocked reading stdin; it is joined
    // last so nothing else outlives it.
    command_task.abort();
    let _ = command_task.await;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Wait for shutdown to be triggered by a stop command or CTRL+C
async fn shutdown_signal(mut triggered: watch::Receiver<bool>) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.expect("Failed to install CTRL+C handler");
            info!("Shutdown signal received");
        }
        _ = triggered.changed() => {}
    }
}

/// Read operator commands until a stop token arrives, then trigger
/// shutdown on the watch channel.
async fn run_command_loop<R>(reader: R, shutdown: watch::Sender<bool>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match line.trim() {
                "exit" | "stop" | "quit" => break,
                _ => {}
            },
            // Input closed or unreadable (e.g. daemonized); leave the
            // server running and rely on CTRL+C.
            Ok(None) => {
                debug!("Control input closed");
                return;
            }
            Err(e) => {
                debug!("Control input error: {}", e);
                return;
            }
        }
    }
    info!("Stop command received");
    let _ = shutdown.send(true);
}

/// Spawn the stdin command loop
fn spawn_command_task(shutdown: watch::Sender<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting command task");
        run_command_loop(BufReader::new(tokio::io::stdin()), shutdown).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stop_command_triggers_shutdown() {
        let (tx, mut rx) = watch::channel(false);
        run_command_loop(&b"status\nstop\n"[..], tx).await;
        assert!(*rx.borrow_and_update());
    }

    #[tokio::test]
    async fn closed_input_leaves_shutdown_untriggered() {
        let (tx, rx) = watch::channel(false);
        run_command_loop(&b"hello\n"[..], tx).await;
        assert!(!*rx.borrow());
    }
}
