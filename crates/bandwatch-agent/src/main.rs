//! Bandwatch Agent
//!
//! Daemon that watches one cellular modem over its HTTP management API.
//!
//! - Polls signal/network/status/antenna telemetry on a fixed period
//! - Serves the presentation snapshot and lock endpoint for the panel
//! - Drives two-phase band-lock sequences on request
//! - With `--lock`, applies one selection expression and exits

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use bandwatch_agent::config::AgentConfig;
use bandwatch_agent::{panel, poller, AgentState};

/// Bandwatch modem agent daemon.
#[derive(Parser, Debug)]
#[command(name = "bandwatch-agent", about = "Modem telemetry and band-lock agent")]
struct Cli {
    /// Modem management base URL.
    #[arg(long)]
    modem_url: Option<String>,

    /// TOML config file; CLI flags win over file values.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Panel API listen address.
    #[arg(long)]
    listen: Option<String>,

    /// Telemetry poll period in milliseconds.
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Submit network mode 03 (LTE only) instead of 00 (auto).
    #[arg(long, default_value_t = false)]
    force_lte_only: bool,

    /// Apply one band selection expression (e.g. "3m+1+20") and exit.
    #[arg(long)]
    lock: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            AgentConfig::from_toml_str(&raw).map_err(anyhow::Error::msg)?
        }
        None => AgentConfig::default(),
    };
    if let Some(url) = cli.modem_url {
        config.modem_url = url.trim_end_matches('/').to_string();
    }
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    if let Some(ms) = cli.poll_interval_ms {
        config.poll_interval = Duration::from_millis(ms.max(100));
    }
    if cli.force_lte_only {
        config.force_lte_only = true;
    }

    tracing::info!(
        modem_url = %config.modem_url,
        listen = %config.listen_addr,
        "bandwatch-agent starting"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = Arc::new(AgentState::new(config, shutdown_rx));

    // One-shot mode: apply the lock and exit; no poller, no panel.
    if let Some(expression) = cli.lock {
        state
            .orchestrator
            .apply(&expression, state.config.force_lte_only)
            .await?;
        tracing::info!(expression = %expression, "band lock applied");
        return Ok(());
    }

    // ── Task 1: telemetry poller ────────────────────────────────
    let poller_state = state.clone();
    tokio::spawn(async move {
        poller::run(poller_state).await;
    });

    // ── Task 2: panel API ───────────────────────────────────────
    let addr: SocketAddr = state.config.listen_addr.parse()?;
    let app = panel::router(state.clone());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("panel API on http://{addr}");
    let panel_handle = tokio::spawn(async move { axum::serve(listener, app).await });

    // ── Shutdown handling ───────────────────────────────────────
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT, shutting down");
            let _ = shutdown_tx.send(true);
        }
        result = panel_handle => {
            if let Err(e) = result {
                tracing::error!("panel task failed: {e}");
            }
        }
    }

    tracing::info!("bandwatch-agent stopped");
    Ok(())
}
