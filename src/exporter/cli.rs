use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use crate::config::Config;
use crate::exporter::Exporter;
use crate::metrics::{run_metrics_server, ExporterMetrics};
use crate::rpc::HttpZcashRpc;
use crate::utils::init_logging;

/// CLI for the exporter. A single long-running foreground process; every
/// flag can also come from the matching environment variable.
#[derive(Parser, Debug)]
#[clap(name = "zcashd-exporter", version)]
pub struct Cli {
    /// RPC username
    #[clap(long, env = "ZCASHD_RPCUSER")]
    pub rpc_user: Option<String>,

    /// RPC password
    #[clap(long, env = "ZCASHD_RPCPASSWORD", hide_env_values = true)]
    pub rpc_password: Option<String>,

    /// RPC host (default 127.0.0.1)
    #[clap(long, env = "ZCASHD_RPCHOST")]
    pub rpc_host: Option<String>,

    /// RPC port
    #[clap(long, env = "ZCASHD_RPCPORT")]
    pub rpc_port: Option<String>,

    /// Metrics listener port (default 9100)
    #[clap(long, env = "EXPORTER_LISTEN_PORT")]
    pub listen_port: Option<String>,

    /// Startup gate retry cadence in seconds (default 5)
    #[clap(long, env = "EXPORTER_STARTUP_POLL_SECS")]
    pub startup_poll_secs: Option<String>,

    /// Refresh loop cadence in seconds (default 2)
    #[clap(long, env = "EXPORTER_POLL_SECS")]
    pub poll_secs: Option<String>,
}

pub async fn run_cli() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    // Configuration failures are fatal before any network activity.
    let config = Config::load(&cli).map_err(|e| {
        error!("configuration error: {e}");
        e
    })?;

    let metrics = Arc::new(ExporterMetrics::new()?);
    let rpc = Arc::new(HttpZcashRpc::new(&config)?);
    let exporter = Arc::new(Exporter::new(rpc, metrics.clone(), &config));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Metrics listener runs independently; it only reads instruments.
    {
        let metrics = metrics.clone();
        let addr = config.listen_addr();
        tokio::spawn(async move {
            if let Err(e) = run_metrics_server(metrics, addr).await {
                error!("metrics server failed: {:?}", e);
            }
        });
    }

    let run_handle = {
        let exporter = exporter.clone();
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            exporter.run(shutdown_rx).await;
        })
    };

    info!(
        "exporter started, polling {} every {:?}",
        config.rpc_url(),
        config.poll_interval
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down exporter...");
    let _ = shutdown_tx.send(true);
    run_handle.await?;
    Ok(())
}
