//! Exporter configuration.
//!
//! Configuration is environment-sourced (`ZCASHD_*` / `EXPORTER_*`
//! variables) with optional CLI flag overrides; clap merges the two before
//! [`Config::load`] validates them. The struct is built once at startup and
//! immutable afterwards. A missing required value is a configuration error,
//! never silently defaulted.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::exporter::cli::Cli;

/// Configuration-load failure. Fatal at process start (exit code 1),
/// before any network activity.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required configuration value {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Immutable exporter configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// RPC endpoint credentials.
    pub rpc_user: String,
    pub rpc_password: String,
    /// RPC endpoint address.
    pub rpc_host: String,
    pub rpc_port: u16,
    /// Port the Prometheus scrape endpoint listens on.
    pub listen_port: u16,
    /// Startup gate retry cadence.
    pub startup_poll_interval: Duration,
    /// Refresh loop cadence.
    pub poll_interval: Duration,
}

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_LISTEN_PORT: u16 = 9100;
const DEFAULT_STARTUP_POLL_SECS: u64 = 5;
const DEFAULT_POLL_SECS: u64 = 2;

impl Config {
    /// Validate the merged CLI/environment values into a `Config`.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let rpc_user = require(&cli.rpc_user, "ZCASHD_RPCUSER")?;
        let rpc_password = require(&cli.rpc_password, "ZCASHD_RPCPASSWORD")?;
        let rpc_port = parse(&require(&cli.rpc_port, "ZCASHD_RPCPORT")?, "ZCASHD_RPCPORT")?;

        let rpc_host = cli
            .rpc_host
            .clone()
            .unwrap_or_else(|| DEFAULT_RPC_HOST.to_string());
        let listen_port = match &cli.listen_port {
            Some(v) => parse(v, "EXPORTER_LISTEN_PORT")?,
            None => DEFAULT_LISTEN_PORT,
        };
        let startup_poll_secs: u64 = match &cli.startup_poll_secs {
            Some(v) => parse(v, "EXPORTER_STARTUP_POLL_SECS")?,
            None => DEFAULT_STARTUP_POLL_SECS,
        };
        let poll_secs: u64 = match &cli.poll_secs {
            Some(v) => parse(v, "EXPORTER_POLL_SECS")?,
            None => DEFAULT_POLL_SECS,
        };

        Ok(Config {
            rpc_user,
            rpc_password,
            rpc_host,
            rpc_port,
            listen_port,
            startup_poll_interval: Duration::from_secs(startup_poll_secs),
            poll_interval: Duration::from_secs(poll_secs),
        })
    }

    /// URL of the node's JSON-RPC endpoint.
    pub fn rpc_url(&self) -> String {
        format!("http://{}:{}", self.rpc_host, self.rpc_port)
    }

    /// Address the metrics listener binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.listen_port))
    }
}

fn require(value: &Option<String>, key: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &'static str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
