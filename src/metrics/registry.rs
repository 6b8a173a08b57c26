//! Prometheus instrument registry.
//!
//! One struct owns the `prometheus::Registry` and every instrument the
//! exporter publishes. The set is fixed at construction; the fetch path
//! overwrites values, the scrape path reads them, and the `prometheus`
//! crate guarantees each individual read/write is atomic.
//!
//! Instrument kinds:
//! - Gauge: plain `Gauge`/`IntGauge`, last observed value.
//! - Info: an `IntGaugeVec` whose single live series carries the strings
//!   as labels, reset-then-set on overwrite.
//! - Enumeration state: an `IntGaugeVec` over a fixed `state` label set,
//!   exactly one series at 1.

use prometheus::{Encoder, Gauge, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use tracing::error;

use crate::rpc::types::Network;

/// States of the `zcash_synced` enumeration instrument.
pub const SYNCED_STATES: [&str; 2] = ["not_synced", "synced"];

/// Every instrument the exporter publishes.
#[derive(Clone)]
pub struct ExporterMetrics {
    registry: Registry,

    // getinfo
    pub version: IntGauge,
    pub protocol_version: IntGauge,
    pub blocks: IntGauge,
    pub connections: IntGauge,
    pub difficulty: Gauge,

    // getblockchaininfo
    pub chain_blocks: IntGauge,
    pub chain_headers: IntGauge,
    pub verification_progress: Gauge,
    pub size_on_disk: IntGauge,
    network_type: IntGaugeVec,
    synced: IntGaugeVec,

    // getmempoolinfo
    pub mempool_size: IntGauge,
    pub mempool_bytes: IntGauge,
    pub mempool_usage: IntGauge,

    // getnetworktotals
    pub net_total_bytes_recv: IntGauge,
    pub net_total_bytes_sent: IntGauge,

    // getmemoryinfo
    pub memory_locked_used: IntGauge,
    pub memory_locked_total: IntGauge,

    // getdeprecationinfo
    pub deprecation_height: IntGauge,
    build_version: IntGaugeVec,
}

impl ExporterMetrics {
    /// Create the registry and register every instrument.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let version = int_gauge(&registry, "zcash_version", "Node version number")?;
        let protocol_version = int_gauge(
            &registry,
            "zcash_protocol_version",
            "P2P protocol version number",
        )?;
        let blocks = int_gauge(&registry, "zcash_blocks", "Block height")?;
        let connections = int_gauge(&registry, "zcash_connections", "Number of peer connections")?;
        let difficulty = gauge(&registry, "zcash_difficulty", "Current proof-of-work difficulty")?;

        let chain_blocks = int_gauge(
            &registry,
            "zcash_chain_blocks",
            "Number of fully validated blocks on the best chain",
        )?;
        let chain_headers = int_gauge(
            &registry,
            "zcash_chain_headers",
            "Number of validated block headers",
        )?;
        let verification_progress = gauge(
            &registry,
            "zcash_verification_progress",
            "Estimated chain verification progress (0..1)",
        )?;
        let size_on_disk = int_gauge(
            &registry,
            "zcash_size_on_disk_bytes",
            "Estimated blockchain size on disk in bytes",
        )?;
        let network_type = int_gauge_vec(
            &registry,
            "zcash_network_type",
            "Zcash network type",
            &["state"],
        )?;
        let synced = int_gauge_vec(
            &registry,
            "zcash_synced",
            "Whether the node has completed initial block download",
            &["state"],
        )?;

        let mempool_size = int_gauge(
            &registry,
            "zcash_mempool_size",
            "Number of transactions in the mempool",
        )?;
        let mempool_bytes = int_gauge(
            &registry,
            "zcash_mempool_bytes",
            "Sum of mempool transaction sizes in bytes",
        )?;
        let mempool_usage = int_gauge(
            &registry,
            "zcash_mempool_usage_bytes",
            "Total memory usage of the mempool in bytes",
        )?;

        let net_total_bytes_recv = int_gauge(
            &registry,
            "zcash_net_total_bytes_recv",
            "Total bytes received over the P2P network",
        )?;
        let net_total_bytes_sent = int_gauge(
            &registry,
            "zcash_net_total_bytes_sent",
            "Total bytes sent over the P2P network",
        )?;

        let memory_locked_used = int_gauge(
            &registry,
            "zcash_memory_locked_used_bytes",
            "Bytes used in the node's locked memory manager",
        )?;
        let memory_locked_total = int_gauge(
            &registry,
            "zcash_memory_locked_total_bytes",
            "Total bytes allocated by the node's locked memory manager",
        )?;

        let deprecation_height = int_gauge(
            &registry,
            "zcash_deprecation_height",
            "Block height at which this node version will deprecate itself",
        )?;
        let build_version = int_gauge_vec(
            &registry,
            "zcash_build_version",
            "Zcash build description information",
            &["version", "subversion"],
        )?;

        Ok(Self {
            registry,
            version,
            protocol_version,
            blocks,
            connections,
            difficulty,
            chain_blocks,
            chain_headers,
            verification_progress,
            size_on_disk,
            network_type,
            synced,
            mempool_size,
            mempool_bytes,
            mempool_usage,
            net_total_bytes_recv,
            net_total_bytes_sent,
            memory_locked_used,
            memory_locked_total,
            deprecation_height,
            build_version,
        })
    }

    /// Overwrite the network-type enumeration: selected state 1, rest 0.
    pub fn set_network_type(&self, network: Network) {
        for state in Network::STATES {
            self.network_type.with_label_values(&[state]).set(0);
        }
        self.network_type
            .with_label_values(&[network.as_str()])
            .set(1);
    }

    /// Overwrite the synced enumeration.
    pub fn set_synced(&self, synced: bool) {
        for state in SYNCED_STATES {
            self.synced.with_label_values(&[state]).set(0);
        }
        let state = if synced { "synced" } else { "not_synced" };
        self.synced.with_label_values(&[state]).set(1);
    }

    /// Overwrite the build-version info instrument.
    pub fn set_build_version(&self, version: u64, subversion: &str) {
        // Drop any previously published label combination first.
        self.build_version.reset();
        let version = version.to_string();
        self.build_version
            .with_label_values(&[version.as_str(), subversion])
            .set(1);
    }

    /// Whether the network-type enumeration has been published yet.
    /// The startup gate publishes nothing until it succeeds.
    pub fn network_type_published(&self) -> bool {
        self.registry
            .gather()
            .iter()
            .any(|mf| mf.get_name() == "zcash_network_type" && !mf.get_metric().is_empty())
    }

    /// Encode all instruments in the Prometheus text exposition format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            error!("failed to encode metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

fn int_gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGauge, prometheus::Error> {
    let g = IntGauge::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<Gauge, prometheus::Error> {
    let g = Gauge::with_opts(Opts::new(name, help))?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn int_gauge_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<IntGaugeVec, prometheus::Error> {
    let g = IntGaugeVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}
