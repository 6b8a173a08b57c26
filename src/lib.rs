//! Prometheus exporter for zcashd full nodes.
//!
//! The exporter polls a zcashd node's JSON-RPC interface on a fixed
//! interval and republishes selected fields as Prometheus metrics on an
//! HTTP endpoint, so operators can observe node health (sync progress,
//! chain state, memory, network totals) without instrumenting the node
//! itself.

pub mod config;
pub mod exporter;
pub mod metrics;
pub mod rpc;
pub mod utils;

pub use config::Config;
pub use exporter::Exporter;
pub use metrics::ExporterMetrics;
