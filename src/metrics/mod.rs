//! Metrics module
//!
//! - `ExporterMetrics`: the instrument registry, created exactly once at
//!   exporter construction; only instrument values change afterwards
//! - An async HTTP listener serving `GET /metrics` in the Prometheus
//!   text exposition format

pub mod registry;
pub mod server;

pub use registry::ExporterMetrics;
pub use server::run_metrics_server;
