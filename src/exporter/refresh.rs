//! Steady-state refresh loop and fetch cycle.
//!
//! Each cycle issues the full set of RPC calls and maps successful
//! responses onto instruments. Calls fail independently: a failed call
//! skips only its own instruments (previous values persist) and is
//! simply retried on the next cycle. Nothing here ever propagates an
//! error out of the loop, and a connection loss after readiness never
//! re-enters startup gating.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::rpc::types::Network;
use crate::rpc::ZcashRpc;

use super::Exporter;

/// Verification progress at or above this counts as synced.
const SYNCED_THRESHOLD: f64 = 0.9999;

impl<R: ZcashRpc> Exporter<R> {
    /// Poll until shutdown: one fetch cycle, then sleep the configured
    /// interval.
    pub(crate) async fn run_refresh_loop(&self, shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                info!("refresh loop shutting down");
                return;
            }
            self.fetch_cycle().await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// One round of RPC calls plus instrument updates.
    pub(crate) async fn fetch_cycle(&self) {
        match self.rpc.get_info().await {
            Ok(info) => {
                self.metrics.version.set(info.version as i64);
                self.metrics.protocol_version.set(info.protocolversion as i64);
                self.metrics.blocks.set(info.blocks as i64);
                self.metrics.connections.set(info.connections as i64);
                self.metrics.difficulty.set(info.difficulty);
            }
            Err(e) => warn!("getinfo failed, skipping its instruments: {e}"),
        }

        match self.rpc.get_blockchain_info().await {
            Ok(chain_info) => {
                let network = Network::from_chain(&chain_info.chain);
                if let Some(session) = *self.session_network.lock() {
                    if session != network {
                        warn!(
                            reported = network.as_str(),
                            session = session.as_str(),
                            "node reports a different chain than at startup"
                        );
                    }
                }
                self.metrics.set_network_type(network);
                self.metrics.chain_blocks.set(chain_info.blocks as i64);
                self.metrics.chain_headers.set(chain_info.headers as i64);
                self.metrics
                    .verification_progress
                    .set(chain_info.verificationprogress);
                self.metrics.size_on_disk.set(chain_info.size_on_disk as i64);
                self.metrics
                    .set_synced(chain_info.verificationprogress >= SYNCED_THRESHOLD);
            }
            Err(e) => warn!("getblockchaininfo failed, skipping its instruments: {e}"),
        }

        match self.rpc.get_mempool_info().await {
            Ok(mempool) => {
                self.metrics.mempool_size.set(mempool.size as i64);
                self.metrics.mempool_bytes.set(mempool.bytes as i64);
                self.metrics.mempool_usage.set(mempool.usage as i64);
            }
            Err(e) => warn!("getmempoolinfo failed, skipping its instruments: {e}"),
        }

        match self.rpc.get_network_totals().await {
            Ok(totals) => {
                self.metrics
                    .net_total_bytes_recv
                    .set(totals.totalbytesrecv as i64);
                self.metrics
                    .net_total_bytes_sent
                    .set(totals.totalbytessent as i64);
            }
            Err(e) => warn!("getnetworktotals failed, skipping its instruments: {e}"),
        }

        match self.rpc.get_memory_info().await {
            Ok(memory) => {
                self.metrics.memory_locked_used.set(memory.locked.used as i64);
                self.metrics
                    .memory_locked_total
                    .set(memory.locked.total as i64);
            }
            Err(e) => warn!("getmemoryinfo failed, skipping its instruments: {e}"),
        }

        match self.rpc.get_deprecation_info().await {
            Ok(deprecation) => {
                self.metrics
                    .deprecation_height
                    .set(deprecation.deprecationheight as i64);
                self.metrics
                    .set_build_version(deprecation.version, &deprecation.subversion);
            }
            Err(e) => warn!("getdeprecationinfo failed, skipping its instruments: {e}"),
        }
    }
}
