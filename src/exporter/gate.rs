//! Startup gate: block until the node is reachable and past warm-up.
//!
//! Premature scraping would publish misleading defaults (zero blocks),
//! so nothing is published until one readiness call succeeds. Retries
//! are unbounded; the gate waits forever for the node to come up.

use tokio::sync::watch;
use tracing::{info, warn};

use crate::rpc::types::Network;
use crate::rpc::{RpcError, ZcashRpc};

use super::Exporter;

impl<R: ZcashRpc> Exporter<R> {
    /// Poll `getblockchaininfo` until it succeeds, then classify and
    /// publish the reported chain and cache it as the session network
    /// identity.
    ///
    /// Returns `None` only if shutdown is signalled while still waiting.
    pub(crate) async fn wait_for_node(
        &self,
        shutdown: &watch::Receiver<bool>,
    ) -> Option<Network> {
        loop {
            if *shutdown.borrow() {
                info!("startup gate interrupted by shutdown");
                return None;
            }

            match self.rpc.get_blockchain_info().await {
                Ok(chain_info) => {
                    let network = Network::from_chain(&chain_info.chain);
                    if network == Network::Other {
                        warn!(
                            chain = %chain_info.chain,
                            "unrecognized chain identifier, classifying as other"
                        );
                    }
                    self.metrics.set_network_type(network);
                    *self.session_network.lock() = Some(network);
                    info!(
                        chain = %chain_info.chain,
                        blocks = chain_info.blocks,
                        "zcashd is ready"
                    );
                    return Some(network);
                }
                Err(RpcError::Connection(e)) => {
                    info!("zcashd has not been started yet ({e}), retrying");
                }
                Err(RpcError::WarmingUp(e)) => {
                    info!("zcashd is not fully started ({e}), retrying");
                }
                Err(e) => {
                    // Decode/value errors are retried like transient ones;
                    // a permanently broken node config shows up as an
                    // endless stream of these warnings.
                    warn!("readiness check failed ({e}), retrying");
                }
            }

            tokio::time::sleep(self.startup_poll_interval).await;
        }
    }
}
