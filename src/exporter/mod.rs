//! Exporter core: startup gate + steady-state refresh loop.
//!
//! One `Exporter` per process. It owns the instrument registry and the
//! cached session network identity, and drives the process-level state
//! machine: wait for the node to come up, publish readiness, then poll
//! forever. The metrics HTTP listener is a separate concern that only
//! reads instrument values.

pub mod cli;
mod gate;
mod refresh;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::config::Config;
use crate::metrics::ExporterMetrics;
use crate::rpc::types::Network;
use crate::rpc::ZcashRpc;

/// Drives the polling/export state machine against one RPC endpoint.
pub struct Exporter<R: ZcashRpc> {
    rpc: Arc<R>,
    metrics: Arc<ExporterMetrics>,
    startup_poll_interval: Duration,
    poll_interval: Duration,
    /// Chain reported at startup, kept only to warn on drift later.
    session_network: Mutex<Option<Network>>,
}

impl<R: ZcashRpc> Exporter<R> {
    pub fn new(rpc: Arc<R>, metrics: Arc<ExporterMetrics>, config: &Config) -> Self {
        Self {
            rpc,
            metrics,
            startup_poll_interval: config.startup_poll_interval,
            poll_interval: config.poll_interval,
            session_network: Mutex::new(None),
        }
    }

    pub fn metrics(&self) -> Arc<ExporterMetrics> {
        self.metrics.clone()
    }

    /// Run the full state machine: startup gate, then the refresh loop.
    ///
    /// Returns only when `shutdown` flips to true.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) {
        if self.wait_for_node(&shutdown).await.is_none() {
            return;
        }
        self.run_refresh_loop(shutdown).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::types::{
        BlockchainInfo, DeprecationInfo, GetInfo, MemoryInfo, MempoolInfo, NetworkTotals,
    };
    use crate::rpc::RpcError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config(startup_ms: u64, poll_ms: u64) -> Config {
        Config {
            rpc_user: "user".into(),
            rpc_password: "pass".into(),
            rpc_host: "127.0.0.1".into(),
            rpc_port: 8232,
            listen_port: 9100,
            startup_poll_interval: Duration::from_millis(startup_ms),
            poll_interval: Duration::from_millis(poll_ms),
        }
    }

    fn blockchain_info(chain: &str) -> BlockchainInfo {
        BlockchainInfo {
            chain: chain.into(),
            blocks: 1_000_000,
            headers: 1_000_100,
            verificationprogress: 0.99999,
            size_on_disk: 30_000_000_000,
        }
    }

    fn get_info(version: u64, protocolversion: u64) -> GetInfo {
        GetInfo {
            version,
            protocolversion,
            blocks: 1_000_000,
            connections: 8,
            difficulty: 12345.6,
        }
    }

    fn conn_refused() -> RpcError {
        RpcError::Connection("connection refused".into())
    }

    /// Mock RPC endpoint: per-method response queues plus optional
    /// repeating defaults. An empty queue with no default behaves like a
    /// connection failure.
    #[derive(Default)]
    struct MockRpc {
        info: Mutex<VecDeque<Result<GetInfo, RpcError>>>,
        blockchain: Mutex<VecDeque<Result<BlockchainInfo, RpcError>>>,
        mempool: Mutex<VecDeque<Result<MempoolInfo, RpcError>>>,
        default_blockchain: Option<BlockchainInfo>,
        blockchain_calls: AtomicUsize,
    }

    impl MockRpc {
        fn next<T: Clone>(
            queue: &Mutex<VecDeque<Result<T, RpcError>>>,
            default: &Option<T>,
        ) -> Result<T, RpcError> {
            if let Some(res) = queue.lock().pop_front() {
                return res;
            }
            match default {
                Some(v) => Ok(v.clone()),
                None => Err(conn_refused()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ZcashRpc for MockRpc {
        async fn get_info(&self) -> Result<GetInfo, RpcError> {
            Self::next(&self.info, &None)
        }
        async fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError> {
            self.blockchain_calls.fetch_add(1, Ordering::SeqCst);
            Self::next(&self.blockchain, &self.default_blockchain)
        }
        async fn get_mempool_info(&self) -> Result<MempoolInfo, RpcError> {
            Self::next(&self.mempool, &None)
        }
        async fn get_network_totals(&self) -> Result<NetworkTotals, RpcError> {
            Err(conn_refused())
        }
        async fn get_memory_info(&self) -> Result<MemoryInfo, RpcError> {
            Err(conn_refused())
        }
        async fn get_deprecation_info(&self) -> Result<DeprecationInfo, RpcError> {
            Err(conn_refused())
        }
    }

    fn exporter_with(rpc: MockRpc, config: &Config) -> Exporter<MockRpc> {
        let metrics = Arc::new(ExporterMetrics::new().unwrap());
        Exporter::new(Arc::new(rpc), metrics, config)
    }

    #[tokio::test]
    async fn gate_exits_after_one_attempt_on_mainnet() {
        let rpc = MockRpc::default();
        rpc.blockchain.lock().push_back(Ok(blockchain_info("main")));
        let exporter = exporter_with(rpc, &test_config(5, 5));
        let (_tx, rx) = watch::channel(false);

        let network = exporter.wait_for_node(&rx).await;
        assert_eq!(network, Some(Network::Mainnet));
        assert_eq!(exporter.rpc.blockchain_calls.load(Ordering::SeqCst), 1);
        assert!(exporter
            .metrics
            .gather_text()
            .contains("zcash_network_type{state=\"mainnet\"} 1"));
    }

    #[tokio::test]
    async fn gate_retries_through_connection_failures() {
        let rpc = MockRpc::default();
        {
            let mut q = rpc.blockchain.lock();
            q.push_back(Err(conn_refused()));
            q.push_back(Err(conn_refused()));
            q.push_back(Ok(blockchain_info("test")));
        }
        let exporter = exporter_with(rpc, &test_config(5, 5));
        let (_tx, rx) = watch::channel(false);

        let network = exporter.wait_for_node(&rx).await;
        assert_eq!(network, Some(Network::Testnet));
        assert_eq!(exporter.rpc.blockchain_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gate_retries_through_warmup() {
        let rpc = MockRpc::default();
        {
            let mut q = rpc.blockchain.lock();
            q.push_back(Err(RpcError::WarmingUp("Loading block index...".into())));
            q.push_back(Ok(blockchain_info("regtest")));
        }
        let exporter = exporter_with(rpc, &test_config(5, 5));
        let (_tx, rx) = watch::channel(false);

        assert_eq!(exporter.wait_for_node(&rx).await, Some(Network::Regtest));
    }

    #[tokio::test]
    async fn gate_publishes_nothing_until_success() {
        // All attempts fail; the gate must keep retrying without ever
        // touching the readiness instrument.
        let exporter = Arc::new(exporter_with(MockRpc::default(), &test_config(5, 5)));
        let (tx, rx) = watch::channel(false);

        let gate = {
            let exporter = exporter.clone();
            tokio::spawn(async move { exporter.wait_for_node(&rx).await })
        };
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(exporter.rpc.blockchain_calls.load(Ordering::SeqCst) >= 3);
        assert!(!exporter.metrics.network_type_published());

        tx.send(true).unwrap();
        assert_eq!(gate.await.unwrap(), None);
    }

    #[tokio::test]
    async fn unrecognized_chain_classifies_as_other_and_exits_gate() {
        let rpc = MockRpc::default();
        rpc.blockchain.lock().push_back(Ok(blockchain_info("foo")));
        let exporter = exporter_with(rpc, &test_config(5, 5));
        let (_tx, rx) = watch::channel(false);

        let network = exporter.wait_for_node(&rx).await;
        assert_eq!(network, Some(Network::Other));
        assert_eq!(exporter.rpc.blockchain_calls.load(Ordering::SeqCst), 1);
        assert!(exporter
            .metrics
            .gather_text()
            .contains("zcash_network_type{state=\"other\"} 1"));
    }

    #[tokio::test]
    async fn partial_fetch_cycle_updates_only_succeeding_calls() {
        let rpc = MockRpc::default();
        {
            // cycle 1: both calls succeed
            rpc.info.lock().push_back(Ok(get_info(4020050, 170013)));
            rpc.mempool.lock().push_back(Ok(MempoolInfo {
                size: 42,
                bytes: 9000,
                usage: 12000,
            }));
            // cycle 2: getinfo succeeds with new values, getmempoolinfo fails
            rpc.info.lock().push_back(Ok(get_info(4020051, 170014)));
            rpc.mempool
                .lock()
                .push_back(Err(RpcError::Rpc { code: -32603, message: "boom".into() }));
        }
        let exporter = exporter_with(rpc, &test_config(5, 5));

        exporter.fetch_cycle().await;
        assert_eq!(exporter.metrics.version.get(), 4020050);
        assert_eq!(exporter.metrics.mempool_size.get(), 42);

        exporter.fetch_cycle().await;
        // succeeding call updated
        assert_eq!(exporter.metrics.version.get(), 4020051);
        assert_eq!(exporter.metrics.protocol_version.get(), 170014);
        // failing call's instruments retain their prior values
        assert_eq!(exporter.metrics.mempool_size.get(), 42);
        assert_eq!(exporter.metrics.mempool_bytes.get(), 9000);
    }

    #[tokio::test]
    async fn fetch_failure_leaves_unset_instruments_at_initial_values() {
        let rpc = MockRpc::default();
        rpc.info.lock().push_back(Ok(get_info(4020050, 170013)));
        let exporter = exporter_with(rpc, &test_config(5, 5));

        exporter.fetch_cycle().await;
        assert_eq!(exporter.metrics.version.get(), 4020050);
        assert_eq!(exporter.metrics.protocol_version.get(), 170013);
        assert_eq!(exporter.metrics.mempool_size.get(), 0);
    }

    #[tokio::test]
    async fn blockchain_fetch_updates_sync_state_and_network() {
        let rpc = MockRpc {
            default_blockchain: Some(blockchain_info("main")),
            ..Default::default()
        };
        let exporter = exporter_with(rpc, &test_config(5, 5));
        *exporter.session_network.lock() = Some(Network::Mainnet);

        exporter.fetch_cycle().await;
        let text = exporter.metrics.gather_text();
        assert_eq!(exporter.metrics.chain_blocks.get(), 1_000_000);
        assert!(text.contains("zcash_synced{state=\"synced\"} 1"));
        assert!(text.contains("zcash_network_type{state=\"mainnet\"} 1"));
    }

    #[tokio::test]
    async fn refresh_loop_keeps_cycling_past_failures() {
        // Every RPC fails every cycle; the loop must keep running at its
        // cadence until shutdown.
        let exporter = Arc::new(exporter_with(MockRpc::default(), &test_config(5, 10)));
        let (tx, rx) = watch::channel(false);

        let handle = {
            let exporter = exporter.clone();
            tokio::spawn(async move { exporter.run_refresh_loop(rx).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert!(exporter.rpc.blockchain_calls.load(Ordering::SeqCst) >= 5);
    }

    #[tokio::test]
    async fn run_drives_gate_then_loop() {
        let rpc = MockRpc {
            default_blockchain: Some(blockchain_info("main")),
            ..Default::default()
        };
        rpc.blockchain.lock().push_back(Err(conn_refused()));
        let exporter = Arc::new(exporter_with(rpc, &test_config(5, 5)));
        let (tx, rx) = watch::channel(false);

        let handle = {
            let exporter = exporter.clone();
            tokio::spawn(async move { exporter.run(rx).await })
        };
        tokio::time::sleep(Duration::from_millis(80)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        // one failed gate attempt, one successful one, then loop cycles
        assert!(exporter.rpc.blockchain_calls.load(Ordering::SeqCst) >= 3);
        assert_eq!(*exporter.session_network.lock(), Some(Network::Mainnet));
    }
}
