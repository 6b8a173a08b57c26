//! JSON-RPC client for zcashd.
//!
//! `ZcashRpc` is the seam between the exporter and the node: one async
//! method per RPC, each returning a typed response or an [`RpcError`].
//! `HttpZcashRpc` is the production implementation, a thin wrapper over
//! `jsonrpsee`'s HTTP client with basic auth.

use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use hyper::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::rpc::error::RpcError;
use crate::rpc::types::{
    BlockchainInfo, DeprecationInfo, GetInfo, MemoryInfo, MempoolInfo, NetworkTotals,
};

/// Per-call timeout. The startup gate and refresh loop supply their own
/// cadence; this only bounds a single hung request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The zcashd RPCs the exporter consumes.
#[async_trait::async_trait]
pub trait ZcashRpc: Send + Sync + 'static {
    async fn get_info(&self) -> Result<GetInfo, RpcError>;
    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError>;
    async fn get_mempool_info(&self) -> Result<MempoolInfo, RpcError>;
    async fn get_network_totals(&self) -> Result<NetworkTotals, RpcError>;
    async fn get_memory_info(&self) -> Result<MemoryInfo, RpcError>;
    async fn get_deprecation_info(&self) -> Result<DeprecationInfo, RpcError>;
}

/// HTTP JSON-RPC implementation of [`ZcashRpc`].
pub struct HttpZcashRpc {
    client: HttpClient,
}

impl HttpZcashRpc {
    /// Build a client for the configured endpoint with basic auth from
    /// the configured credentials.
    pub fn new(config: &Config) -> Result<Self, RpcError> {
        let token = general_purpose::STANDARD
            .encode(format!("{}:{}", config.rpc_user, config.rpc_password));
        let auth = HeaderValue::from_str(&format!("Basic {token}"))
            .map_err(|e| RpcError::Connection(format!("invalid credentials: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = HttpClientBuilder::default()
            .set_headers(headers)
            .request_timeout(REQUEST_TIMEOUT)
            .build(config.rpc_url())
            .map_err(|e| RpcError::Connection(e.to_string()))?;

        Ok(Self { client })
    }

    /// Issue one parameterless call and decode the result.
    ///
    /// Decoding goes through `serde_json::Value` so that a transport or
    /// RPC-level failure and a shape mismatch classify separately.
    async fn call<T: DeserializeOwned>(&self, method: &str) -> Result<T, RpcError> {
        let raw: serde_json::Value = self
            .client
            .request(method, rpc_params![])
            .await
            .map_err(RpcError::classify)?;
        serde_json::from_value(raw).map_err(|e| RpcError::Decode(format!("{method}: {e}")))
    }
}

#[async_trait::async_trait]
impl ZcashRpc for HttpZcashRpc {
    async fn get_info(&self) -> Result<GetInfo, RpcError> {
        self.call("getinfo").await
    }

    async fn get_blockchain_info(&self) -> Result<BlockchainInfo, RpcError> {
        self.call("getblockchaininfo").await
    }

    async fn get_mempool_info(&self) -> Result<MempoolInfo, RpcError> {
        self.call("getmempoolinfo").await
    }

    async fn get_network_totals(&self) -> Result<NetworkTotals, RpcError> {
        self.call("getnetworktotals").await
    }

    async fn get_memory_info(&self) -> Result<MemoryInfo, RpcError> {
        self.call("getmemoryinfo").await
    }

    async fn get_deprecation_info(&self) -> Result<DeprecationInfo, RpcError> {
        self.call("getdeprecationinfo").await
    }
}
