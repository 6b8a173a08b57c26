//! Typed zcashd RPC responses.
//!
//! Each struct mirrors the subset of the upstream response the exporter
//! maps onto instruments. A field missing from the node's reply is a
//! decode error and is routed through the per-call failure path, not
//! papered over with defaults.

use serde::Deserialize;

/// `getinfo` response subset.
#[derive(Debug, Clone, Deserialize)]
pub struct GetInfo {
    pub version: u64,
    pub protocolversion: u64,
    pub blocks: u64,
    pub connections: u64,
    pub difficulty: f64,
}

/// `getblockchaininfo` response subset.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockchainInfo {
    pub chain: String,
    pub blocks: u64,
    pub headers: u64,
    pub verificationprogress: f64,
    pub size_on_disk: u64,
}

/// `getmempoolinfo` response subset.
#[derive(Debug, Clone, Deserialize)]
pub struct MempoolInfo {
    /// Number of transactions in the mempool.
    pub size: u64,
    pub bytes: u64,
    pub usage: u64,
}

/// `getnetworktotals` response subset.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkTotals {
    pub totalbytesrecv: u64,
    pub totalbytessent: u64,
}

/// `getmemoryinfo` response subset.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryInfo {
    pub locked: LockedMemory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockedMemory {
    pub used: u64,
    pub total: u64,
}

/// `getdeprecationinfo` response subset.
#[derive(Debug, Clone, Deserialize)]
pub struct DeprecationInfo {
    pub version: u64,
    pub subversion: String,
    pub deprecationheight: u64,
}

/// Classified chain identifier, as reported by `getblockchaininfo`.
///
/// Unrecognized chain strings classify as `Other`, never as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
    Other,
}

impl Network {
    /// All enum-instrument state labels, in declaration order.
    pub const STATES: [&'static str; 4] = ["mainnet", "testnet", "regtest", "other"];

    pub fn from_chain(chain: &str) -> Self {
        match chain {
            "main" => Network::Mainnet,
            "test" => Network::Testnet,
            "regtest" => Network::Regtest,
            _ => Network::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
            Network::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_getinfo_subset() {
        let info: GetInfo = serde_json::from_value(json!({
            "version": 4020050,
            "protocolversion": 170013,
            "blocks": 1_500_000,
            "connections": 8,
            "difficulty": 35732491.45,
            "testnet": false,
            "errors": ""
        }))
        .unwrap();
        assert_eq!(info.version, 4020050);
        assert_eq!(info.protocolversion, 170013);
    }

    #[test]
    fn missing_required_field_fails_decode() {
        let res: Result<BlockchainInfo, _> = serde_json::from_value(json!({
            "chain": "main",
            "blocks": 10
        }));
        assert!(res.is_err());
    }

    #[test]
    fn chain_identifiers_classify() {
        assert_eq!(Network::from_chain("main"), Network::Mainnet);
        assert_eq!(Network::from_chain("test"), Network::Testnet);
        assert_eq!(Network::from_chain("regtest"), Network::Regtest);
        assert_eq!(Network::from_chain("foo"), Network::Other);
        assert_eq!(Network::from_chain(""), Network::Other);
    }
}
