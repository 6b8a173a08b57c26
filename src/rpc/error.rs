use jsonrpsee::core::ClientError;
use thiserror::Error;

/// zcashd reports this JSON-RPC error code while loading its block index
/// and verifying the chain, before it can serve queries.
pub const RPC_IN_WARMUP: i32 = -28;

/// Per-call RPC failure taxonomy.
///
/// `Connection` and `WarmingUp` are retried indefinitely by the startup
/// gate; everything is logged-and-skipped in steady state.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("node is warming up: {0}")]
    WarmingUp(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i32, message: String },

    #[error("decode error: {0}")]
    Decode(String),
}

impl RpcError {
    /// Classify a raw client error into the exporter's taxonomy.
    pub(crate) fn classify(err: ClientError) -> Self {
        match err {
            ClientError::Call(e) if e.code() == RPC_IN_WARMUP => {
                RpcError::WarmingUp(e.message().to_string())
            }
            ClientError::Call(e) => RpcError::Rpc {
                code: e.code(),
                message: e.message().to_string(),
            },
            ClientError::Transport(e) => RpcError::Connection(e.to_string()),
            ClientError::RequestTimeout => RpcError::Connection("request timed out".into()),
            ClientError::ParseError(e) => RpcError::Decode(e.to_string()),
            other => RpcError::Connection(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::types::ErrorObject;

    #[test]
    fn warmup_code_classifies_as_warming_up() {
        let err = ClientError::Call(ErrorObject::owned(
            RPC_IN_WARMUP,
            "Loading block index...",
            None::<()>,
        ));
        assert!(matches!(RpcError::classify(err), RpcError::WarmingUp(_)));
    }

    #[test]
    fn other_call_errors_keep_their_code() {
        let err = ClientError::Call(ErrorObject::owned(-32601, "Method not found", None::<()>));
        match RpcError::classify(err) {
            RpcError::Rpc { code, message } => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("expected rpc error, got {other:?}"),
        }
    }

    #[test]
    fn timeout_classifies_as_connection() {
        assert!(matches!(
            RpcError::classify(ClientError::RequestTimeout),
            RpcError::Connection(_)
        ));
    }
}
