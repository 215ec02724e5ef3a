use thiserror::Error;

/// Errors talking to a Solana JSON-RPC endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The request never produced a response (DNS, TCP, TLS, HTTP status).
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid rpc configuration: {0}")]
    Config(String),
}

impl RpcError {
    /// Whether the failure happened before the node could judge the request.
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport(_) | RpcError::Timeout)
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RpcError::Timeout
        } else if e.is_decode() {
            RpcError::InvalidResponse(e.to_string())
        } else {
            RpcError::Transport(e.to_string())
        }
    }
}
