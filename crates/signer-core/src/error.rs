use chain_sol::error::SolError;
use sol_rpc::RpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Keypair not found: {0}")]
    NotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Account lookup failed: {0}")]
    AccountLookupFailed(String),

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Malformed transaction blob: {0}")]
    MalformedBlob(String),

    #[error("Rejected by network: {0}")]
    RejectedByNetwork(String),

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Transaction build failed: {0}")]
    TransactionFailed(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<SolError> for WalletError {
    fn from(e: SolError) -> Self {
        match e {
            SolError::InvalidPrivateKey(msg) => WalletError::InvalidPrivateKey(msg),
            SolError::InvalidPublicKey(msg) | SolError::InvalidAddress(msg) => {
                WalletError::InvalidAddress(msg)
            }
            SolError::InvalidAmount(msg) => WalletError::InvalidAmount(msg),
            SolError::SigningError(msg) => WalletError::SigningFailed(msg),
            SolError::MalformedBlob(msg) => WalletError::MalformedBlob(msg),
            SolError::InvalidAccountData(msg) => WalletError::InvalidAccount(msg),
            other => WalletError::TransactionFailed(format!("SOL: {other}")),
        }
    }
}

/// Generic RPC mapping. Call sites with a more specific meaning (account
/// lookups) map the error themselves.
impl From<RpcError> for WalletError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Rpc { .. } => WalletError::RejectedByNetwork(e.to_string()),
            RpcError::Config(msg) => WalletError::Config(msg),
            RpcError::Transport(_) | RpcError::Timeout | RpcError::InvalidResponse(_) => {
                WalletError::NetworkUnavailable(e.to_string())
            }
        }
    }
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        WalletError::Io(e.to_string())
    }
}
