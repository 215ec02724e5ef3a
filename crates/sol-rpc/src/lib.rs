//! Solana JSON-RPC client used by the offline signer for the few steps that
//! need the network: fetching a blockhash checkpoint, looking up recipient
//! and token accounts, and submitting signed transactions.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::{HttpRpcClient, SolanaRpc};
pub use config::{validate_url, Cluster, RpcConfig};
pub use error::RpcError;
pub use types::{
    AccountInfo, Checkpoint, Commitment, KeyedAccount, SignatureInfo, TransactionMeta,
    TransactionRecord,
};
