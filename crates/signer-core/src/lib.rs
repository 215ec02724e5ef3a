//! Keypair storage, transaction building, signing and submission for Solana.
//!
//! The pipeline is split into independent stages so each can run on its own
//! (and on a different machine):
//!
//! 1. [`KeypairStore`] persists keypairs as `<address>.json`.
//! 2. [`TransferBuilder`] produces unsigned transactions from a checkpoint.
//! 3. [`offline::sign`] and [`offline::partial_sign`] attach signatures.
//! 4. [`offline::encode`] / [`offline::decode`] move transactions as hex blobs.
//! 5. [`Submitter`] broadcasts a blob and reports its transaction id.
//!
//! [`TokenInspector`] answers the read-only token questions around those
//! stages: a mint's decimals, a wallet's holdings, rent minimums.
//!
//! Network access goes through a [`sol_rpc::SolanaRpc`] handle passed in by
//! the caller.

pub mod builder;
pub mod config;
pub mod error;
pub mod keystore;
pub mod logging;
pub mod offline;
pub mod submit;
pub mod tokens;
pub mod types;

pub use builder::TransferBuilder;
pub use config::WalletConfig;
pub use error::WalletError;
pub use keystore::KeypairStore;
pub use submit::Submitter;
pub use tokens::{AccountOwner, TokenHolding, TokenInspector};
pub use types::{HistoryEntry, TransactionId};

pub use chain_sol::{Keypair, SignedTransaction, SolTransaction, UnsignedTransaction};
pub use sol_rpc::{Checkpoint, SolanaRpc};
