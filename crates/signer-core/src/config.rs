//! Environment-driven configuration.
//!
//! | Variable | Default |
//! |---|---|
//! | `SOLANA_RPC_URL` | endpoint of `SOLANA_CLUSTER` |
//! | `SOLANA_CLUSTER` | `devnet` |
//! | `SOLANA_API_KEY` | none |
//! | `SOLANA_PRIVATE_KEY` | none (Base58 or JSON byte array) |
//! | `SOLANA_KEYPAIR_DIR` | `.` |
//! | `SOLANA_RPC_TIMEOUT_SECS` | `30` |
//! | `SOLANA_COMMITMENT` | `confirmed` |

use std::fmt;
use std::path::PathBuf;

use chain_sol::Keypair;
use sol_rpc::{Cluster, Commitment, HttpRpcClient, RpcConfig};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::WalletError;
use crate::keystore::KeypairStore;

pub const ENV_RPC_URL: &str = "SOLANA_RPC_URL";
pub const ENV_CLUSTER: &str = "SOLANA_CLUSTER";
pub const ENV_API_KEY: &str = "SOLANA_API_KEY";
pub const ENV_PRIVATE_KEY: &str = "SOLANA_PRIVATE_KEY";
pub const ENV_KEYPAIR_DIR: &str = "SOLANA_KEYPAIR_DIR";
pub const ENV_RPC_TIMEOUT_SECS: &str = "SOLANA_RPC_TIMEOUT_SECS";
pub const ENV_COMMITMENT: &str = "SOLANA_COMMITMENT";

#[derive(Clone)]
pub struct WalletConfig {
    pub rpc: RpcConfig,
    /// Set when the endpoint came from a named cluster rather than a URL.
    pub cluster: Option<Cluster>,
    pub keypair_dir: PathBuf,
    private_key: Option<Zeroizing<String>>,
}

impl WalletConfig {
    pub fn from_env() -> Result<Self, WalletError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WalletError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let (mut rpc, cluster) = match get(ENV_RPC_URL) {
            Some(url) => (RpcConfig::new(url)?, None),
            None => {
                let cluster = match get(ENV_CLUSTER) {
                    Some(name) => name.parse::<Cluster>()?,
                    None => Cluster::default(),
                };
                (RpcConfig::for_cluster(cluster), Some(cluster))
            }
        };

        rpc = rpc.with_api_key(get(ENV_API_KEY));

        if let Some(raw) = get(ENV_RPC_TIMEOUT_SECS) {
            let secs: u64 = raw.parse().map_err(|_| {
                WalletError::Config(format!("{ENV_RPC_TIMEOUT_SECS} must be a whole number: {raw}"))
            })?;
            if secs == 0 {
                return Err(WalletError::Config(format!(
                    "{ENV_RPC_TIMEOUT_SECS} must be greater than zero"
                )));
            }
            rpc = rpc.with_timeout_secs(secs);
        }

        if let Some(raw) = get(ENV_COMMITMENT) {
            rpc = rpc.with_commitment(raw.parse::<Commitment>()?);
        }

        let keypair_dir = get(ENV_KEYPAIR_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let config = Self {
            rpc,
            cluster,
            keypair_dir,
            private_key: lookup(ENV_PRIVATE_KEY)
                .map(Zeroizing::new)
                .filter(|k| !k.trim().is_empty()),
        };
        debug!(?config, "Loaded configuration");
        Ok(config)
    }

    pub fn keypair_store(&self) -> KeypairStore {
        KeypairStore::new(&self.keypair_dir)
    }

    pub fn rpc_client(&self) -> Result<HttpRpcClient, WalletError> {
        Ok(HttpRpcClient::new(&self.rpc)?)
    }

    /// Whether a private key was supplied through the environment.
    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// Keypair from the configured private key, if any.
    pub fn env_keypair(&self) -> Result<Option<Keypair>, WalletError> {
        let Some(raw) = &self.private_key else {
            return Ok(None);
        };
        let raw = raw.trim();
        let keypair = if raw.starts_with('[') {
            Keypair::from_json_bytes(raw)?
        } else {
            Keypair::from_base58_string(raw)?
        };
        Ok(Some(keypair))
    }
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("rpc", &self.rpc)
            .field("cluster", &self.cluster)
            .field("keypair_dir", &self.keypair_dir)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
