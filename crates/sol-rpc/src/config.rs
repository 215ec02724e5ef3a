use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::RpcError;
use crate::types::Commitment;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Public Solana clusters with well-known RPC endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    MainnetBeta,
    #[default]
    Devnet,
    Testnet,
    Localnet,
}

impl Cluster {
    pub fn url(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }

    /// Whether `requestAirdrop` is available.
    pub fn supports_airdrop(&self) -> bool {
        !matches!(self, Cluster::MainnetBeta)
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::Localnet => "localnet",
        })
    }
}

impl FromStr for Cluster {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Cluster::MainnetBeta),
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            other => Err(RpcError::Config(format!("unknown cluster: {other}"))),
        }
    }
}

/// Connection settings for one RPC endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    /// Sent as the `api-key` query parameter when present.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub commitment: Commitment,
}

impl RpcConfig {
    /// Configuration for a custom endpoint. Fails if the URL is not http(s).
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        let url = url.into();
        if !validate_url(&url) {
            return Err(RpcError::Config(format!("invalid RPC URL: {url}")));
        }
        Ok(Self {
            url,
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            commitment: Commitment::default(),
        })
    }

    pub fn for_cluster(cluster: Cluster) -> Self {
        Self {
            url: cluster.url().to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            commitment: Commitment::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_commitment(mut self, commitment: Commitment) -> Self {
        self.commitment = commitment;
        self
    }

    /// The URL requests are posted to, including the API key if any.
    pub fn endpoint(&self) -> Result<Url, RpcError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| RpcError::Config(format!("invalid RPC URL {}: {e}", self.url)))?;
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("api-key", key);
        }
        Ok(url)
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::for_cluster(Cluster::default())
    }
}

impl fmt::Debug for RpcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("commitment", &self.commitment)
            .finish()
    }
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}
