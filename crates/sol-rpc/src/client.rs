//! JSON-RPC access to a Solana node.
//!
//! [`SolanaRpc`] is the seam the signer talks through; [`HttpRpcClient`] is the
//! production implementation over `reqwest`. Tests substitute in-memory fakes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use crate::config::RpcConfig;
use crate::error::RpcError;
use crate::types::{
    AccountInfo, Checkpoint, Commitment, KeyedAccount, SignatureInfo, TransactionRecord,
};

/// Network operations needed to build, submit and track transactions.
#[async_trait]
pub trait SolanaRpc: Send + Sync {
    /// Latest blockhash usable as a transaction checkpoint.
    async fn get_latest_blockhash(&self) -> Result<Checkpoint, RpcError>;

    /// `Ok(None)` when the account does not exist on chain.
    async fn get_account_info(&self, address: &[u8; 32]) -> Result<Option<AccountInfo>, RpcError>;

    /// Broadcast a wire-format signed transaction and return its signature.
    async fn send_transaction(&self, wire: &[u8]) -> Result<String, RpcError>;

    /// `Ok(None)` when the node has no record of the signature.
    async fn get_transaction(&self, signature: &str) -> Result<Option<TransactionRecord>, RpcError>;

    async fn get_balance(&self, address: &[u8; 32]) -> Result<u64, RpcError>;

    async fn request_airdrop(&self, address: &[u8; 32], lamports: u64) -> Result<String, RpcError>;

    /// Most recent signatures first.
    async fn get_signatures_for_address(
        &self,
        address: &[u8; 32],
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError>;

    /// Token program accounts owned by `owner`, raw data included.
    async fn get_token_accounts_by_owner(
        &self,
        owner: &[u8; 32],
    ) -> Result<Vec<KeyedAccount>, RpcError>;

    /// Lamports an account of `data_len` bytes must hold to be rent exempt.
    async fn get_minimum_balance_for_rent_exemption(&self, data_len: usize)
        -> Result<u64, RpcError>;
}

// ---------------------------------------------------------------------------
// Wire types (serialization only)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockhashValue {
    blockhash: String,
    last_valid_block_height: u64,
}

#[derive(Deserialize)]
struct RpcAccount {
    lamports: u64,
    owner: String,
    /// `[<base64 payload>, "base64"]`
    data: Vec<String>,
    executable: bool,
}

#[derive(Deserialize)]
struct RpcKeyedAccount {
    pubkey: String,
    account: RpcAccount,
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// [`SolanaRpc`] over HTTP JSON-RPC 2.0.
pub struct HttpRpcClient {
    client: Client,
    endpoint: Url,
    commitment: Commitment,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let endpoint = config.endpoint()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RpcError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            commitment: config.commitment,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = build_request(id, method, params);
        debug!(method, id, "rpc request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(method, %status, "rpc http failure");
            return Err(RpcError::Transport(format!("HTTP {status}: {text}")));
        }

        let body: Value =
            serde_json::from_str(&text).map_err(|e| RpcError::InvalidResponse(e.to_string()))?;

        parse_response(body)
    }

    /// `getTransaction` does not accept `processed`.
    fn read_commitment(&self) -> Commitment {
        match self.commitment {
            Commitment::Processed => Commitment::Confirmed,
            other => other,
        }
    }
}

#[async_trait]
impl SolanaRpc for HttpRpcClient {
    async fn get_latest_blockhash(&self) -> Result<Checkpoint, RpcError> {
        let result: WithContext<BlockhashValue> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment }]),
            )
            .await?;
        let blockhash = decode_pubkey(&result.value.blockhash)?;
        Ok(Checkpoint {
            blockhash,
            last_valid_block_height: result.value.last_valid_block_height,
        })
    }

    async fn get_account_info(&self, address: &[u8; 32]) -> Result<Option<AccountInfo>, RpcError> {
        let result: WithContext<Option<RpcAccount>> = self
            .call(
                "getAccountInfo",
                json!([
                    chain_sol::pubkey_to_address(address),
                    { "encoding": "base64", "commitment": self.commitment }
                ]),
            )
            .await?;
        result.value.map(account_from_wire).transpose()
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<String, RpcError> {
        self.call(
            "sendTransaction",
            json!([
                BASE64.encode(wire),
                {
                    "encoding": "base64",
                    "skipPreflight": false,
                    "preflightCommitment": self.commitment,
                }
            ]),
        )
        .await
    }

    async fn get_transaction(&self, signature: &str) -> Result<Option<TransactionRecord>, RpcError> {
        self.call(
            "getTransaction",
            json!([
                signature,
                {
                    "encoding": "json",
                    "commitment": self.read_commitment(),
                    "maxSupportedTransactionVersion": 0,
                }
            ]),
        )
        .await
    }

    async fn get_balance(&self, address: &[u8; 32]) -> Result<u64, RpcError> {
        let result: WithContext<u64> = self
            .call(
                "getBalance",
                json!([
                    chain_sol::pubkey_to_address(address),
                    { "commitment": self.commitment }
                ]),
            )
            .await?;
        Ok(result.value)
    }

    async fn request_airdrop(&self, address: &[u8; 32], lamports: u64) -> Result<String, RpcError> {
        self.call(
            "requestAirdrop",
            json!([
                chain_sol::pubkey_to_address(address),
                lamports,
                { "commitment": self.commitment }
            ]),
        )
        .await
    }

    async fn get_signatures_for_address(
        &self,
        address: &[u8; 32],
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        self.call(
            "getSignaturesForAddress",
            json!([
                chain_sol::pubkey_to_address(address),
                { "limit": limit, "commitment": self.read_commitment() }
            ]),
        )
        .await
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &[u8; 32],
    ) -> Result<Vec<KeyedAccount>, RpcError> {
        let result: WithContext<Vec<RpcKeyedAccount>> = self
            .call(
                "getTokenAccountsByOwner",
                json!([
                    chain_sol::pubkey_to_address(owner),
                    { "programId": chain_sol::pubkey_to_address(&chain_sol::TOKEN_PROGRAM_ID) },
                    { "encoding": "base64", "commitment": self.commitment }
                ]),
            )
            .await?;
        result.value.into_iter().map(keyed_account_from_wire).collect()
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, RpcError> {
        self.call(
            "getMinimumBalanceForRentExemption",
            json!([data_len, { "commitment": self.commitment }]),
        )
        .await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_request(id: u64, method: &str, params: Value) -> RpcRequest<'_> {
    RpcRequest {
        jsonrpc: "2.0",
        id,
        method,
        params,
    }
}

/// Extract `result` from a JSON-RPC response body, or the error it carries.
///
/// A `null` result deserializes into `None` for `Option` targets and is an
/// [`RpcError::InvalidResponse`] otherwise.
fn parse_response<T: DeserializeOwned>(mut body: Value) -> Result<T, RpcError> {
    if let Some(error) = body.get_mut("error").map(Value::take) {
        if !error.is_null() {
            let error: RpcErrorObject = serde_json::from_value(error)
                .map_err(|e| RpcError::InvalidResponse(format!("malformed error object: {e}")))?;
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
    }

    let result = body.get_mut("result").map(Value::take).unwrap_or(Value::Null);
    serde_json::from_value(result).map_err(|e| RpcError::InvalidResponse(e.to_string()))
}

fn decode_pubkey(encoded: &str) -> Result<[u8; 32], RpcError> {
    chain_sol::address_to_bytes(encoded).map_err(|e| RpcError::InvalidResponse(e.to_string()))
}

fn account_from_wire(account: RpcAccount) -> Result<AccountInfo, RpcError> {
    let payload = account
        .data
        .first()
        .ok_or_else(|| RpcError::InvalidResponse("account data missing".into()))?;
    let data = BASE64
        .decode(payload)
        .map_err(|e| RpcError::InvalidResponse(format!("account data: {e}")))?;

    Ok(AccountInfo {
        lamports: account.lamports,
        owner: decode_pubkey(&account.owner)?,
        data,
        executable: account.executable,
    })
}

fn keyed_account_from_wire(keyed: RpcKeyedAccount) -> Result<KeyedAccount, RpcError> {
    Ok(KeyedAccount {
        pubkey: decode_pubkey(&keyed.pubkey)?,
        account: account_from_wire(keyed.account)?,
    })
}
