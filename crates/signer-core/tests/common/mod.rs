//! In-memory `SolanaRpc` that behaves like a tiny cluster: it tracks which
//! blockhashes are still valid, which accounts exist, and what was submitted.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chain_sol::{
    SignedTransaction, MINT_LEN, SYSTEM_PROGRAM_ID, TOKEN_ACCOUNT_LEN, TOKEN_PROGRAM_ID,
};
use sol_rpc::{
    AccountInfo, Checkpoint, KeyedAccount, RpcError, SignatureInfo, SolanaRpc, TransactionMeta,
    TransactionRecord,
};

const SIGNATURE_FEE: u64 = 5_000;
const BLOCKHASH_LIFETIME: u64 = 150;

/// Default rent parameters: 3480 lamports per byte-year, two years, plus the
/// 128-byte account overhead.
pub fn rent_exempt_minimum(data_len: usize) -> u64 {
    (128 + data_len as u64) * 3_480 * 2
}

struct State {
    checkpoint: Checkpoint,
    valid_blockhashes: HashSet<[u8; 32]>,
    accounts: HashMap<[u8; 32], AccountInfo>,
    balances: HashMap<[u8; 32], u64>,
    transactions: HashMap<String, TransactionRecord>,
    history: HashMap<[u8; 32], Vec<String>>,
    sent: Vec<Vec<u8>>,
    lookups: usize,
    slot: u64,
    fail_lookups: bool,
    offline: bool,
}

pub struct FakeRpc {
    state: Mutex<State>,
}

impl FakeRpc {
    pub fn new() -> Self {
        let blockhash = [1u8; 32];
        Self {
            state: Mutex::new(State {
                checkpoint: Checkpoint {
                    blockhash,
                    last_valid_block_height: BLOCKHASH_LIFETIME,
                },
                valid_blockhashes: HashSet::from([blockhash]),
                accounts: HashMap::new(),
                balances: HashMap::new(),
                transactions: HashMap::new(),
                history: HashMap::new(),
                sent: Vec::new(),
                lookups: 0,
                slot: 1,
                fail_lookups: false,
                offline: false,
            }),
        }
    }

    /// Move to a new blockhash and expire every earlier one.
    pub fn expire_blockhashes(&self) {
        let mut state = self.state.lock().unwrap();
        let next = state.checkpoint.blockhash[0].wrapping_add(1);
        let height = state.checkpoint.last_valid_block_height + BLOCKHASH_LIFETIME;
        state.checkpoint = Checkpoint {
            blockhash: [next; 32],
            last_valid_block_height: height,
        };
        state.valid_blockhashes = HashSet::from([[next; 32]]);
    }

    /// An existing but otherwise empty token account.
    pub fn add_account(&self, address: [u8; 32]) {
        self.insert_account(address, TOKEN_PROGRAM_ID, vec![0u8; TOKEN_ACCOUNT_LEN]);
    }

    /// An initialized mint with no authorities.
    pub fn add_mint(&self, mint: [u8; 32], decimals: u8, supply: u64) {
        let mut data = vec![0u8; MINT_LEN];
        data[36..44].copy_from_slice(&supply.to_le_bytes());
        data[44] = decimals;
        data[45] = 1;
        self.insert_account(mint, TOKEN_PROGRAM_ID, data);
    }

    /// An initialized token account at `address`.
    pub fn add_token_account(
        &self,
        address: [u8; 32],
        mint: [u8; 32],
        owner: [u8; 32],
        amount: u64,
    ) {
        let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
        data[0..32].copy_from_slice(&mint);
        data[32..64].copy_from_slice(&owner);
        data[64..72].copy_from_slice(&amount.to_le_bytes());
        data[108] = 1;
        self.insert_account(address, TOKEN_PROGRAM_ID, data);
    }

    /// An account owned by an arbitrary program.
    pub fn insert_account(&self, address: [u8; 32], owner: [u8; 32], data: Vec<u8>) {
        let lamports = rent_exempt_minimum(data.len());
        self.state.lock().unwrap().accounts.insert(
            address,
            AccountInfo {
                lamports,
                owner,
                data,
                executable: false,
            },
        );
    }

    pub fn fail_lookups(&self) {
        self.state.lock().unwrap().fail_lookups = true;
    }

    pub fn go_offline(&self) {
        self.state.lock().unwrap().offline = true;
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn lookups(&self) -> usize {
        self.state.lock().unwrap().lookups
    }

    fn ensure_online(state: &State) -> Result<(), RpcError> {
        if state.offline {
            return Err(RpcError::Transport("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SolanaRpc for FakeRpc {
    async fn get_latest_blockhash(&self) -> Result<Checkpoint, RpcError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state)?;
        Ok(state.checkpoint)
    }

    async fn get_account_info(&self, address: &[u8; 32]) -> Result<Option<AccountInfo>, RpcError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_online(&state)?;
        state.lookups += 1;
        if state.fail_lookups {
            return Err(RpcError::Timeout);
        }
        Ok(state.accounts.get(address).cloned())
    }

    async fn send_transaction(&self, wire: &[u8]) -> Result<String, RpcError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_online(&state)?;

        let tx = SignedTransaction::from_wire_bytes(wire).map_err(|e| RpcError::Rpc {
            code: -32602,
            message: format!("failed to deserialize transaction: {e}"),
        })?;
        if !state.valid_blockhashes.contains(&tx.message.recent_blockhash) {
            return Err(RpcError::Rpc {
                code: -32002,
                message: "Transaction simulation failed: Blockhash not found".into(),
            });
        }
        if !tx.is_fully_signed() || tx.verify_signatures().is_err() {
            return Err(RpcError::Rpc {
                code: -32003,
                message: "Transaction signature verification failure".into(),
            });
        }
        let id = tx.id().ok_or_else(|| RpcError::InvalidResponse("unsigned".into()))?;
        if state.transactions.contains_key(&id) {
            return Err(RpcError::Rpc {
                code: -32002,
                message: "Transaction simulation failed: This transaction has already been processed".into(),
            });
        }

        state.slot += 1;
        let record = TransactionRecord {
            slot: state.slot,
            block_time: Some(1_700_000_000 + state.slot as i64),
            meta: Some(TransactionMeta {
                fee: SIGNATURE_FEE * tx.signatures.len() as u64,
                err: None,
                log_messages: None,
            }),
            transaction: serde_json::Value::Null,
        };
        state.transactions.insert(id.clone(), record);
        for key in &tx.message.account_keys {
            state.history.entry(*key).or_default().push(id.clone());
        }
        state.sent.push(wire.to_vec());
        Ok(id)
    }

    async fn get_transaction(&self, signature: &str) -> Result<Option<TransactionRecord>, RpcError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state)?;
        Ok(state.transactions.get(signature).cloned())
    }

    async fn get_balance(&self, address: &[u8; 32]) -> Result<u64, RpcError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state)?;
        Ok(state.balances.get(address).copied().unwrap_or(0))
    }

    async fn request_airdrop(&self, address: &[u8; 32], lamports: u64) -> Result<String, RpcError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_online(&state)?;
        *state.balances.entry(*address).or_default() += lamports;
        state.accounts.entry(*address).or_insert_with(|| AccountInfo {
            lamports,
            owner: SYSTEM_PROGRAM_ID,
            data: Vec::new(),
            executable: false,
        });
        Ok(format!("airdrop-{}", chain_sol::pubkey_to_address(address)))
    }

    async fn get_signatures_for_address(
        &self,
        address: &[u8; 32],
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state)?;
        let ids = state.history.get(address).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .rev()
            .take(limit)
            .map(|id| {
                let record = &state.transactions[id];
                SignatureInfo {
                    signature: id.clone(),
                    slot: record.slot,
                    err: None,
                    memo: None,
                    block_time: record.block_time,
                    confirmation_status: Some("confirmed".into()),
                }
            })
            .collect())
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &[u8; 32],
    ) -> Result<Vec<KeyedAccount>, RpcError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state)?;
        Ok(state
            .accounts
            .iter()
            .filter(|(_, a)| {
                a.owner == TOKEN_PROGRAM_ID
                    && a.data.len() == TOKEN_ACCOUNT_LEN
                    && a.data[32..64] == owner[..]
            })
            .map(|(pubkey, account)| KeyedAccount {
                pubkey: *pubkey,
                account: account.clone(),
            })
            .collect())
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, RpcError> {
        let state = self.state.lock().unwrap();
        Self::ensure_online(&state)?;
        Ok(rent_exempt_minimum(data_len))
    }
}
