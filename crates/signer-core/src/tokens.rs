//! Read-only token queries: mint details, holdings, and rent minimums.

use std::collections::HashMap;

use chain_sol::{
    decode_mint, decode_token_account, pubkey_to_address, MintState, SYSTEM_PROGRAM_ID,
    TOKEN_PROGRAM_ID,
};
use sol_rpc::{AccountInfo, SolanaRpc};
use tracing::debug;

use crate::error::WalletError;

/// One token account held by a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenHolding {
    /// Address of the token account itself.
    pub account: [u8; 32],
    pub mint: [u8; 32],
    /// Balance in base units.
    pub amount: u64,
    pub decimals: u8,
    pub frozen: bool,
}

/// Who controls an account, as far as token transfers are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountOwner {
    /// Wallet address. For a system account this is the account itself.
    pub owner: [u8; 32],
    /// Set when the account is a token account.
    pub mint: Option<[u8; 32]>,
}

pub struct TokenInspector<'a, R: SolanaRpc + ?Sized> {
    rpc: &'a R,
}

impl<'a, R: SolanaRpc + ?Sized> TokenInspector<'a, R> {
    pub fn new(rpc: &'a R) -> Self {
        Self { rpc }
    }

    /// Decoded mint account. Fails with [`WalletError::InvalidAccount`] when
    /// `mint` is missing or is not a Token program mint.
    pub async fn mint_info(&self, mint: &[u8; 32]) -> Result<MintState, WalletError> {
        let account = self.require_account(mint).await?;
        if account.owner != TOKEN_PROGRAM_ID {
            return Err(WalletError::InvalidAccount(format!(
                "{} is not owned by the token program",
                pubkey_to_address(mint)
            )));
        }
        let state = decode_mint(&account.data).map_err(|e| {
            WalletError::InvalidAccount(format!("{}: {e}", pubkey_to_address(mint)))
        })?;
        if !state.is_initialized {
            return Err(WalletError::InvalidAccount(format!(
                "mint {} is not initialized",
                pubkey_to_address(mint)
            )));
        }
        Ok(state)
    }

    /// The mint's decimals, checked against a caller-supplied value.
    ///
    /// A conflicting `expected` is an [`WalletError::InvalidAmount`]: scaling
    /// by the wrong decimals would move the wrong number of tokens.
    pub async fn resolve_decimals(
        &self,
        mint: &[u8; 32],
        expected: Option<u8>,
    ) -> Result<u8, WalletError> {
        let decimals = self.mint_info(mint).await?.decimals;
        match expected {
            Some(given) if given != decimals => Err(WalletError::InvalidAmount(format!(
                "mint {} has {decimals} decimals, not {given}",
                pubkey_to_address(mint)
            ))),
            _ => Ok(decimals),
        }
    }

    /// Every Token program account owned by `owner`, sorted by mint.
    pub async fn holdings(&self, owner: &[u8; 32]) -> Result<Vec<TokenHolding>, WalletError> {
        let accounts = self.rpc.get_token_accounts_by_owner(owner).await?;
        debug!(owner = %pubkey_to_address(owner), count = accounts.len(), "Fetched token accounts");

        let mut decimals_by_mint: HashMap<[u8; 32], u8> = HashMap::new();
        let mut holdings = Vec::with_capacity(accounts.len());
        for keyed in accounts {
            let state = decode_token_account(&keyed.account.data).map_err(|e| {
                WalletError::InvalidAccount(format!("{}: {e}", pubkey_to_address(&keyed.pubkey)))
            })?;

            let decimals = match decimals_by_mint.get(&state.mint).copied() {
                Some(d) => d,
                None => {
                    let d = self.mint_info(&state.mint).await?.decimals;
                    decimals_by_mint.insert(state.mint, d);
                    d
                }
            };

            holdings.push(TokenHolding {
                account: keyed.pubkey,
                mint: state.mint,
                amount: state.amount,
                decimals,
                frozen: state.is_frozen(),
            });
        }
        holdings.sort_by(|a, b| a.mint.cmp(&b.mint).then(a.account.cmp(&b.account)));
        Ok(holdings)
    }

    /// Resolve the wallet behind `address`.
    ///
    /// Token accounts resolve to their owner and mint. System accounts
    /// resolve to themselves.
    pub async fn account_owner(&self, address: &[u8; 32]) -> Result<AccountOwner, WalletError> {
        let account = self.require_account(address).await?;
        if account.owner == SYSTEM_PROGRAM_ID {
            return Ok(AccountOwner {
                owner: *address,
                mint: None,
            });
        }
        if account.owner != TOKEN_PROGRAM_ID {
            return Err(WalletError::InvalidAccount(format!(
                "{} is owned by {}, not a wallet or token account",
                pubkey_to_address(address),
                pubkey_to_address(&account.owner)
            )));
        }
        let state = decode_token_account(&account.data).map_err(|e| {
            WalletError::InvalidAccount(format!("{}: {e}", pubkey_to_address(address)))
        })?;
        Ok(AccountOwner {
            owner: state.owner,
            mint: Some(state.mint),
        })
    }

    /// Rent-exempt minimum for an existing account, based on its data size.
    pub async fn rent_exempt_minimum(&self, address: &[u8; 32]) -> Result<u64, WalletError> {
        let account = self.require_account(address).await?;
        let lamports = self
            .rpc
            .get_minimum_balance_for_rent_exemption(account.data.len())
            .await?;
        debug!(
            address = %pubkey_to_address(address),
            size = account.data.len(),
            lamports,
            "Fetched rent-exempt minimum"
        );
        Ok(lamports)
    }

    async fn require_account(&self, address: &[u8; 32]) -> Result<AccountInfo, WalletError> {
        self.rpc
            .get_account_info(address)
            .await
            .map_err(|e| {
                WalletError::AccountLookupFailed(format!("{}: {e}", pubkey_to_address(address)))
            })?
            .ok_or_else(|| {
                WalletError::InvalidAccount(format!(
                    "{} does not exist",
                    pubkey_to_address(address)
                ))
            })
    }
}
