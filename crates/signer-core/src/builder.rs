//! Unsigned transaction construction.
//!
//! Native transfers are built fully offline. Token transfers and mints need
//! one network read to learn whether the destination token account exists.

use chain_sol::{
    build_mint_to_instructions, build_sol_transfer, build_token_transfer_instructions,
    compile_transaction, derive_associated_token_address, pubkey_to_address, SolTransaction,
};
use sol_rpc::{Checkpoint, SolanaRpc};
use tracing::{debug, info};

use crate::error::WalletError;

/// Builds unsigned transactions against a caller-supplied RPC handle.
pub struct TransferBuilder<'a, R: SolanaRpc + ?Sized> {
    rpc: &'a R,
}

impl<'a, R: SolanaRpc + ?Sized> TransferBuilder<'a, R> {
    pub fn new(rpc: &'a R) -> Self {
        Self { rpc }
    }

    /// Fetch a fresh blockhash. Call immediately before building so the
    /// transaction is submitted well inside its validity window.
    pub async fn latest_checkpoint(&self) -> Result<Checkpoint, WalletError> {
        let checkpoint = self.rpc.get_latest_blockhash().await?;
        debug!(
            blockhash = %checkpoint.blockhash_base58(),
            last_valid_block_height = checkpoint.last_valid_block_height,
            "Fetched checkpoint"
        );
        Ok(checkpoint)
    }

    /// A single System Program transfer, paid by `from`. No network access.
    pub fn build_native_transfer(
        &self,
        from: &[u8; 32],
        to: &[u8; 32],
        lamports: u64,
        checkpoint: &Checkpoint,
    ) -> Result<SolTransaction, WalletError> {
        let tx = build_sol_transfer(from, to, lamports, &checkpoint.blockhash)?;
        info!(
            from = %pubkey_to_address(from),
            to = %pubkey_to_address(to),
            lamports,
            "Built native transfer"
        );
        Ok(tx)
    }

    /// SPL transfer between the associated token accounts of `from` and `to`.
    ///
    /// If the recipient's token account does not exist yet, a creation
    /// instruction paid by `from` is placed before the transfer.
    pub async fn build_token_transfer(
        &self,
        from: &[u8; 32],
        to: &[u8; 32],
        mint: &[u8; 32],
        amount: u64,
        checkpoint: &Checkpoint,
    ) -> Result<SolTransaction, WalletError> {
        ensure_positive(amount)?;

        let recipient_ata = derive_associated_token_address(to, mint)?;
        let recipient_exists = self.account_exists(&recipient_ata).await?;

        let instructions =
            build_token_transfer_instructions(from, to, mint, amount, recipient_exists)?;
        let tx = compile_transaction(&instructions, from, &checkpoint.blockhash)?;

        info!(
            from = %pubkey_to_address(from),
            to = %pubkey_to_address(to),
            mint = %pubkey_to_address(mint),
            amount,
            create_recipient_account = !recipient_exists,
            "Built token transfer"
        );
        Ok(tx)
    }

    /// SPL `MintTo` into `owner`'s associated token account.
    ///
    /// `payer` pays fees and, if needed, the token account creation.
    /// When `mint_authority` differs from `payer` the transaction needs both
    /// signatures.
    pub async fn build_mint_to(
        &self,
        payer: &[u8; 32],
        mint_authority: &[u8; 32],
        mint: &[u8; 32],
        owner: &[u8; 32],
        amount: u64,
        checkpoint: &Checkpoint,
    ) -> Result<SolTransaction, WalletError> {
        ensure_positive(amount)?;

        let destination = derive_associated_token_address(owner, mint)?;
        let destination_exists = self.account_exists(&destination).await?;

        let instructions = build_mint_to_instructions(
            payer,
            mint_authority,
            mint,
            owner,
            amount,
            destination_exists,
        )?;
        let tx = compile_transaction(&instructions, payer, &checkpoint.blockhash)?;

        info!(
            mint = %pubkey_to_address(mint),
            owner = %pubkey_to_address(owner),
            amount,
            create_destination_account = !destination_exists,
            signers = tx.num_required_signatures,
            "Built mint-to"
        );
        Ok(tx)
    }

    /// Whether `address` exists on chain. Any RPC failure is reported as
    /// [`WalletError::AccountLookupFailed`].
    pub async fn account_exists(&self, address: &[u8; 32]) -> Result<bool, WalletError> {
        let account = self.rpc.get_account_info(address).await.map_err(|e| {
            WalletError::AccountLookupFailed(format!("{}: {e}", pubkey_to_address(address)))
        })?;
        Ok(account.is_some())
    }
}

fn ensure_positive(amount: u64) -> Result<(), WalletError> {
    if amount == 0 {
        return Err(WalletError::InvalidAmount("amount must be > 0".into()));
    }
    Ok(())
}
