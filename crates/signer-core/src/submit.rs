//! Broadcasting signed blobs and looking up what happened to them.

use chain_sol::{pubkey_to_address, SignedTransaction};
use sol_rpc::{SolanaRpc, TransactionRecord};
use tracing::{info, warn};

use crate::error::WalletError;
use crate::offline;
use crate::types::{HistoryEntry, TransactionId};

/// Sends signed transactions through a caller-supplied RPC handle.
///
/// Failures are returned as-is; nothing is retried.
pub struct Submitter<'a, R: SolanaRpc + ?Sized> {
    rpc: &'a R,
}

impl<'a, R: SolanaRpc + ?Sized> Submitter<'a, R> {
    pub fn new(rpc: &'a R) -> Self {
        Self { rpc }
    }

    /// Decode `blob` and broadcast it.
    pub async fn submit(&self, blob: &str) -> Result<TransactionId, WalletError> {
        let signed = offline::decode(blob)?;
        self.submit_signed(&signed).await
    }

    /// Broadcast an already decoded transaction.
    ///
    /// Transactions with an empty or invalid signature slot are refused
    /// without contacting the network.
    pub async fn submit_signed(
        &self,
        signed: &SignedTransaction,
    ) -> Result<TransactionId, WalletError> {
        let missing = signed.missing_signers();
        if !missing.is_empty() {
            let addresses: Vec<String> = missing.iter().map(pubkey_to_address).collect();
            return Err(WalletError::SigningFailed(format!(
                "missing signatures for {}",
                addresses.join(", ")
            )));
        }
        signed
            .verify_signatures()
            .map_err(|e| WalletError::SigningFailed(e.to_string()))?;

        let wire = signed.to_wire_bytes()?;
        let signature = match self.rpc.send_transaction(&wire).await {
            Ok(signature) => signature,
            Err(e) => {
                warn!(error = %e, "Transaction submission failed");
                return Err(e.into());
            }
        };

        if signed.id().as_deref() != Some(signature.as_str()) {
            warn!(
                returned = %signature,
                local = ?signed.id(),
                "Node returned an unexpected signature"
            );
        }

        info!(signature = %signature, bytes = wire.len(), "Submitted transaction");
        Ok(TransactionId::new(signature))
    }

    /// Confirmed details for `id`, or `None` if the node does not know it.
    pub async fn status(&self, id: &str) -> Result<Option<TransactionRecord>, WalletError> {
        Ok(self.rpc.get_transaction(id).await?)
    }

    /// The `limit` most recent transactions touching `address`, newest first.
    pub async fn history(
        &self,
        address: &[u8; 32],
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, WalletError> {
        let signatures = self.rpc.get_signatures_for_address(address, limit).await?;

        let mut entries = Vec::with_capacity(signatures.len());
        for signature in signatures {
            let transaction = self.rpc.get_transaction(&signature.signature).await?;
            entries.push(HistoryEntry {
                signature,
                transaction,
            });
        }
        Ok(entries)
    }
}
