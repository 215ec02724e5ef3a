//! Signing and blob handling. Nothing here touches the network.

use chain_sol::{decode_blob, encode_blob, Keypair, SignedTransaction, SolTransaction};
use tracing::debug;

use crate::error::WalletError;

/// Sign `unsigned` with a single keypair. Further signers can be added with
/// [`partial_sign`].
pub fn sign(unsigned: &SolTransaction, keypair: &Keypair) -> Result<SignedTransaction, WalletError> {
    let signed = chain_sol::sign_transaction(unsigned, keypair)?;
    debug!(
        signer = %keypair.address(),
        missing = signed.missing_signers().len(),
        "Signed transaction"
    );
    Ok(signed)
}

/// Sign with every keypair in `signers`.
pub fn sign_with(
    unsigned: &SolTransaction,
    signers: &[&Keypair],
) -> Result<SignedTransaction, WalletError> {
    Ok(chain_sol::sign_all(unsigned, signers)?)
}

/// Add `keypair`'s signature to an already (partially) signed transaction.
pub fn partial_sign(signed: &mut SignedTransaction, keypair: &Keypair) -> Result<(), WalletError> {
    signed.partial_sign(keypair)?;
    debug!(
        signer = %keypair.address(),
        missing = signed.missing_signers().len(),
        "Added signature"
    );
    Ok(())
}

/// Hex blob of the wire bytes.
pub fn encode(signed: &SignedTransaction) -> Result<String, WalletError> {
    Ok(encode_blob(signed)?)
}

/// Parse a hex blob. Every parse failure is [`WalletError::MalformedBlob`].
pub fn decode(blob: &str) -> Result<SignedTransaction, WalletError> {
    decode_blob(blob).map_err(|e| WalletError::MalformedBlob(e.to_string()))
}
