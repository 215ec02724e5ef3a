//! Portable hex blobs for signed transactions.
//!
//! A blob is the lowercase hex encoding of the wire bytes. It can be stored
//! in a flat file or pasted over any text channel, then submitted later
//! without access to the signing key.

use crate::error::SolError;
use crate::signer::SignedTransaction;

/// Encode a signed transaction as a hex blob.
pub fn encode_blob(tx: &SignedTransaction) -> Result<String, SolError> {
    Ok(hex::encode(tx.to_wire_bytes()?))
}

/// Decode a hex blob back into a signed transaction.
///
/// Surrounding whitespace and an optional `0x` prefix are tolerated. Any
/// other deviation (odd length, non-hex characters, an envelope that does
/// not parse exactly) is a [`SolError::MalformedBlob`].
pub fn decode_blob(blob: &str) -> Result<SignedTransaction, SolError> {
    let trimmed = blob.trim();
    let hex_str = trimmed.strip_prefix("0x").unwrap_or(trimmed);

    if hex_str.is_empty() {
        return Err(SolError::MalformedBlob("empty blob".into()));
    }

    let bytes = hex::decode(hex_str).map_err(|e| SolError::MalformedBlob(e.to_string()))?;
    SignedTransaction::from_wire_bytes(&bytes).map_err(|e| match e {
        SolError::SerializationError(msg) => SolError::MalformedBlob(msg),
        other => SolError::MalformedBlob(other.to_string()),
    })
}
