//! Solana address encoding.
//!
//! A Solana address is the Base58 encoding of a raw 32-byte Ed25519 public
//! key (or of a program-derived address, which has no private key at all).

use crate::error::SolError;

/// Encode a 32-byte public key as a Solana address string.
pub fn pubkey_to_address(pubkey: &[u8; 32]) -> String {
    bs58::encode(pubkey).into_string()
}

/// Decode a Solana address string to its 32-byte representation.
///
/// Fails if the string is not Base58 or does not decode to exactly 32 bytes.
pub fn address_to_bytes(address: &str) -> Result<[u8; 32], SolError> {
    let bytes = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })
}

/// Whether `address` is a well-formed Solana address.
pub fn is_valid_address(address: &str) -> bool {
    address_to_bytes(address).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_program_address() {
        assert_eq!(
            pubkey_to_address(&[0u8; 32]),
            "11111111111111111111111111111111"
        );
    }

    #[test]
    fn roundtrip_token_program() {
        let address = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
        let bytes = address_to_bytes(address).unwrap();
        assert_eq!(pubkey_to_address(&bytes), address);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let bytes = address_to_bytes("  11111111111111111111111111111111\n").unwrap();
        assert_eq!(bytes, [0u8; 32]);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(address_to_bytes("not-a-valid-address!!!").is_err());
        assert!(!is_valid_address("0OIl"));
    }

    #[test]
    fn short_input_is_rejected() {
        // "1" decodes to a single zero byte.
        let err = address_to_bytes("1").unwrap_err();
        assert!(err.to_string().contains("expected 32 bytes"));
    }

    #[test]
    fn valid_program_addresses() {
        assert!(is_valid_address("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr"));
        assert!(is_valid_address("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL"));
    }
}
