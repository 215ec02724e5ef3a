//! Ed25519 keypairs in Solana's 64-byte "secret key" layout.
//!
//! The persisted form is `seed (32) || public key (32)`, the same layout the
//! Solana CLI writes to `id.json`. The public half is redundant; on import it
//! must match the key derived from the seed.

use ed25519_dalek::{Signer, SigningKey};
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::address::pubkey_to_address;
use crate::error::SolError;

/// Length of the serialized secret key (seed + public key).
pub const KEYPAIR_LENGTH: usize = 64;

/// An Ed25519 signing keypair. The secret half is zeroized on drop.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair from OS randomness.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Build a keypair from a 32-byte Ed25519 seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Import the 64-byte secret key layout.
    ///
    /// Rejects inputs of the wrong length and inputs whose public half does
    /// not match the seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SolError> {
        let raw: &[u8; KEYPAIR_LENGTH] = bytes.try_into().map_err(|_| {
            SolError::InvalidPrivateKey(format!(
                "expected {KEYPAIR_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;

        let signing_key = SigningKey::from_keypair_bytes(raw).map_err(|_| {
            SolError::InvalidPrivateKey("public key does not match secret seed".into())
        })?;

        Ok(Self { signing_key })
    }

    /// Import a Base58-encoded 64-byte secret key (wallet export format).
    pub fn from_base58_string(encoded: &str) -> Result<Self, SolError> {
        let bytes = Zeroizing::new(
            bs58::decode(encoded.trim())
                .into_vec()
                .map_err(|e| SolError::InvalidPrivateKey(format!("base58 decode failed: {e}")))?,
        );
        Self::from_bytes(&bytes)
    }

    /// Import a JSON array of byte values (`[12, 200, ...]`).
    pub fn from_json_bytes(json: &str) -> Result<Self, SolError> {
        let bytes: Zeroizing<Vec<u8>> = Zeroizing::new(
            serde_json::from_str(json)
                .map_err(|e| SolError::InvalidPrivateKey(format!("not a JSON byte array: {e}")))?,
        );
        Self::from_bytes(&bytes)
    }

    /// The 64-byte secret key (`seed || pubkey`).
    pub fn to_bytes(&self) -> Zeroizing<[u8; KEYPAIR_LENGTH]> {
        Zeroizing::new(self.signing_key.to_keypair_bytes())
    }

    /// The secret key as a JSON array of integers, as stored on disk.
    pub fn to_json_bytes(&self) -> Result<Zeroizing<String>, SolError> {
        let bytes = Zeroizing::new(self.to_bytes().to_vec());
        serde_json::to_string(&*bytes)
            .map(Zeroizing::new)
            .map_err(|e| SolError::SerializationError(e.to_string()))
    }

    /// The secret key as a Base58 string.
    pub fn to_base58_string(&self) -> Zeroizing<String> {
        Zeroizing::new(bs58::encode(&*self.to_bytes()).into_string())
    }

    /// Raw 32-byte public key.
    pub fn pubkey(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Base58 public identifier.
    pub fn address(&self) -> String {
        pubkey_to_address(&self.pubkey())
    }

    /// Produce a detached Ed25519 signature over `message`.
    pub fn sign_message(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl PartialEq for Keypair {
    fn eq(&self, other: &Self) -> bool {
        *self.to_bytes() == *other.to_bytes()
    }
}

impl Eq for Keypair {}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
