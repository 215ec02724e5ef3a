//! Offline Solana transaction construction and signing.
//!
//! This crate handles keypairs, the legacy message wire format, SPL token
//! instructions and account layouts, detached Ed25519 signatures, and hex
//! blobs. It never touches the network and does not depend on `solana-sdk`.
//!
//! The wire format is implemented by hand, using `ed25519-dalek` for signing
//! and `bs58` for addresses.

pub mod address;
pub mod amount;
pub mod blob;
pub mod error;
pub mod keypair;
pub mod signer;
pub mod spl_token;
pub mod token_state;
pub mod transaction;

// Re-export key public types for ergonomic imports.
pub use address::{address_to_bytes, is_valid_address, pubkey_to_address};
pub use blob::{decode_blob, encode_blob};
pub use error::SolError;
pub use keypair::Keypair;
pub use signer::{sign_all, sign_sol_raw_transaction, sign_transaction, SignedTransaction};
pub use spl_token::{
    build_create_associated_token_account, build_mint_to, build_mint_to_instructions,
    build_spl_transfer, build_token_transfer_instructions, derive_associated_token_address,
    derive_metadata_address, find_program_address, ASSOCIATED_TOKEN_PROGRAM_ID,
    TOKEN_METADATA_PROGRAM_ID, TOKEN_PROGRAM_ID,
};
pub use token_state::{
    decode_mint, decode_token_account, MintState, TokenAccountState, TokenAccountStatus, MINT_LEN,
    TOKEN_ACCOUNT_LEN,
};
pub use transaction::{
    build_sol_transfer, compile_transaction, decode_compact_u16, deserialize_message,
    encode_compact_u16, serialize_message, CompiledInstruction, SolAccountMeta, SolInstruction,
    SolTransaction, UnsignedTransaction, SYSTEM_PROGRAM_ID,
};
