//! SPL Token instructions and program-derived addresses.
//!
//! Implements the handful of SPL Token / Associated Token Account
//! instructions the signer needs, plus PDA derivation, without pulling in the
//! `solana-sdk` or `spl-token` crates.

use sha2::{Digest, Sha256};

use crate::error::SolError;
use crate::transaction::{SolAccountMeta, SolInstruction, SYSTEM_PROGRAM_ID};

// ---------------------------------------------------------------------------
// Well-known program IDs
// ---------------------------------------------------------------------------

/// SPL Token Program ID: `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: [u8; 32] = [
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79, 0xac,
    0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff, 0x00, 0xa9,
];

/// Associated Token Account Program ID: `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: [u8; 32] = [
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d, 0x83,
    0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9, 0xf8, 0x59,
];

/// Token Metadata Program ID: `metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s`
pub const TOKEN_METADATA_PROGRAM_ID: [u8; 32] = [
    0x0b, 0x70, 0x65, 0xb1, 0xe3, 0xd1, 0x7c, 0x45, 0x38, 0x9d, 0x52, 0x7f, 0x6b, 0x04, 0xc3, 0xcd,
    0x58, 0xb8, 0x6c, 0x73, 0x1a, 0xa0, 0xfd, 0xb5, 0x49, 0xb6, 0xd1, 0xbc, 0x03, 0xf8, 0x29, 0x46,
];

/// The string appended to PDA derivation: "ProgramDerivedAddress".
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// SPL Token instruction discriminants.
const TOKEN_IX_TRANSFER: u8 = 3;
const TOKEN_IX_MINT_TO: u8 = 7;

const MAX_SEED_LEN: usize = 32;
const MAX_SEEDS: usize = 16;

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// Build an SPL Token `Transfer` instruction.
///
/// `amount` is in the token's base units (for a 6-decimal token,
/// `1_000_000` is one whole token).
///
/// Data layout: `[3] || amount (u64 LE)`, 9 bytes.
pub fn build_spl_transfer(
    from_token_account: &[u8; 32],
    to_token_account: &[u8; 32],
    owner: &[u8; 32],
    amount: u64,
) -> Result<SolInstruction, SolError> {
    if amount == 0 {
        return Err(SolError::InvalidAmount(
            "SPL transfer amount must be > 0".into(),
        ));
    }

    Ok(SolInstruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*from_token_account, false),
            SolAccountMeta::writable(*to_token_account, false),
            SolAccountMeta::readonly(*owner, true),
        ],
        data: amount_data(TOKEN_IX_TRANSFER, amount),
    })
}

/// Build an SPL Token `MintTo` instruction.
///
/// Data layout: `[7] || amount (u64 LE)`.
pub fn build_mint_to(
    mint: &[u8; 32],
    destination_token_account: &[u8; 32],
    mint_authority: &[u8; 32],
    amount: u64,
) -> Result<SolInstruction, SolError> {
    if amount == 0 {
        return Err(SolError::InvalidAmount("mint amount must be > 0".into()));
    }

    Ok(SolInstruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*mint, false),
            SolAccountMeta::writable(*destination_token_account, false),
            SolAccountMeta::readonly(*mint_authority, true),
        ],
        data: amount_data(TOKEN_IX_MINT_TO, amount),
    })
}

/// Build an Associated Token Account `Create` instruction.
///
/// `payer` funds the rent of the new account. The instruction data is empty
/// (the legacy `Create` form), which fails if the account already exists.
pub fn build_create_associated_token_account(
    payer: &[u8; 32],
    owner: &[u8; 32],
    mint: &[u8; 32],
) -> Result<SolInstruction, SolError> {
    let ata = derive_associated_token_address(owner, mint)?;

    Ok(SolInstruction {
        program_id: ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*payer, true),
            SolAccountMeta::writable(ata, false),
            SolAccountMeta::readonly(*owner, false),
            SolAccountMeta::readonly(*mint, false),
            SolAccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
            SolAccountMeta::readonly(TOKEN_PROGRAM_ID, false),
        ],
        data: Vec::new(),
    })
}

/// Instruction list for a token transfer from `from`'s ATA to `to`'s ATA.
///
/// When `recipient_account_exists` is false, exactly one ATA creation
/// instruction (paid by `from`) is placed before the transfer.
pub fn build_token_transfer_instructions(
    from: &[u8; 32],
    to: &[u8; 32],
    mint: &[u8; 32],
    amount: u64,
    recipient_account_exists: bool,
) -> Result<Vec<SolInstruction>, SolError> {
    let from_ata = derive_associated_token_address(from, mint)?;
    let to_ata = derive_associated_token_address(to, mint)?;

    let transfer = build_spl_transfer(&from_ata, &to_ata, from, amount)?;

    let mut instructions = Vec::with_capacity(2);
    if !recipient_account_exists {
        instructions.push(build_create_associated_token_account(from, to, mint)?);
    }
    instructions.push(transfer);
    Ok(instructions)
}

/// Instruction list for minting into `owner`'s ATA.
///
/// `payer` funds the ATA creation when `destination_exists` is false.
pub fn build_mint_to_instructions(
    payer: &[u8; 32],
    mint_authority: &[u8; 32],
    mint: &[u8; 32],
    owner: &[u8; 32],
    amount: u64,
    destination_exists: bool,
) -> Result<Vec<SolInstruction>, SolError> {
    let destination = derive_associated_token_address(owner, mint)?;
    let mint_to = build_mint_to(mint, &destination, mint_authority, amount)?;

    let mut instructions = Vec::with_capacity(2);
    if !destination_exists {
        instructions.push(build_create_associated_token_account(payer, owner, mint)?);
    }
    instructions.push(mint_to);
    Ok(instructions)
}

fn amount_data(discriminant: u8, amount: u64) -> Vec<u8> {
    let mut data = Vec::with_capacity(9);
    data.push(discriminant);
    data.extend_from_slice(&amount.to_le_bytes());
    data
}

// ---------------------------------------------------------------------------
// Program Derived Addresses
// ---------------------------------------------------------------------------

/// Derive the associated token account address for a wallet + mint pair.
///
/// Seeds: `[wallet, token_program_id, mint]` under the ATA program.
pub fn derive_associated_token_address(
    wallet: &[u8; 32],
    mint: &[u8; 32],
) -> Result<[u8; 32], SolError> {
    find_program_address(
        &[wallet.as_ref(), &TOKEN_PROGRAM_ID, mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|(address, _bump)| address)
}

/// Derive the Metaplex metadata account for a mint.
///
/// Seeds: `["metadata", metadata_program_id, mint]`.
pub fn derive_metadata_address(mint: &[u8; 32]) -> Result<[u8; 32], SolError> {
    find_program_address(
        &[&b"metadata"[..], &TOKEN_METADATA_PROGRAM_ID, mint.as_ref()],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .map(|(address, _bump)| address)
}

/// Find a valid Program Derived Address (PDA) for the given seeds and program.
///
/// Iterates bump seeds from 255 down to 0, computing
/// `SHA-256(seed_0 || ... || bump || program_id || "ProgramDerivedAddress")`
/// and returning the first result that is NOT a valid Ed25519 point.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &[u8; 32],
) -> Result<([u8; 32], u8), SolError> {
    // One seed slot is reserved for the bump.
    if seeds.len() >= MAX_SEEDS {
        return Err(SolError::InvalidAddress(format!(
            "too many PDA seeds: {}",
            seeds.len()
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(SolError::InvalidAddress(format!(
            "PDA seed of {} bytes exceeds {MAX_SEED_LEN}",
            seed.len()
        )));
    }

    for bump in (0u8..=255).rev() {
        if let Some(address) = try_create_program_address(seeds, &[bump], program_id) {
            return Ok((address, bump));
        }
    }

    Err(SolError::InvalidAddress(
        "could not find valid PDA bump seed".into(),
    ))
}

/// Returns `Some(address)` if the derived point is OFF the Ed25519 curve,
/// `None` if it falls on the curve.
fn try_create_program_address(
    seeds: &[&[u8]],
    bump_seed: &[u8],
    program_id: &[u8; 32],
) -> Option<[u8; 32]> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(bump_seed);
    hasher.update(program_id);
    hasher.update(PDA_MARKER);

    let hash: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&hash) {
        return None;
    }
    Some(hash)
}

/// Check if 32 bytes decompress to an Ed25519 curve point.
fn is_on_curve(bytes: &[u8; 32]) -> bool {
    curve25519_dalek::edwards::CompressedEdwardsY(*bytes)
        .decompress()
        .is_some()
}
