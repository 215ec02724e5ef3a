//! Solana legacy message model, compilation, and wire codec.
//!
//! Transactions are built by hand with no `solana-sdk` dependency. The wire
//! format is a compact binary layout:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```
//!
//! Only the message is signed. The signature envelope lives in
//! [`crate::signer`].

use crate::error::SolError;

// ---------------------------------------------------------------------------
// Solana System Program
// ---------------------------------------------------------------------------

/// The Solana System Program public key: 32 zero bytes.
/// Base58: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

/// System Program `Transfer` instruction index (little-endian u32).
const SYSTEM_TRANSFER_IX_INDEX: u32 = 2;

/// Account indices are a single byte on the wire.
const MAX_ACCOUNTS: usize = 256;

/// High bit of the first message byte marks a versioned (v0+) message.
const VERSION_PREFIX_MASK: u8 = 0x80;

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Encode a `u16` value in Solana's compact-u16 format.
///
/// - Values 0..0x7f       -> 1 byte
/// - Values 0x80..0x3fff  -> 2 bytes
/// - Values 0x4000..      -> 3 bytes
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Decode a compact-u16 value from the front of `data`.
///
/// Returns `(value, bytes_consumed)`. Only the minimal encoding is accepted,
/// so that re-encoding a decoded value reproduces the input bytes.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), SolError> {
    let mut value: u32 = 0;
    let mut consumed = 0usize;

    loop {
        let byte = *data.get(consumed).ok_or_else(|| {
            SolError::SerializationError(
                "unexpected end of data while decoding compact-u16".into(),
            )
        })?;
        value |= ((byte & 0x7f) as u32) << (7 * consumed);
        consumed += 1;

        if byte & 0x80 == 0 {
            if consumed > 1 && byte == 0 {
                return Err(SolError::SerializationError(
                    "non-canonical compact-u16 encoding".into(),
                ));
            }
            break;
        }
        if consumed == 3 {
            return Err(SolError::SerializationError(
                "compact-u16 longer than 3 bytes".into(),
            ));
        }
    }

    if value > u16::MAX as u32 {
        return Err(SolError::SerializationError(
            "compact-u16 value overflow".into(),
        ));
    }

    Ok((value as u16, consumed))
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A single account reference in a Solana instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolAccountMeta {
    pub pubkey: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

impl SolAccountMeta {
    pub fn writable(pubkey: [u8; 32], is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: [u8; 32], is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A Solana instruction (before it is compiled into a transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolInstruction {
    pub program_id: [u8; 32],
    pub accounts: Vec<SolAccountMeta>,
    pub data: Vec<u8>,
}

/// A compiled legacy message: the unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolTransaction {
    /// All account keys referenced by this transaction, in canonical order:
    ///   1. writable signers (fee payer first)
    ///   2. read-only signers
    ///   3. writable non-signers
    ///   4. read-only non-signers
    pub account_keys: Vec<[u8; 32]>,

    /// Number of required signatures (first N accounts are signers).
    pub num_required_signatures: u8,
    /// How many of the signing accounts are read-only.
    pub num_readonly_signed: u8,
    /// How many of the non-signing accounts are read-only.
    pub num_readonly_unsigned: u8,

    /// Recent blockhash (32 bytes). Bounds the lifetime of the transaction.
    pub recent_blockhash: [u8; 32],

    /// Compiled instructions (account references replaced with indices).
    pub compiled_instructions: Vec<CompiledInstruction>,
}

/// The message before any signature is attached.
pub type UnsignedTransaction = SolTransaction;

/// A compiled instruction where account references are replaced by u8 indices
/// into the transaction's `account_keys` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    /// Index into `account_keys` for the program to invoke.
    pub program_id_index: u8,
    /// Indices into `account_keys` for each account the instruction reads/writes.
    pub account_indices: Vec<u8>,
    /// Opaque instruction data.
    pub data: Vec<u8>,
}

impl SolTransaction {
    /// The fee payer is always the first account key.
    pub fn fee_payer(&self) -> Option<&[u8; 32]> {
        self.account_keys.first()
    }

    /// Keys whose signatures are required, in signature-slot order.
    pub fn signer_keys(&self) -> &[[u8; 32]] {
        let n = (self.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    /// Program id of each instruction, in execution order.
    pub fn instruction_programs(&self) -> Vec<[u8; 32]> {
        self.compiled_instructions
            .iter()
            .filter_map(|ix| self.account_keys.get(ix.program_id_index as usize).copied())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Transaction building
// ---------------------------------------------------------------------------

/// Build a native SOL transfer transaction.
///
/// Creates a System Program `Transfer` instruction that moves `lamports`
/// from `from_pubkey` to `to_pubkey`. The sender pays the fee.
///
/// The caller must supply a recent blockhash (obtained from the RPC right
/// before signing).
pub fn build_sol_transfer(
    from_pubkey: &[u8; 32],
    to_pubkey: &[u8; 32],
    lamports: u64,
    recent_blockhash: &[u8; 32],
) -> Result<SolTransaction, SolError> {
    if lamports == 0 {
        return Err(SolError::InvalidAmount("lamports must be > 0".into()));
    }

    let instruction = build_system_transfer_instruction(from_pubkey, to_pubkey, lamports);
    compile_transaction(&[instruction], from_pubkey, recent_blockhash)
}

/// Build a transaction from a set of instructions with a single fee payer.
///
/// The fee payer is always the first signer and is placed at index 0 in the
/// account keys.
pub fn compile_transaction(
    instructions: &[SolInstruction],
    fee_payer: &[u8; 32],
    recent_blockhash: &[u8; 32],
) -> Result<SolTransaction, SolError> {
    if instructions.is_empty() {
        return Err(SolError::TransactionBuildError(
            "transaction has no instructions".into(),
        ));
    }

    struct AccountEntry {
        pubkey: [u8; 32],
        is_signer: bool,
        is_writable: bool,
    }

    let mut entries: Vec<AccountEntry> = Vec::new();

    let mut upsert = |pubkey: [u8; 32], signer: bool, writable: bool| {
        if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
            entry.is_signer |= signer;
            entry.is_writable |= writable;
        } else {
            entries.push(AccountEntry {
                pubkey,
                is_signer: signer,
                is_writable: writable,
            });
        }
    };

    // Fee payer is always signer + writable, and inserted first.
    upsert(*fee_payer, true, true);

    for ix in instructions {
        for meta in &ix.accounts {
            upsert(meta.pubkey, meta.is_signer, meta.is_writable);
        }
        // Program IDs are non-signer, read-only accounts.
        upsert(ix.program_id, false, false);
    }

    if entries.len() > MAX_ACCOUNTS {
        return Err(SolError::TransactionBuildError(format!(
            "too many accounts: {} (max {MAX_ACCOUNTS})",
            entries.len()
        )));
    }

    // Stable sort keeps insertion order within a category, so the fee payer
    // (inserted first, writable signer) stays at index 0.
    entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
        (true, true) => 0u8,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    });

    let count = |what: &str, pred: &dyn Fn(&AccountEntry) -> bool| -> Result<u8, SolError> {
        let n = entries.iter().filter(|e| pred(*e)).count();
        u8::try_from(n).map_err(|_| {
            SolError::TransactionBuildError(format!("too many {what} accounts: {n} (max 255)"))
        })
    };
    let num_signers = count("signer", &|e| e.is_signer)?;
    let num_readonly_signed = count("read-only signer", &|e| e.is_signer && !e.is_writable)?;
    let num_readonly_unsigned = count("read-only", &|e| !e.is_signer && !e.is_writable)?;

    let account_keys: Vec<[u8; 32]> = entries.iter().map(|e| e.pubkey).collect();

    let index_of = |key: &[u8; 32], what: &str| -> Result<u8, SolError> {
        account_keys
            .iter()
            .position(|k| k == key)
            .map(|i| i as u8)
            .ok_or_else(|| SolError::TransactionBuildError(format!("{what} not in account keys")))
    };

    let mut compiled = Vec::with_capacity(instructions.len());
    for ix in instructions {
        let program_id_index = index_of(&ix.program_id, "program_id")?;
        let account_indices = ix
            .accounts
            .iter()
            .map(|meta| index_of(&meta.pubkey, "account"))
            .collect::<Result<Vec<u8>, _>>()?;

        compiled.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data: ix.data.clone(),
        });
    }

    Ok(SolTransaction {
        account_keys,
        num_required_signatures: num_signers,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash: *recent_blockhash,
        compiled_instructions: compiled,
    })
}

// ---------------------------------------------------------------------------
// Message codec
// ---------------------------------------------------------------------------

/// Serialize the transaction message (the bytes that get signed).
pub fn serialize_message(tx: &SolTransaction) -> Result<Vec<u8>, SolError> {
    let mut buf = Vec::with_capacity(256);

    buf.push(tx.num_required_signatures);
    buf.push(tx.num_readonly_signed);
    buf.push(tx.num_readonly_unsigned);

    buf.extend_from_slice(&encode_compact_u16(len_u16(
        tx.account_keys.len(),
        "account keys",
    )?));
    for key in &tx.account_keys {
        buf.extend_from_slice(key);
    }

    buf.extend_from_slice(&tx.recent_blockhash);

    buf.extend_from_slice(&encode_compact_u16(len_u16(
        tx.compiled_instructions.len(),
        "instructions",
    )?));
    for ix in &tx.compiled_instructions {
        buf.push(ix.program_id_index);

        buf.extend_from_slice(&encode_compact_u16(len_u16(
            ix.account_indices.len(),
            "instruction accounts",
        )?));
        buf.extend_from_slice(&ix.account_indices);

        buf.extend_from_slice(&encode_compact_u16(len_u16(
            ix.data.len(),
            "instruction data",
        )?));
        buf.extend_from_slice(&ix.data);
    }

    Ok(buf)
}

/// Parse a legacy message. `bytes` must contain exactly one message.
pub fn deserialize_message(bytes: &[u8]) -> Result<SolTransaction, SolError> {
    let mut cur = ByteCursor::new(bytes);

    let num_required_signatures = cur.u8()?;
    if num_required_signatures & VERSION_PREFIX_MASK != 0 {
        return Err(SolError::SerializationError(
            "versioned messages are not supported".into(),
        ));
    }
    let num_readonly_signed = cur.u8()?;
    let num_readonly_unsigned = cur.u8()?;

    let num_accounts = cur.compact_u16()? as usize;
    let mut account_keys = Vec::with_capacity(num_accounts);
    for _ in 0..num_accounts {
        account_keys.push(cur.array32()?);
    }

    let recent_blockhash = cur.array32()?;

    let num_instructions = cur.compact_u16()? as usize;
    let mut compiled_instructions = Vec::with_capacity(num_instructions.min(64));
    for _ in 0..num_instructions {
        let program_id_index = cur.u8()?;
        let n = cur.compact_u16()? as usize;
        let account_indices = cur.take(n)?.to_vec();
        let n = cur.compact_u16()? as usize;
        let data = cur.take(n)?.to_vec();
        compiled_instructions.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data,
        });
    }

    if cur.remaining() != 0 {
        return Err(SolError::SerializationError(format!(
            "{} trailing bytes after message",
            cur.remaining()
        )));
    }

    let tx = SolTransaction {
        account_keys,
        num_required_signatures,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash,
        compiled_instructions,
    };
    sanitize_message(&tx)?;
    Ok(tx)
}

/// Structural checks the runtime applies before executing a message.
fn sanitize_message(tx: &SolTransaction) -> Result<(), SolError> {
    let num_accounts = tx.account_keys.len();
    let required = tx.num_required_signatures as usize;

    if required == 0 {
        return Err(SolError::SerializationError(
            "message requires no signatures (no fee payer)".into(),
        ));
    }
    if tx.num_readonly_signed >= tx.num_required_signatures {
        return Err(SolError::SerializationError(
            "fee payer must be writable".into(),
        ));
    }
    if required + tx.num_readonly_unsigned as usize > num_accounts {
        return Err(SolError::SerializationError(format!(
            "header references more accounts than the {num_accounts} present"
        )));
    }

    for (i, ix) in tx.compiled_instructions.iter().enumerate() {
        let program = ix.program_id_index as usize;
        if program == 0 || program >= num_accounts {
            return Err(SolError::SerializationError(format!(
                "instruction {i}: invalid program index {program}"
            )));
        }
        if let Some(bad) = ix
            .account_indices
            .iter()
            .find(|&&idx| idx as usize >= num_accounts)
        {
            return Err(SolError::SerializationError(format!(
                "instruction {i}: account index {bad} out of range"
            )));
        }
    }

    Ok(())
}

fn len_u16(len: usize, what: &str) -> Result<u16, SolError> {
    u16::try_from(len)
        .map_err(|_| SolError::SerializationError(format!("too many {what}: {len}")))
}

/// Forward-only reader over wire bytes.
pub(crate) struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], SolError> {
        if n > self.remaining() {
            return Err(SolError::SerializationError(format!(
                "unexpected end of data: wanted {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, SolError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn array32(&mut self) -> Result<[u8; 32], SolError> {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.take(32)?);
        Ok(out)
    }

    pub(crate) fn compact_u16(&mut self) -> Result<u16, SolError> {
        let (value, used) = decode_compact_u16(self.rest())?;
        self.pos += used;
        Ok(value)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Build a System Program `Transfer` instruction.
fn build_system_transfer_instruction(
    from: &[u8; 32],
    to: &[u8; 32],
    lamports: u64,
) -> SolInstruction {
    // Instruction data: u32 LE instruction index (2 = Transfer) + u64 LE lamports.
    let mut data = Vec::with_capacity(12);
    data.extend_from_slice(&SYSTEM_TRANSFER_IX_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());

    SolInstruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*from, true),
            SolAccountMeta::writable(*to, false),
        ],
        data,
    }
}
