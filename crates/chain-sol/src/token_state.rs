//! Decoders for SPL Token account data.
//!
//! Only the classic Token program layouts are handled: an 82-byte `Mint` and
//! a 165-byte token `Account`. Optional keys use the program's `COption`
//! encoding, a 4-byte little-endian tag followed by the value.

use crate::error::SolError;

/// Size of a Token program `Mint` account.
pub const MINT_LEN: usize = 82;

/// Size of a Token program token `Account`.
pub const TOKEN_ACCOUNT_LEN: usize = 165;

/// Decoded `Mint` account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintState {
    pub mint_authority: Option<[u8; 32]>,
    /// Total supply in base units.
    pub supply: u64,
    pub decimals: u8,
    pub is_initialized: bool,
    pub freeze_authority: Option<[u8; 32]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAccountStatus {
    Uninitialized,
    Initialized,
    Frozen,
}

/// Decoded token `Account`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccountState {
    pub mint: [u8; 32],
    /// Wallet that controls the account.
    pub owner: [u8; 32],
    /// Balance in base units.
    pub amount: u64,
    pub delegate: Option<[u8; 32]>,
    pub status: TokenAccountStatus,
    /// Rent-exempt reserve for wrapped SOL accounts.
    pub is_native: Option<u64>,
    pub delegated_amount: u64,
    pub close_authority: Option<[u8; 32]>,
}

impl TokenAccountState {
    pub fn is_frozen(&self) -> bool {
        self.status == TokenAccountStatus::Frozen
    }
}

/// Decode an 82-byte `Mint` account.
pub fn decode_mint(data: &[u8]) -> Result<MintState, SolError> {
    let mut reader = LayoutReader::new(data, MINT_LEN, "mint")?;

    let mint_authority = reader.option_key()?;
    let supply = reader.u64();
    let decimals = reader.u8();
    let is_initialized = reader.bool()?;
    let freeze_authority = reader.option_key()?;

    Ok(MintState {
        mint_authority,
        supply,
        decimals,
        is_initialized,
        freeze_authority,
    })
}

/// Decode a 165-byte token `Account`.
pub fn decode_token_account(data: &[u8]) -> Result<TokenAccountState, SolError> {
    let mut reader = LayoutReader::new(data, TOKEN_ACCOUNT_LEN, "token account")?;

    let mint = reader.key();
    let owner = reader.key();
    let amount = reader.u64();
    let delegate = reader.option_key()?;
    let status = match reader.u8() {
        0 => TokenAccountStatus::Uninitialized,
        1 => TokenAccountStatus::Initialized,
        2 => TokenAccountStatus::Frozen,
        other => {
            return Err(SolError::InvalidAccountData(format!(
                "unknown token account state {other}"
            )))
        }
    };
    let is_native = reader.option_u64()?;
    let delegated_amount = reader.u64();
    let close_authority = reader.option_key()?;

    Ok(TokenAccountState {
        mint,
        owner,
        amount,
        delegate,
        status,
        is_native,
        delegated_amount,
        close_authority,
    })
}

/// Fixed-size cursor. Length is checked up front, so the field reads are
/// infallible apart from tag validation.
struct LayoutReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> LayoutReader<'a> {
    fn new(data: &'a [u8], len: usize, what: &str) -> Result<Self, SolError> {
        if data.len() != len {
            return Err(SolError::InvalidAccountData(format!(
                "{what} data must be {len} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self { data, pos: 0 })
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        out
    }

    fn u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    fn u64(&mut self) -> u64 {
        u64::from_le_bytes(self.take())
    }

    fn key(&mut self) -> [u8; 32] {
        self.take()
    }

    fn bool(&mut self) -> Result<bool, SolError> {
        match self.u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SolError::InvalidAccountData(format!(
                "invalid bool byte {other}"
            ))),
        }
    }

    fn tag(&mut self) -> Result<bool, SolError> {
        match u32::from_le_bytes(self.take()) {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SolError::InvalidAccountData(format!(
                "invalid option tag {other}"
            ))),
        }
    }

    fn option_key(&mut self) -> Result<Option<[u8; 32]>, SolError> {
        let present = self.tag()?;
        let key = self.key();
        Ok(present.then_some(key))
    }

    fn option_u64(&mut self) -> Result<Option<u64>, SolError> {
        let present = self.tag()?;
        let value = self.u64();
        Ok(present.then_some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mint_bytes(authority: Option<[u8; 32]>, supply: u64, decimals: u8) -> Vec<u8> {
        let mut data = Vec::with_capacity(MINT_LEN);
        match authority {
            Some(key) => {
                data.extend_from_slice(&1u32.to_le_bytes());
                data.extend_from_slice(&key);
            }
            None => data.extend_from_slice(&[0u8; 36]),
        }
        data.extend_from_slice(&supply.to_le_bytes());
        data.push(decimals);
        data.push(1);
        data.extend_from_slice(&[0u8; 36]);
        data
    }

    fn token_account_bytes(mint: [u8; 32], owner: [u8; 32], amount: u64, state: u8) -> Vec<u8> {
        let mut data = vec![0u8; TOKEN_ACCOUNT_LEN];
        data[0..32].copy_from_slice(&mint);
        data[32..64].copy_from_slice(&owner);
        data[64..72].copy_from_slice(&amount.to_le_bytes());
        data[108] = state;
        data
    }

    // -- Mint -----------------------------------------------------------------

    #[test]
    fn mint_fields_decode_at_their_offsets() {
        let data = mint_bytes(Some([7u8; 32]), 1_000_000_000, 6);
        assert_eq!(data.len(), MINT_LEN);

        let mint = decode_mint(&data).unwrap();
        assert_eq!(mint.mint_authority, Some([7u8; 32]));
        assert_eq!(mint.supply, 1_000_000_000);
        assert_eq!(mint.decimals, 6);
        assert!(mint.is_initialized);
        assert_eq!(mint.freeze_authority, None);
    }

    #[test]
    fn mint_without_authority() {
        let mint = decode_mint(&mint_bytes(None, 0, 9)).unwrap();
        assert!(mint.mint_authority.is_none());
        assert_eq!(mint.decimals, 9);
    }

    #[test]
    fn mint_with_freeze_authority() {
        let mut data = mint_bytes(None, 5, 2);
        data[46..50].copy_from_slice(&1u32.to_le_bytes());
        data[50..82].copy_from_slice(&[3u8; 32]);
        assert_eq!(decode_mint(&data).unwrap().freeze_authority, Some([3u8; 32]));
    }

    #[test]
    fn mint_rejects_wrong_length() {
        let err = decode_mint(&[0u8; TOKEN_ACCOUNT_LEN]).unwrap_err();
        assert!(matches!(err, SolError::InvalidAccountData(_)));
        assert!(decode_mint(&[]).is_err());
    }

    #[test]
    fn mint_rejects_bad_option_tag() {
        let mut data = mint_bytes(None, 0, 0);
        data[0] = 2;
        assert!(matches!(
            decode_mint(&data),
            Err(SolError::InvalidAccountData(_))
        ));
    }

    // -- Token account --------------------------------------------------------

    #[test]
    fn token_account_fields_decode_at_their_offsets() {
        let data = token_account_bytes([1u8; 32], [2u8; 32], 42_500_000, 1);
        let account = decode_token_account(&data).unwrap();

        assert_eq!(account.mint, [1u8; 32]);
        assert_eq!(account.owner, [2u8; 32]);
        assert_eq!(account.amount, 42_500_000);
        assert_eq!(account.status, TokenAccountStatus::Initialized);
        assert!(account.delegate.is_none());
        assert!(account.is_native.is_none());
        assert!(account.close_authority.is_none());
        assert!(!account.is_frozen());
    }

    #[test]
    fn token_account_optional_fields() {
        let mut data = token_account_bytes([1u8; 32], [2u8; 32], 10, 2);
        data[72..76].copy_from_slice(&1u32.to_le_bytes());
        data[76..108].copy_from_slice(&[4u8; 32]);
        data[109..113].copy_from_slice(&1u32.to_le_bytes());
        data[113..121].copy_from_slice(&2_039_280u64.to_le_bytes());
        data[121..129].copy_from_slice(&5u64.to_le_bytes());

        let account = decode_token_account(&data).unwrap();
        assert_eq!(account.delegate, Some([4u8; 32]));
        assert_eq!(account.is_native, Some(2_039_280));
        assert_eq!(account.delegated_amount, 5);
        assert!(account.is_frozen());
    }

    #[test]
    fn token_account_rejects_mint_sized_data() {
        let err = decode_token_account(&[0u8; MINT_LEN]).unwrap_err();
        assert!(err.to_string().contains("165"));
    }

    #[test]
    fn token_account_rejects_unknown_state() {
        let data = token_account_bytes([1u8; 32], [2u8; 32], 0, 3);
        assert!(matches!(
            decode_token_account(&data),
            Err(SolError::InvalidAccountData(_))
        ));
    }
}
