//! Local, offline signing.
//!
//! A [`SignedTransaction`] owns the compiled message and one 64-byte
//! signature slot per required signer. Slots are filled independently, so a
//! transaction with a separate fee payer and mint authority can be signed on
//! two machines. An all-zero slot is an empty slot, matching the Solana wire
//! convention for a missing signature.

use ed25519_dalek::{Signature, VerifyingKey};

use crate::address::pubkey_to_address;
use crate::error::SolError;
use crate::keypair::Keypair;
use crate::transaction::{
    decode_compact_u16, deserialize_message, encode_compact_u16, serialize_message, ByteCursor,
    SolTransaction,
};

/// Size of an Ed25519 signature.
pub const SIGNATURE_LENGTH: usize = 64;

const EMPTY_SIGNATURE: [u8; SIGNATURE_LENGTH] = [0u8; SIGNATURE_LENGTH];

/// A message plus its detached signatures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// One slot per `message.signer_keys()`, in the same order.
    pub signatures: Vec<[u8; SIGNATURE_LENGTH]>,
    pub message: SolTransaction,
}

impl SignedTransaction {
    /// Wrap a message with all signature slots empty.
    pub fn new(message: SolTransaction) -> Self {
        let slots = message.num_required_signatures as usize;
        Self {
            signatures: vec![EMPTY_SIGNATURE; slots],
            message,
        }
    }

    /// Sign the message with `keypair` and store the signature in its slot.
    ///
    /// Re-signing the same slot is allowed and deterministic.
    pub fn partial_sign(&mut self, keypair: &Keypair) -> Result<(), SolError> {
        let pubkey = keypair.pubkey();
        let slot = self
            .message
            .signer_keys()
            .iter()
            .position(|k| *k == pubkey)
            .ok_or_else(|| {
                SolError::SigningError(format!(
                    "{} not found in transaction signers",
                    pubkey_to_address(&pubkey)
                ))
            })?;

        let message_bytes = serialize_message(&self.message)?;
        self.signatures[slot] = keypair.sign_message(&message_bytes);
        Ok(())
    }

    /// Signer keys whose slot is still empty.
    pub fn missing_signers(&self) -> Vec<[u8; 32]> {
        self.message
            .signer_keys()
            .iter()
            .zip(&self.signatures)
            .filter(|(_, sig)| **sig == EMPTY_SIGNATURE)
            .map(|(key, _)| *key)
            .collect()
    }

    /// Whether every required signer has signed.
    pub fn is_fully_signed(&self) -> bool {
        self.signatures.len() == self.message.signer_keys().len()
            && self.missing_signers().is_empty()
    }

    /// Verify every filled slot against its signer key.
    ///
    /// Empty slots are skipped; use [`Self::is_fully_signed`] to require all.
    pub fn verify_signatures(&self) -> Result<(), SolError> {
        let message_bytes = serialize_message(&self.message)?;

        for (key, sig) in self.message.signer_keys().iter().zip(&self.signatures) {
            if *sig == EMPTY_SIGNATURE {
                continue;
            }
            let vk = VerifyingKey::from_bytes(key).map_err(|e| {
                SolError::InvalidPublicKey(format!("{}: {e}", pubkey_to_address(key)))
            })?;
            vk.verify_strict(&message_bytes, &Signature::from_bytes(sig))
                .map_err(|_| {
                    SolError::SigningError(format!(
                        "signature for {} does not match message",
                        pubkey_to_address(key)
                    ))
                })?;
        }

        Ok(())
    }

    /// Transaction id: Base58 of the fee payer's signature.
    ///
    /// `None` until the fee payer has signed.
    pub fn id(&self) -> Option<String> {
        self.signatures
            .first()
            .filter(|sig| **sig != EMPTY_SIGNATURE)
            .map(|sig| bs58::encode(sig).into_string())
    }

    /// Serialize to the Solana wire format.
    pub fn to_wire_bytes(&self) -> Result<Vec<u8>, SolError> {
        let message_bytes = serialize_message(&self.message)?;
        let count = u16::try_from(self.signatures.len())
            .map_err(|_| SolError::SerializationError("too many signatures".into()))?;

        let mut wire =
            Vec::with_capacity(3 + self.signatures.len() * SIGNATURE_LENGTH + message_bytes.len());
        wire.extend_from_slice(&encode_compact_u16(count));
        for sig in &self.signatures {
            wire.extend_from_slice(sig);
        }
        wire.extend_from_slice(&message_bytes);
        Ok(wire)
    }

    /// Parse the Solana wire format.
    ///
    /// The signature count must equal the header's required-signature count,
    /// and the message must consume every remaining byte.
    pub fn from_wire_bytes(bytes: &[u8]) -> Result<Self, SolError> {
        let mut cur = ByteCursor::new(bytes);
        let count = cur.compact_u16()? as usize;

        let mut signatures = Vec::with_capacity(count.min(16));
        for _ in 0..count {
            let mut sig = EMPTY_SIGNATURE;
            sig.copy_from_slice(cur.take(SIGNATURE_LENGTH)?);
            signatures.push(sig);
        }

        let message = deserialize_message(cur.rest())?;
        if message.num_required_signatures as usize != count {
            return Err(SolError::SerializationError(format!(
                "envelope has {count} signatures but message requires {}",
                message.num_required_signatures
            )));
        }

        Ok(Self {
            signatures,
            message,
        })
    }
}

/// Sign an unsigned transaction with a single keypair.
///
/// Additional signers are added with [`SignedTransaction::partial_sign`].
pub fn sign_transaction(
    tx: &SolTransaction,
    keypair: &Keypair,
) -> Result<SignedTransaction, SolError> {
    let mut signed = SignedTransaction::new(tx.clone());
    signed.partial_sign(keypair)?;
    Ok(signed)
}

/// Sign with every keypair in `signers`, in order.
pub fn sign_all(
    tx: &SolTransaction,
    signers: &[&Keypair],
) -> Result<SignedTransaction, SolError> {
    let mut signed = SignedTransaction::new(tx.clone());
    for keypair in signers {
        signed.partial_sign(keypair)?;
    }
    Ok(signed)
}

/// Sign a pre-built wire-format transaction (e.g. from a dApp) in place.
///
/// Locates the slot that belongs to `keypair`, signs the message bytes
/// exactly as they appear in `raw_tx`, and returns the patched bytes. Unlike
/// [`SignedTransaction::from_wire_bytes`], the message is not re-parsed, so
/// formats this crate does not model are left intact.
pub fn sign_sol_raw_transaction(keypair: &Keypair, raw_tx: &[u8]) -> Result<Vec<u8>, SolError> {
    let our_pubkey = keypair.pubkey();

    let (num_sigs, compact_len) = decode_compact_u16(raw_tx)?;
    if num_sigs == 0 {
        return Err(SolError::TransactionBuildError(
            "transaction has zero signatures".into(),
        ));
    }

    let sigs_start = compact_len;
    let sigs_end = sigs_start + num_sigs as usize * SIGNATURE_LENGTH;
    if sigs_end > raw_tx.len() {
        return Err(SolError::SerializationError(
            "transaction too short: signature slots exceed length".into(),
        ));
    }

    let message_bytes = &raw_tx[sigs_end..];
    let mut cur = ByteCursor::new(message_bytes);
    let mut num_required_sigs = cur.u8()?;
    // Versioned messages carry a one-byte prefix before the header.
    if num_required_sigs & 0x80 != 0 {
        num_required_sigs = cur.u8()?;
    }
    cur.take(2)?;
    let num_accounts = cur.compact_u16()? as usize;

    let signer_idx = (0..(num_required_sigs as usize).min(num_accounts))
        .map(|_| cur.array32())
        .collect::<Result<Vec<_>, _>>()?
        .iter()
        .position(|key| *key == our_pubkey)
        .ok_or_else(|| {
            SolError::SigningError("wallet pubkey not found in transaction signers".into())
        })?;

    if signer_idx >= num_sigs as usize {
        return Err(SolError::SerializationError(
            "signer index beyond signature slots".into(),
        ));
    }

    let signature = keypair.sign_message(message_bytes);
    let mut signed_tx = raw_tx.to_vec();
    let offset = sigs_start + signer_idx * SIGNATURE_LENGTH;
    signed_tx[offset..offset + SIGNATURE_LENGTH].copy_from_slice(&signature);

    Ok(signed_tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{build_sol_transfer, compile_transaction, SolAccountMeta, SolInstruction};

    fn transfer_from(kp: &Keypair) -> SolTransaction {
        build_sol_transfer(&kp.pubkey(), &[0xBBu8; 32], 1_000_000, &[0xCC; 32]).unwrap()
    }

    fn two_signer_tx(payer: &Keypair, authority: &Keypair) -> SolTransaction {
        let ix = SolInstruction {
            program_id: [7u8; 32],
            accounts: vec![
                SolAccountMeta::writable([3u8; 32], false),
                SolAccountMeta::readonly(authority.pubkey(), true),
            ],
            data: vec![1, 2, 3],
        };
        compile_transaction(&[ix], &payer.pubkey(), &[0x44; 32]).unwrap()
    }

    #[test]
    fn single_signer_wire_layout_verifies() {
        let kp = Keypair::from_seed(&[0x42u8; 32]);
        let signed = sign_transaction(&transfer_from(&kp), &kp).unwrap();
        let wire = signed.to_wire_bytes().unwrap();

        assert_eq!(wire[0], 0x01);
        let sig: [u8; 64] = wire[1..65].try_into().unwrap();
        let vk = VerifyingKey::from_bytes(&kp.pubkey()).unwrap();
        assert!(vk
            .verify_strict(&wire[65..], &Signature::from_bytes(&sig))
            .is_ok());
        assert!(signed.is_fully_signed());
        assert!(signed.verify_signatures().is_ok());
    }

    #[test]
    fn signing_is_deterministic() {
        let kp = Keypair::from_seed(&[0x55u8; 32]);
        let tx = transfer_from(&kp);
        assert_eq!(
            sign_transaction(&tx, &kp).unwrap(),
            sign_transaction(&tx, &kp).unwrap()
        );
    }

    #[test]
    fn non_signer_is_rejected() {
        let payer = Keypair::from_seed(&[0x11u8; 32]);
        let stranger = Keypair::from_seed(&[0x22u8; 32]);
        let err = sign_transaction(&transfer_from(&payer), &stranger).unwrap_err();
        assert!(err.to_string().contains("not found in transaction signers"));
    }

    #[test]
    fn id_is_base58_of_first_signature() {
        let kp = Keypair::from_seed(&[0x33u8; 32]);
        let signed = sign_transaction(&transfer_from(&kp), &kp).unwrap();
        let id = signed.id().unwrap();
        assert_eq!(bs58::decode(&id).into_vec().unwrap(), signed.signatures[0]);

        let unsigned = SignedTransaction::new(transfer_from(&kp));
        assert!(unsigned.id().is_none());
    }

    #[test]
    fn multi_signer_requires_every_slot() {
        let payer = Keypair::from_seed(&[0x01u8; 32]);
        let authority = Keypair::from_seed(&[0x02u8; 32]);
        let tx = two_signer_tx(&payer, &authority);
        assert_eq!(tx.num_required_signatures, 2);

        let mut signed = sign_transaction(&tx, &payer).unwrap();
        assert!(!signed.is_fully_signed());
        assert_eq!(signed.missing_signers(), vec![authority.pubkey()]);
        // Partial signatures still verify.
        assert!(signed.verify_signatures().is_ok());

        signed.partial_sign(&authority).unwrap();
        assert!(signed.is_fully_signed());
        assert!(signed.verify_signatures().is_ok());
    }

    #[test]
    fn signer_order_does_not_matter() {
        let payer = Keypair::from_seed(&[0x01u8; 32]);
        let authority = Keypair::from_seed(&[0x02u8; 32]);
        let tx = two_signer_tx(&payer, &authority);

        let a = sign_all(&tx, &[&payer, &authority]).unwrap();
        let b = sign_all(&tx, &[&authority, &payer]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mutated_message_invalidates_signature() {
        let kp = Keypair::from_seed(&[0x66u8; 32]);
        let mut signed = sign_transaction(&transfer_from(&kp), &kp).unwrap();
        signed.message.compiled_instructions[0].data[4] ^= 0x01;
        assert!(signed.verify_signatures().is_err());
    }

    #[test]
    fn wire_roundtrip_is_byte_exact() {
        let payer = Keypair::generate();
        let authority = Keypair::generate();
        let signed = sign_transaction(&two_signer_tx(&payer, &authority), &payer).unwrap();

        let wire = signed.to_wire_bytes().unwrap();
        let decoded = SignedTransaction::from_wire_bytes(&wire).unwrap();
        assert_eq!(decoded, signed);
        assert_eq!(decoded.to_wire_bytes().unwrap(), wire);
    }

    #[test]
    fn signature_count_must_match_header() {
        let kp = Keypair::from_seed(&[0x42u8; 32]);
        let signed = sign_transaction(&transfer_from(&kp), &kp).unwrap();
        let wire = signed.to_wire_bytes().unwrap();

        // Claim two signatures: the message header would be read from the
        // wrong offset, or the counts disagree. Either way it must fail.
        let mut bad = vec![0x02];
        bad.extend_from_slice(&[0u8; 64]);
        bad.extend_from_slice(&wire[1..]);
        assert!(SignedTransaction::from_wire_bytes(&bad).is_err());

        let mut zero = vec![0x00];
        zero.extend_from_slice(&wire[65..]);
        let err = SignedTransaction::from_wire_bytes(&zero).unwrap_err();
        assert!(err.to_string().contains("requires 1"));
    }

    // -- sign_sol_raw_transaction ---------------------------------------------

    fn zero_first_slot(wire: &[u8]) -> Vec<u8> {
        let mut raw = wire.to_vec();
        raw[1..65].fill(0);
        raw
    }

    #[test]
    fn raw_signing_matches_structured_signing() {
        let kp = Keypair::from_seed(&[0x42u8; 32]);
        let wire = sign_transaction(&transfer_from(&kp), &kp)
            .unwrap()
            .to_wire_bytes()
            .unwrap();

        let resigned = sign_sol_raw_transaction(&kp, &zero_first_slot(&wire)).unwrap();
        assert_eq!(resigned, wire);
    }

    #[test]
    fn raw_signing_fills_second_slot() {
        let payer = Keypair::from_seed(&[0x01u8; 32]);
        let authority = Keypair::from_seed(&[0x02u8; 32]);
        let tx = two_signer_tx(&payer, &authority);

        let partial = sign_transaction(&tx, &payer).unwrap().to_wire_bytes().unwrap();
        let full = sign_sol_raw_transaction(&authority, &partial).unwrap();
        let expected = sign_all(&tx, &[&payer, &authority])
            .unwrap()
            .to_wire_bytes()
            .unwrap();
        assert_eq!(full, expected);
    }

    #[test]
    fn raw_signing_wrong_key_fails() {
        let kp = Keypair::from_seed(&[0x11u8; 32]);
        let wire = sign_transaction(&transfer_from(&kp), &kp)
            .unwrap()
            .to_wire_bytes()
            .unwrap();
        let other = Keypair::from_seed(&[0x22u8; 32]);
        let err = sign_sol_raw_transaction(&other, &wire).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn raw_signing_rejects_bad_input() {
        let kp = Keypair::from_seed(&[0x42u8; 32]);
        assert!(sign_sol_raw_transaction(&kp, &[]).is_err());
        assert!(sign_sol_raw_transaction(&kp, &[0x01]).is_err());
        let err = sign_sol_raw_transaction(&kp, &[0x00, 0x01, 0x00, 0x00]).unwrap_err();
        assert!(err.to_string().contains("zero signatures"));
    }
}
