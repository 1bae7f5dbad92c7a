//! The hybrid memo lifecycle: AES-encrypt the memo under a fresh session
//! key, wrap the session key with the recipient's RSA public key, then sign
//! the canonical transaction bytes. Encryption fills fields the signature
//! covers, so it must always run first.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use rand::RngCore;
use zeroize::Zeroizing;

use veribank_core::constants::{AES_IV_SIZE, AES_KEY_SIZE};
use veribank_core::{LedgerError, Transaction};

use crate::{aes, rsa, CryptoError};

/// Returned by [`decrypt_memo`] for any failure mode, so a single tampered
/// memo never aborts history rendering.
pub const DECRYPT_FAILED_SENTINEL: &str = "[decryption failed]";

/// Hybrid-encrypt `tx.memo` for the holder of `recipient_public_pem`.
///
/// Afterwards `memo` is base64 ciphertext (IV excluded), `iv` the base64
/// IV, and `encrypted_aes_key` the OAEP-wrapped session key.
pub fn encrypt_memo(tx: &mut Transaction, recipient_public_pem: &str) -> Result<(), LedgerError> {
    let mut key = Zeroizing::new([0u8; AES_KEY_SIZE]);
    rand::thread_rng().fill_bytes(&mut *key);

    let sealed = aes::encrypt(tx.memo.as_bytes(), &key);
    tx.iv = Some(B64.encode(&sealed[..AES_IV_SIZE]));
    tx.memo = B64.encode(&sealed[AES_IV_SIZE..]);
    tx.encrypted_aes_key = Some(rsa::encrypt(recipient_public_pem, &key[..])?);
    Ok(())
}

/// Recover the memo plaintext with the receiver's private key.
///
/// A transaction without an envelope passes its memo through unchanged. Any
/// failure — wrong key, bad padding, mangled base64 — yields
/// [`DECRYPT_FAILED_SENTINEL`]; this never returns an error upward.
pub fn decrypt_memo(tx: &Transaction, receiver_private_pem: &str) -> String {
    let Some(wrapped_key) = &tx.encrypted_aes_key else {
        return tx.memo.clone();
    };
    match try_decrypt(tx, wrapped_key, receiver_private_pem) {
        Ok(plaintext) => plaintext,
        Err(_) => DECRYPT_FAILED_SENTINEL.to_string(),
    }
}

/// Sign the canonical transaction bytes with the sender's private key.
pub fn sign_transaction(tx: &mut Transaction, sender_private_pem: &str) -> Result<(), LedgerError> {
    let bytes = tx.signing_bytes()?;
    let signature = rsa::sign(sender_private_pem, &bytes)?;
    tx.signature = Some(signature);
    Ok(())
}

fn try_decrypt(
    tx: &Transaction,
    wrapped_key: &str,
    private_pem: &str,
) -> Result<String, CryptoError> {
    let key_bytes = Zeroizing::new(rsa::decrypt(private_pem, wrapped_key)?);
    let key: &[u8; AES_KEY_SIZE] = key_bytes
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::Decryption("unexpected session key length".into()))?;

    let iv = B64
        .decode(tx.iv.as_deref().unwrap_or_default())
        .map_err(|_| CryptoError::Decryption("invalid base64 iv".into()))?;
    let ciphertext = B64
        .decode(&tx.memo)
        .map_err(|_| CryptoError::Decryption("invalid base64 ciphertext".into()))?;

    let mut sealed = iv;
    sealed.extend_from_slice(&ciphertext);
    let plaintext = aes::decrypt(&sealed, key)?;
    String::from_utf8(plaintext)
        .map_err(|_| CryptoError::Decryption("memo is not valid UTF-8".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    use veribank_core::{Certificate, TxType};

    fn keys() -> &'static (Zeroizing<String>, String) {
        static KEYS: OnceLock<(Zeroizing<String>, String)> = OnceLock::new();
        KEYS.get_or_init(|| rsa::generate_key_pair(2048).unwrap())
    }

    fn sample_tx(memo: &str) -> Transaction {
        let cert = Certificate::unsigned(
            "serial".into(),
            "Alice".into(),
            "Test CA".into(),
            keys().1.clone(),
            "2026-01-01T00:00:00+00:00".into(),
            "2027-01-01T00:00:00+00:00".into(),
        );
        Transaction::new(
            crate::hash::new_tx_id(),
            cert,
            "Bob".into(),
            100.0,
            TxType::Transfer,
            memo.into(),
        )
    }

    #[test]
    fn memo_round_trip() {
        let (private_pem, public_pem) = keys();
        let mut tx = sample_tx("Top Secret");
        encrypt_memo(&mut tx, public_pem).unwrap();

        assert!(tx.is_memo_encrypted());
        assert!(tx.iv.is_some());
        assert_ne!(tx.memo, "Top Secret");
        assert_eq!(decrypt_memo(&tx, private_pem), "Top Secret");
    }

    #[test]
    fn mismatched_private_key_yields_the_sentinel() {
        let (_, public_pem) = keys();
        let (other_private, _) = rsa::generate_key_pair(2048).unwrap();
        let mut tx = sample_tx("Top Secret");
        encrypt_memo(&mut tx, public_pem).unwrap();

        assert_eq!(decrypt_memo(&tx, &other_private), DECRYPT_FAILED_SENTINEL);
    }

    #[test]
    fn plaintext_memo_passes_through() {
        let (private_pem, _) = keys();
        let tx = sample_tx("nothing to hide");
        assert_eq!(decrypt_memo(&tx, private_pem), "nothing to hide");
    }

    #[test]
    fn tampered_ciphertext_yields_the_sentinel() {
        let (private_pem, public_pem) = keys();
        let mut tx = sample_tx("Top Secret");
        encrypt_memo(&mut tx, public_pem).unwrap();
        tx.memo = "%%% not base64 %%%".into();
        assert_eq!(decrypt_memo(&tx, private_pem), DECRYPT_FAILED_SENTINEL);
    }

    #[test]
    fn encrypt_then_sign_verifies_over_the_envelope() {
        let (private_pem, public_pem) = keys();
        let mut tx = sample_tx("Top Secret");
        encrypt_memo(&mut tx, public_pem).unwrap();
        sign_transaction(&mut tx, private_pem).unwrap();

        let bytes = tx.signing_bytes().unwrap();
        let sig = tx.signature.as_deref().unwrap();
        assert!(rsa::verify(public_pem, &bytes, sig).unwrap());

        // Stripping the envelope breaks the signature.
        let mut stripped = tx.clone();
        stripped.encrypted_aes_key = None;
        let bytes = stripped.signing_bytes().unwrap();
        assert!(!rsa::verify(public_pem, &bytes, sig).unwrap());
    }
}
