//! veribank-crypto — the cryptographic primitives behind the ledger.
//!
//! RSA (PKCS#1 v1.5 signatures, OAEP key wrap), AES-256-CBC for memo
//! payloads, and the hybrid lifecycle that ties them to a [`Transaction`].
//! All primitives operate on canonical-JSON byte strings produced by the
//! caller; nothing here reserializes.
//!
//! [`Transaction`]: veribank_core::Transaction

use thiserror::Error;

use veribank_core::LedgerError;

pub mod aes;
pub mod hash;
pub mod hybrid;
pub mod rsa;

pub use hybrid::{decrypt_memo, encrypt_memo, sign_transaction, DECRYPT_FAILED_SENTINEL};

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("key encoding failed: {0}")]
    KeyEncoding(String),

    #[error("key import failed: {0}")]
    KeyImport(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("ciphertext shorter than the {0}-byte IV")]
    CiphertextTooShort(usize),
}

impl From<CryptoError> for LedgerError {
    fn from(err: CryptoError) -> Self {
        LedgerError::Crypto(err.to_string())
    }
}
