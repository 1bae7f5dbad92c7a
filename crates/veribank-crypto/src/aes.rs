//! AES-256-CBC with PKCS#7 padding. Output format is `iv(16) || ciphertext`.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

use veribank_core::constants::{AES_IV_SIZE, AES_KEY_SIZE};

use crate::CryptoError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Encrypt under a fresh cryptographically random IV. The IV is prepended
/// to the ciphertext.
pub fn encrypt(plaintext: &[u8], key: &[u8; AES_KEY_SIZE]) -> Vec<u8> {
    let mut iv = [0u8; AES_IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let cipher = Aes256CbcEnc::new(key.into(), (&iv).into());
    let mut out = Vec::with_capacity(AES_IV_SIZE + plaintext.len() + AES_IV_SIZE);
    out.extend_from_slice(&iv);
    out.extend(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext));
    out
}

/// Decrypt an `iv || ciphertext` buffer. Fails if the buffer is shorter
/// than one IV or the padding does not check out.
pub fn decrypt(iv_plus_ct: &[u8], key: &[u8; AES_KEY_SIZE]) -> Result<Vec<u8>, CryptoError> {
    if iv_plus_ct.len() < AES_IV_SIZE {
        return Err(CryptoError::CiphertextTooShort(AES_IV_SIZE));
    }
    let (iv, ciphertext) = iv_plus_ct.split_at(AES_IV_SIZE);
    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| CryptoError::Decryption(e.to_string()))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Decryption("invalid padding".into()))
}
