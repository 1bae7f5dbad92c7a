//! RSA key management, PKCS#1 v1.5 signatures over SHA-256, and OAEP
//! envelope encryption. Keys travel as PKCS#8 PEM strings so the textual
//! form is platform-independent.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::sha2::{Digest, Sha256};
use rsa::{Oaep, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::CryptoError;

/// Generate an RSA key pair of `bits` (2048 for wallets, 4096 for the CA).
/// The private PEM is zeroized on drop.
pub fn generate_key_pair(bits: usize) -> Result<(Zeroizing<String>, String), CryptoError> {
    let mut rng = rand::thread_rng();
    let private = RsaPrivateKey::new(&mut rng, bits)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    let public = RsaPublicKey::from(&private);
    let private_pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;
    let public_pem = public
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;
    Ok((private_pem, public_pem))
}

/// Derive the public PEM from a private PEM (used when only `ca_key.pem`
/// survives on disk).
pub fn public_pem_from_private(private_pem: &str) -> Result<String, CryptoError> {
    let private = import_private(private_pem)?;
    RsaPublicKey::from(&private)
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
}

/// PKCS#1 v1.5 signature over SHA-256(data), base64-encoded.
pub fn sign(private_pem: &str, data: &[u8]) -> Result<String, CryptoError> {
    let key = import_private(private_pem)?;
    let digest = Sha256::digest(data);
    let signature = key
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    Ok(B64.encode(signature))
}

/// Verify a base64 PKCS#1 v1.5 signature. A wrong signature (or undecodable
/// base64) is `Ok(false)`; only a malformed public key is an error.
pub fn verify(public_pem: &str, data: &[u8], signature_b64: &str) -> Result<bool, CryptoError> {
    let key = import_public(public_pem)?;
    let Ok(signature) = B64.decode(signature_b64) else {
        return Ok(false);
    };
    let digest = Sha256::digest(data);
    Ok(key.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature).is_ok())
}

/// RSA-OAEP(SHA-256) encryption, base64-encoded. Input must fit the modulus;
/// the ledger only ever wraps 32-byte AES session keys here.
pub fn encrypt(public_pem: &str, data: &[u8]) -> Result<String, CryptoError> {
    let key = import_public(public_pem)?;
    let mut rng = rand::thread_rng();
    let ciphertext = key
        .encrypt(&mut rng, Oaep::new::<Sha256>(), data)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    Ok(B64.encode(ciphertext))
}

/// RSA-OAEP(SHA-256) decryption of a base64 ciphertext.
pub fn decrypt(private_pem: &str, ciphertext_b64: &str) -> Result<Vec<u8>, CryptoError> {
    let key = import_private(private_pem)?;
    let ciphertext = B64
        .decode(ciphertext_b64)
        .map_err(|_| CryptoError::Decryption("invalid base64 ciphertext".into()))?;
    key.decrypt(Oaep::new::<Sha256>(), &ciphertext)
        .map_err(|e| CryptoError::Decryption(e.to_string()))
}

fn import_private(pem: &str) -> Result<RsaPrivateKey, CryptoError> {
    RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| CryptoError::KeyImport(e.to_string()))
}

fn import_public(pem: &str) -> Result<RsaPublicKey, CryptoError> {
    RsaPublicKey::from_public_key_pem(pem).map_err(|e| CryptoError::KeyImport(e.to_string()))
}
