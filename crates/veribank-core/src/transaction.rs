use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::certificate::Certificate;
use crate::error::LedgerError;
use crate::types::now_iso;

// ── TxType ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    /// System credit. Carries the SYSTEM certificate and a CA signature.
    Deposit,
    /// Funds leave the ledger; `receiver_id` is the SYSTEM sentinel.
    Withdraw,
    /// User-to-user value movement.
    Transfer,
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            TxType::Deposit => "deposit",
            TxType::Withdraw => "withdraw",
            TxType::Transfer => "transfer",
        })
    }
}

// ── Transaction ──────────────────────────────────────────────────────────────

/// A signed, optionally memo-encrypted value movement.
///
/// Construction order matters: memo encryption fills `memo`, `iv` and
/// `encrypted_aes_key`, and those fields are covered by the signature, so
/// encryption must complete before signing. Once signed, a transaction is
/// immutable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// Short unique identifier.
    pub tx_id: String,
    /// Embedded certificate of the sender. Deposits embed the SYSTEM
    /// certificate; the structured form is used everywhere internally.
    pub sender_cert: Certificate,
    /// Subject of the recipient.
    pub receiver_id: String,
    /// Non-negative two-decimal monetary value.
    pub amount: f64,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    /// Plaintext, or base64 AES ciphertext when hybrid-encrypted.
    pub memo: String,
    pub timestamp: String,
    /// Base64 RSA-PKCS#1-v1.5 signature over [`Transaction::signing_bytes`].
    pub signature: Option<String>,
    /// Base64 RSA-OAEP-wrapped 32-byte AES session key.
    pub encrypted_aes_key: Option<String>,
    /// Base64 16-byte AES-CBC initialization vector.
    pub iv: Option<String>,
}

/// The signed portion: every field except `signature`. `encrypted_aes_key`
/// and `iv` are always present (`null` when unset) so the canonical signing
/// input has a fixed key set.
#[derive(Serialize)]
struct SigningView<'a> {
    tx_id: &'a str,
    sender_cert: &'a Certificate,
    receiver_id: &'a str,
    amount: f64,
    #[serde(rename = "type")]
    tx_type: TxType,
    memo: &'a str,
    timestamp: &'a str,
    encrypted_aes_key: &'a Option<String>,
    iv: &'a Option<String>,
}

impl Transaction {
    /// A fresh unsigned, unencrypted transaction stamped with the current time.
    pub fn new(
        tx_id: String,
        sender_cert: Certificate,
        receiver_id: String,
        amount: f64,
        tx_type: TxType,
        memo: String,
    ) -> Self {
        Self {
            tx_id,
            sender_cert,
            receiver_id,
            amount,
            tx_type,
            memo,
            timestamp: now_iso(),
            signature: None,
            encrypted_aes_key: None,
            iv: None,
        }
    }

    /// Canonical JSON bytes covered by the sender's signature.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        canonical::to_bytes(&SigningView {
            tx_id: &self.tx_id,
            sender_cert: &self.sender_cert,
            receiver_id: &self.receiver_id,
            amount: self.amount,
            tx_type: self.tx_type,
            memo: &self.memo,
            timestamp: &self.timestamp,
            encrypted_aes_key: &self.encrypted_aes_key,
            iv: &self.iv,
        })
    }

    /// Canonical JSON of the whole transaction, signature included. This is
    /// the block payload, and `tx_hash` is SHA-256 over exactly these bytes.
    pub fn canonical_json(&self) -> Result<String, LedgerError> {
        canonical::to_string(self)
    }

    pub fn sender_subject(&self) -> &str {
        &self.sender_cert.subject
    }

    pub fn is_memo_encrypted(&self) -> bool {
        self.encrypted_aes_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cert() -> Certificate {
        Certificate::unsigned(
            "serial".into(),
            "Alice".into(),
            "Test CA".into(),
            "PEM".into(),
            "2026-01-01T00:00:00+00:00".into(),
            "2027-01-01T00:00:00+00:00".into(),
        )
    }

    #[test]
    fn signing_bytes_include_null_envelope_fields() {
        let tx = Transaction::new("t1".into(), cert(), "Bob".into(), 10.0, TxType::Transfer, "hi".into());
        let s = String::from_utf8(tx.signing_bytes().unwrap()).unwrap();
        assert!(s.contains(r#""encrypted_aes_key":null"#));
        assert!(s.contains(r#""iv":null"#));
        assert!(!s.contains(r#""signature""#));
        assert!(s.contains(r#""type":"transfer""#));
    }

    #[test]
    fn signature_does_not_feed_back_into_signing_bytes() {
        let mut tx =
            Transaction::new("t1".into(), cert(), "Bob".into(), 10.0, TxType::Transfer, "hi".into());
        let unsigned = tx.signing_bytes().unwrap();
        tx.signature = Some("deadbeef".into());
        assert_eq!(unsigned, tx.signing_bytes().unwrap());
    }

    #[test]
    fn envelope_fields_change_signing_bytes() {
        let mut tx =
            Transaction::new("t1".into(), cert(), "Bob".into(), 10.0, TxType::Transfer, "hi".into());
        let before = tx.signing_bytes().unwrap();
        tx.iv = Some("aXY=".into());
        tx.encrypted_aes_key = Some("a2V5".into());
        assert_ne!(before, tx.signing_bytes().unwrap());
    }

    #[test]
    fn canonical_json_round_trips() {
        let tx = Transaction::new("t1".into(), cert(), "Bob".into(), 99.5, TxType::Withdraw, "".into());
        let json = tx.canonical_json().unwrap();
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.canonical_json().unwrap(), json);
        assert_eq!(back.tx_type, TxType::Withdraw);
    }
}
