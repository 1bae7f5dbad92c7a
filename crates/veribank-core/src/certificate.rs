use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::error::LedgerError;

/// An X.509-style identity certificate: a CA-attested binding between a
/// subject identifier and an RSA public key.
///
/// Certificates are created by the CA on registration, persisted
/// immediately, and never mutated or deleted afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Globally unique serial (UUID v4).
    pub serial_number: String,
    /// Identifier of the principal (user id).
    pub subject: String,
    /// Name of the issuing CA.
    pub issuer: String,
    /// Subject's RSA public key, PEM-encoded.
    pub public_key: String,
    /// ISO-8601. Informational — not enforced during verification.
    pub valid_from: String,
    /// ISO-8601; one year after `valid_from` by default.
    pub valid_to: String,
    /// Base64 CA signature over [`Certificate::signing_bytes`].
    pub signature: Option<String>,
}

/// The signed portion of a certificate: every field except `signature`.
#[derive(Serialize)]
struct SigningView<'a> {
    serial_number: &'a str,
    subject: &'a str,
    issuer: &'a str,
    public_key: &'a str,
    valid_from: &'a str,
    valid_to: &'a str,
}

impl Certificate {
    pub fn unsigned(
        serial_number: String,
        subject: String,
        issuer: String,
        public_key: String,
        valid_from: String,
        valid_to: String,
    ) -> Self {
        Self {
            serial_number,
            subject,
            issuer,
            public_key,
            valid_from,
            valid_to,
            signature: None,
        }
    }

    /// Canonical JSON bytes the CA signs and verifiers recompute.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        canonical::to_bytes(&SigningView {
            serial_number: &self.serial_number,
            subject: &self.subject,
            issuer: &self.issuer,
            public_key: &self.public_key,
            valid_from: &self.valid_from,
            valid_to: &self.valid_to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Certificate {
        Certificate {
            serial_number: "s-1".into(),
            subject: "Alice".into(),
            issuer: "Test CA".into(),
            public_key: "PEM".into(),
            valid_from: "2026-01-01T00:00:00+00:00".into(),
            valid_to: "2027-01-01T00:00:00+00:00".into(),
            signature: Some("sig".into()),
        }
    }

    #[test]
    fn signing_bytes_exclude_signature_and_sort_keys() {
        let bytes = sample().signing_bytes().unwrap();
        let s = String::from_utf8(bytes).unwrap();
        assert!(!s.contains("signature"));
        assert!(s.starts_with(r#"{"issuer":"#));
        assert!(s.ends_with(r#""valid_to":"2027-01-01T00:00:00+00:00"}"#));
    }

    #[test]
    fn signing_bytes_are_stable_under_signature_changes() {
        let mut cert = sample();
        let before = cert.signing_bytes().unwrap();
        cert.signature = None;
        assert_eq!(before, cert.signing_bytes().unwrap());
    }
}
