//! veribank-ca — the certificate authority.
//!
//! Owns the RSA-4096 root key pair and the persistent `serial → Certificate`
//! store. Issuance is serialized by an internal mutex; verification is
//! stateless and runs concurrently with issuance.

pub mod authority;

pub use authority::{CaConfig, CertificateAuthority};
