use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;
use zeroize::Zeroizing;

use veribank_core::constants::{
    CA_ISSUER_NAME, CA_KEY_BITS, CA_KEY_FILE, CERT_STORE_FILE, CERT_VALIDITY_DAYS, SYSTEM_SUBJECT,
};
use veribank_core::{Certificate, LedgerError, Transaction, TxType};
use veribank_crypto::rsa;
use veribank_storage::{atomic_write_json, load_json};

pub struct CaConfig {
    pub data_dir: PathBuf,
    pub issuer: String,
    pub key_bits: usize,
}

impl CaConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            issuer: CA_ISSUER_NAME.to_string(),
            key_bits: CA_KEY_BITS,
        }
    }
}

/// The certificate authority.
///
/// One mutex guards the in-memory map and the on-disk store together, so
/// issuance is fully serialized. [`CertificateAuthority::verify`] touches
/// only the immutable public key and takes no lock.
pub struct CertificateAuthority {
    issuer: String,
    private_key_pem: Zeroizing<String>,
    public_key_pem: String,
    store_path: PathBuf,
    store: Mutex<BTreeMap<String, Certificate>>,
}

impl CertificateAuthority {
    /// Open the CA at `config.data_dir`: load (or generate and persist) the
    /// root key, load the certificate store, and make sure the SYSTEM
    /// certificate exists.
    pub fn open(config: CaConfig) -> Result<Self, LedgerError> {
        fs::create_dir_all(&config.data_dir)
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let key_path = config.data_dir.join(CA_KEY_FILE);
        let (private_key_pem, public_key_pem) = if key_path.exists() {
            let pem = Zeroizing::new(
                fs::read_to_string(&key_path).map_err(|e| LedgerError::Storage(e.to_string()))?,
            );
            let public = rsa::public_pem_from_private(&pem)?;
            info!("loaded CA root key");
            (pem, public)
        } else {
            info!(bits = config.key_bits, "generating CA root key");
            let (private, public) = rsa::generate_key_pair(config.key_bits)?;
            fs::write(&key_path, private.as_bytes())
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
            restrict_permissions(&key_path);
            info!("CA root key generated and saved");
            (private, public)
        };

        let store_path = config.data_dir.join(CERT_STORE_FILE);
        let store = load_json(&store_path, BTreeMap::new());

        let authority = Self {
            issuer: config.issuer,
            private_key_pem,
            public_key_pem,
            store_path,
            store: Mutex::new(store),
        };

        // Deposits are signed under this identity; nothing unsigned is ever
        // accepted.
        if authority.lookup_by_subject(SYSTEM_SUBJECT).is_none() {
            let public = authority.public_key_pem.clone();
            let cert = authority.issue(SYSTEM_SUBJECT, &public)?;
            info!(serial = %cert.serial_number, "issued SYSTEM certificate");
        }

        Ok(authority)
    }

    /// Issue a certificate binding `subject` to `public_key`, persist the
    /// updated store, and return it.
    pub fn issue(&self, subject: &str, public_key: &str) -> Result<Certificate, LedgerError> {
        let mut store = self.store.lock().expect("certificate store mutex poisoned");

        let now = Utc::now();
        let mut cert = Certificate::unsigned(
            Uuid::new_v4().to_string(),
            subject.to_string(),
            self.issuer.clone(),
            public_key.to_string(),
            now.to_rfc3339(),
            (now + Duration::days(CERT_VALIDITY_DAYS)).to_rfc3339(),
        );
        let bytes = cert.signing_bytes()?;
        cert.signature = Some(rsa::sign(&self.private_key_pem, &bytes)?);

        store.insert(cert.serial_number.clone(), cert.clone());
        atomic_write_json(&self.store_path, &*store)?;
        info!(subject, serial = %cert.serial_number, "issued certificate");
        Ok(cert)
    }

    /// Whether `cert` carries a valid CA signature over its canonical
    /// unsigned bytes. Lifetimes are not enforced.
    pub fn verify(&self, cert: &Certificate) -> bool {
        let Some(signature) = cert.signature.as_deref() else {
            return false;
        };
        let Ok(bytes) = cert.signing_bytes() else {
            return false;
        };
        rsa::verify(&self.public_key_pem, &bytes, signature).unwrap_or(false)
    }

    /// Validate a transaction against the CA: structural SYSTEM rules, a
    /// non-empty signature, a CA-signed certificate, then the transaction
    /// signature under the certificate's public key. Collapses every
    /// failure into `false` without distinguishing the cause.
    pub fn verify_transaction(&self, tx: &Transaction) -> bool {
        let is_system = tx.sender_subject() == SYSTEM_SUBJECT;
        match tx.tx_type {
            TxType::Deposit if !is_system => return false,
            TxType::Withdraw | TxType::Transfer if is_system => return false,
            _ => {}
        }

        let Some(signature) = tx.signature.as_deref() else {
            return false;
        };
        if signature.is_empty() {
            return false;
        }
        if !self.verify(&tx.sender_cert) {
            return false;
        }
        let Ok(bytes) = tx.signing_bytes() else {
            return false;
        };
        rsa::verify(&tx.sender_cert.public_key, &bytes, signature).unwrap_or(false)
    }

    /// Sign `tx` with the root key under the SYSTEM identity. Only deposits
    /// originated by the ledger itself go through here.
    pub fn sign_as_system(&self, tx: &mut Transaction) -> Result<(), LedgerError> {
        let bytes = tx.signing_bytes()?;
        tx.signature = Some(rsa::sign(&self.private_key_pem, &bytes)?);
        Ok(())
    }

    pub fn get(&self, serial: &str) -> Option<Certificate> {
        self.store
            .lock()
            .expect("certificate store mutex poisoned")
            .get(serial)
            .cloned()
    }

    /// Linear scan by subject; the store is small.
    pub fn lookup_by_subject(&self, subject: &str) -> Option<Certificate> {
        self.store
            .lock()
            .expect("certificate store mutex poisoned")
            .values()
            .find(|cert| cert.subject == subject)
            .cloned()
    }

    /// The distinguished certificate deposits are issued under.
    pub fn system_certificate(&self) -> Result<Certificate, LedgerError> {
        self.lookup_by_subject(SYSTEM_SUBJECT)
            .ok_or_else(|| LedgerError::StateConflict("SYSTEM certificate missing".into()))
    }

    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use veribank_crypto::{hash::new_tx_id, sign_transaction};

    fn open_ca(dir: &TempDir) -> CertificateAuthority {
        let mut config = CaConfig::new(dir.path());
        config.key_bits = 2048; // keep the suite fast
        CertificateAuthority::open(config).unwrap()
    }

    fn user_tx(cert: Certificate, tx_type: TxType, receiver: &str) -> Transaction {
        Transaction::new(new_tx_id(), cert, receiver.into(), 100.0, tx_type, "memo".into())
    }

    #[test]
    fn issued_certificates_verify_and_carry_unique_serials() {
        let dir = TempDir::new().unwrap();
        let ca = open_ca(&dir);
        let (_, alice_public) = rsa::generate_key_pair(2048).unwrap();

        let a = ca.issue("Alice", &alice_public).unwrap();
        let b = ca.issue("Bob", &alice_public).unwrap();

        assert!(ca.verify(&a));
        assert!(ca.verify(&b));
        assert_eq!(a.subject, "Alice");
        assert_ne!(a.serial_number, b.serial_number);
    }

    #[test]
    fn any_mutation_breaks_verification() {
        let dir = TempDir::new().unwrap();
        let ca = open_ca(&dir);
        let (_, public) = rsa::generate_key_pair(2048).unwrap();
        let cert = ca.issue("Alice", &public).unwrap();

        let mut tampered = cert.clone();
        tampered.subject = "Mallory".into();
        assert!(!ca.verify(&tampered));

        let mut tampered = cert.clone();
        tampered.valid_to = "2999-01-01T00:00:00+00:00".into();
        assert!(!ca.verify(&tampered));

        let mut tampered = cert.clone();
        tampered.public_key = "-----BEGIN PUBLIC KEY-----\nAA==\n-----END PUBLIC KEY-----\n".into();
        assert!(!ca.verify(&tampered));

        let mut tampered = cert;
        tampered.signature = Some("AAAA".into());
        assert!(!ca.verify(&tampered));
    }

    #[test]
    fn store_and_root_key_survive_a_reopen() {
        let dir = TempDir::new().unwrap();
        let serial;
        let public_pem;
        {
            let ca = open_ca(&dir);
            let (_, public) = rsa::generate_key_pair(2048).unwrap();
            serial = ca.issue("Alice", &public).unwrap().serial_number;
            public_pem = ca.public_key_pem().to_string();
        }

        let ca = open_ca(&dir);
        assert_eq!(ca.public_key_pem(), public_pem);
        let cert = ca.get(&serial).expect("certificate persisted");
        assert!(ca.verify(&cert));
        assert_eq!(ca.lookup_by_subject("Alice").unwrap().serial_number, serial);
    }

    #[test]
    fn corrupted_store_recovers_from_backup() {
        let dir = TempDir::new().unwrap();
        let serial;
        {
            let ca = open_ca(&dir);
            let (_, public) = rsa::generate_key_pair(2048).unwrap();
            // Second write: the backup now holds the generation with Alice.
            serial = ca.issue("Alice", &public).unwrap().serial_number;
            ca.issue("Bob", &public).unwrap();
        }
        let store_path = dir.path().join(CERT_STORE_FILE);
        fs::write(&store_path, b"{ corrupted").unwrap();

        let ca = open_ca(&dir);
        let cert = ca.get(&serial).expect("recovered from backup");
        assert!(ca.verify(&cert));
        // The primary was rewritten from the recovered state.
        let rewritten = fs::read_to_string(&store_path).unwrap();
        assert!(rewritten.contains(&serial));
    }

    #[test]
    fn system_identity_rules() {
        let dir = TempDir::new().unwrap();
        let ca = open_ca(&dir);

        let system = ca.system_certificate().unwrap();
        assert_eq!(system.subject, SYSTEM_SUBJECT);
        assert!(ca.verify(&system));

        // A CA-signed deposit under the SYSTEM identity is valid.
        let mut deposit = user_tx(system.clone(), TxType::Deposit, "Alice");
        ca.sign_as_system(&mut deposit).unwrap();
        assert!(ca.verify_transaction(&deposit));

        // An unsigned deposit is not, even with the SYSTEM certificate.
        let unsigned = user_tx(system.clone(), TxType::Deposit, "Alice");
        assert!(!ca.verify_transaction(&unsigned));

        // The SYSTEM identity cannot move funds out of accounts.
        let mut transfer = user_tx(system, TxType::Transfer, "Alice");
        ca.sign_as_system(&mut transfer).unwrap();
        assert!(!ca.verify_transaction(&transfer));
    }

    #[test]
    fn transaction_validation_pipeline() {
        let dir = TempDir::new().unwrap();
        let ca = open_ca(&dir);
        let (alice_private, alice_public) = rsa::generate_key_pair(2048).unwrap();
        let cert = ca.issue("Alice", &alice_public).unwrap();

        // Deposits may not be minted by ordinary users.
        let mut fake_deposit = user_tx(cert.clone(), TxType::Deposit, "Alice");
        sign_transaction(&mut fake_deposit, &alice_private).unwrap();
        assert!(!ca.verify_transaction(&fake_deposit));

        let mut tx = user_tx(cert.clone(), TxType::Transfer, "Bob");
        sign_transaction(&mut tx, &alice_private).unwrap();
        assert!(ca.verify_transaction(&tx));

        // Tampering after signing is caught.
        let mut tampered = tx.clone();
        tampered.amount = 999_999.0;
        assert!(!ca.verify_transaction(&tampered));

        // A certificate the CA never signed is rejected.
        let mut foreign = tx.clone();
        foreign.sender_cert = Certificate::unsigned(
            "forged".into(),
            "Alice".into(),
            cert.issuer.clone(),
            alice_public.clone(),
            cert.valid_from.clone(),
            cert.valid_to.clone(),
        );
        sign_transaction(&mut foreign, &alice_private).unwrap();
        assert!(!ca.verify_transaction(&foreign));

        // Missing signature is rejected.
        let unsigned = user_tx(cert, TxType::Transfer, "Bob");
        assert!(!ca.verify_transaction(&unsigned));
    }
}
