use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;
use zeroize::Zeroizing;

use veribank_core::constants::{KEYSTORE_DIR, SYSTEM_SUBJECT, WALLET_KEY_BITS};
use veribank_core::{Certificate, LedgerError, Transaction, TxType};
use veribank_crypto::hash::new_tx_id;
use veribank_crypto::{decrypt_memo, encrypt_memo, rsa, sign_transaction};

/// A user wallet: RSA key pair plus the CA-issued certificate.
pub struct Wallet {
    pub user_id: String,
    private_key_pem: Zeroizing<String>,
    pub public_key_pem: String,
    pub certificate: Option<Certificate>,
    key_dir: PathBuf,
}

impl Wallet {
    /// Load keys and certificate from the keystore, generating and saving a
    /// fresh key pair on first use.
    pub fn load_or_generate(data_dir: &Path, user_id: &str) -> Result<Self, LedgerError> {
        let key_dir = data_dir.join(KEYSTORE_DIR).join(user_id);
        let private_path = key_dir.join("private.pem");
        let public_path = key_dir.join("public.pem");

        let (private_key_pem, public_key_pem) = if private_path.exists() {
            let private = Zeroizing::new(
                fs::read_to_string(&private_path)
                    .map_err(|e| LedgerError::Storage(e.to_string()))?,
            );
            let public = fs::read_to_string(&public_path)
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
            (private, public)
        } else {
            let (private, public) = rsa::generate_key_pair(WALLET_KEY_BITS)?;
            fs::create_dir_all(&key_dir).map_err(|e| LedgerError::Storage(e.to_string()))?;
            fs::write(&private_path, private.as_bytes())
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
            restrict_permissions(&private_path);
            fs::write(&public_path, &public)
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
            info!(user_id, "generated wallet keys");
            (private, public)
        };

        let cert_path = key_dir.join("certificate.json");
        let certificate = if cert_path.exists() {
            let bytes =
                fs::read(&cert_path).map_err(|e| LedgerError::Storage(e.to_string()))?;
            Some(
                serde_json::from_slice(&bytes)
                    .map_err(|e| LedgerError::Serialization(e.to_string()))?,
            )
        } else {
            None
        };

        Ok(Self {
            user_id: user_id.to_string(),
            private_key_pem,
            public_key_pem,
            certificate,
            key_dir,
        })
    }

    /// Adopt a freshly issued certificate and persist it next to the keys.
    pub fn set_certificate(&mut self, certificate: Certificate) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec_pretty(&certificate)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        fs::write(self.key_dir.join("certificate.json"), bytes)
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        self.certificate = Some(certificate);
        Ok(())
    }

    /// Build a signed transfer. When `recipient_public_pem` is supplied the
    /// memo is hybrid-encrypted for that key before signing.
    pub fn build_transfer(
        &self,
        receiver_id: &str,
        amount: f64,
        memo: &str,
        recipient_public_pem: Option<&str>,
    ) -> Result<Transaction, LedgerError> {
        let cert = self.require_certificate()?.clone();
        let mut tx = Transaction::new(
            new_tx_id(),
            cert,
            receiver_id.to_string(),
            amount,
            TxType::Transfer,
            memo.to_string(),
        );
        if let Some(public_pem) = recipient_public_pem {
            encrypt_memo(&mut tx, public_pem)?;
        }
        sign_transaction(&mut tx, &self.private_key_pem)?;
        Ok(tx)
    }

    /// Build a signed withdrawal (funds leave the ledger).
    pub fn build_withdraw(&self, amount: f64, memo: &str) -> Result<Transaction, LedgerError> {
        let cert = self.require_certificate()?.clone();
        let mut tx = Transaction::new(
            new_tx_id(),
            cert,
            SYSTEM_SUBJECT.to_string(),
            amount,
            TxType::Withdraw,
            memo.to_string(),
        );
        sign_transaction(&mut tx, &self.private_key_pem)?;
        Ok(tx)
    }

    /// Decrypt a memo addressed to this wallet. Failures come back as the
    /// documented sentinel, never as an error.
    pub fn open_memo(&self, tx: &Transaction) -> String {
        decrypt_memo(tx, &self.private_key_pem)
    }

    fn require_certificate(&self) -> Result<&Certificate, LedgerError> {
        self.certificate.as_ref().ok_or_else(|| {
            LedgerError::StateConflict(format!(
                "wallet '{}' has no certificate; register first",
                self.user_id
            ))
        })
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}
