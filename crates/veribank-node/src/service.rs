use std::sync::{Arc, Mutex};

use tracing::info;

use veribank_ca::CertificateAuthority;
use veribank_chain::Blockchain;
use veribank_core::certificate::Certificate;
use veribank_core::constants::{DEFAULT_BALANCE, SYSTEM_SUBJECT};
use veribank_core::hash::sha256_hex;
use veribank_core::protocol::{Request, Response};
use veribank_core::types::{is_reserved, mask_account};
use veribank_core::{LedgerError, Transaction, TxType};
use veribank_crypto::hash::new_tx_id;
use veribank_storage::{AuditLog, OpStatus};

/// Dispatches the five protocol actions against the CA and the chain.
///
/// Balance checks and the subsequent mine happen under one write lock so a
/// pair of concurrent spends cannot both pass the check against the same
/// funds.
pub struct LedgerService {
    ca: Arc<CertificateAuthority>,
    chain: Arc<Blockchain>,
    audit: AuditLog,
    write_lock: Mutex<()>,
}

impl LedgerService {
    pub fn new(ca: Arc<CertificateAuthority>, chain: Arc<Blockchain>, audit: AuditLog) -> Self {
        Self { ca, chain, audit, write_lock: Mutex::new(()) }
    }

    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::Register { user_id, public_key } => self.register(&user_id, &public_key),
            Request::GetCertificate { user_id } => self.get_certificate(&user_id),
            Request::SendTransaction { transaction } => self.send_transaction(transaction),
            Request::GetChain => Response::ok_chain(self.chain.snapshot()),
            Request::GetBalance { user_id } => {
                Response::ok_balance(self.chain.balance_of(&user_id))
            }
        }
    }

    // ── REGISTER ─────────────────────────────────────────────────────────────

    fn register(&self, user_id: &str, public_key: &str) -> Response {
        match self.try_register(user_id, public_key) {
            Ok(cert) => {
                self.audit.record(user_id, "registration", OpStatus::Success);
                Response::ok_certificate(cert)
            }
            Err(e) => {
                self.audit.record(user_id, &format!("registration: {e}"), OpStatus::Fail);
                Response::from(&e)
            }
        }
    }

    fn try_register(&self, user_id: &str, public_key: &str) -> Result<Certificate, LedgerError> {
        if user_id.trim().is_empty() {
            return Err(LedgerError::InvalidUserId("empty".into()));
        }
        if is_reserved(user_id) {
            return Err(LedgerError::ReservedUsername(user_id.to_string()));
        }
        if self.ca.lookup_by_subject(user_id).is_some() {
            return Err(LedgerError::StateConflict(format!(
                "'{user_id}' is already registered"
            )));
        }

        let cert = self.ca.issue(user_id, public_key)?;
        let index = self.mine_welcome_deposit(user_id)?;
        info!(user_id, block = index, "registered with welcome deposit");
        Ok(cert)
    }

    /// The starting balance arrives the same way every other movement does:
    /// as a mined, CA-signed transaction.
    fn mine_welcome_deposit(&self, user_id: &str) -> Result<u64, LedgerError> {
        let mut tx = Transaction::new(
            new_tx_id(),
            self.ca.system_certificate()?,
            user_id.to_string(),
            DEFAULT_BALANCE,
            TxType::Deposit,
            "welcome credit".to_string(),
        );
        self.ca.sign_as_system(&mut tx)?;
        self.commit_transaction(&tx)
    }

    // ── SEND_TRANSACTION ─────────────────────────────────────────────────────

    fn send_transaction(&self, tx: Transaction) -> Response {
        let sender = tx.sender_subject().to_string();
        let summary = format!("{}: ${:.2}", tx.tx_type, tx.amount);
        match self.try_send(tx) {
            Ok(index) => {
                self.audit.record(
                    &sender,
                    &format!("{summary} mined in block #{index}"),
                    OpStatus::Success,
                );
                Response::ok_message("Transaction Verified & Mined")
            }
            Err(e) => {
                self.audit.record(&sender, &format!("{summary} rejected: {e}"), OpStatus::Fail);
                Response::from(&e)
            }
        }
    }

    fn try_send(&self, tx: Transaction) -> Result<u64, LedgerError> {
        // Input validation runs before any cryptography.
        if !tx.amount.is_finite() || tx.amount <= 0.0 {
            return Err(LedgerError::InvalidAmount(tx.amount));
        }
        match tx.tx_type {
            TxType::Transfer => {
                if tx.sender_subject() == tx.receiver_id {
                    return Err(LedgerError::SelfTransfer);
                }
                if self.ca.lookup_by_subject(&tx.receiver_id).is_none() {
                    return Err(LedgerError::UnknownRecipient(tx.receiver_id.clone()));
                }
            }
            TxType::Withdraw => {
                if tx.receiver_id != SYSTEM_SUBJECT {
                    return Err(LedgerError::UnknownRecipient(tx.receiver_id.clone()));
                }
            }
            // SYSTEM identity rules for deposits are enforced by the CA.
            TxType::Deposit => {}
        }

        if !self.ca.verify_transaction(&tx) {
            return Err(LedgerError::AuthFailure);
        }

        let _guard = self.write_lock.lock().expect("service write lock poisoned");
        if matches!(tx.tx_type, TxType::Withdraw | TxType::Transfer) {
            let have = self.chain.balance_of(tx.sender_subject());
            if have < tx.amount {
                return Err(LedgerError::InsufficientBalance { need: tx.amount, have });
            }
        }
        self.commit_transaction(&tx)
    }

    fn commit_transaction(&self, tx: &Transaction) -> Result<u64, LedgerError> {
        let payload = tx.canonical_json()?;
        let tx_hash = sha256_hex(payload.as_bytes());
        self.chain
            .add_block(mask_account(tx.sender_subject()), payload, tx_hash)
    }

    // ── GET_CERTIFICATE ──────────────────────────────────────────────────────

    fn get_certificate(&self, user_id: &str) -> Response {
        match self.ca.lookup_by_subject(user_id) {
            Some(cert) => Response::ok_certificate(cert),
            None => Response::error("User not found"),
        }
    }
}
