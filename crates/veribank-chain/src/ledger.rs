use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use tracing::{info, warn};

use veribank_ca::CertificateAuthority;
use veribank_core::constants::{
    DIFFICULTY, GENESIS_PAYLOAD_SEED, GENESIS_PREVIOUS_HASH, LEDGER_FILE, SYSTEM_SUBJECT,
};
use veribank_core::hash::sha256_hex;
use veribank_core::types::mask_account;
use veribank_core::{Block, LedgerError, Transaction, TxType};
use veribank_storage::{atomic_write_json, load_json};

pub struct ChainConfig {
    pub data_dir: PathBuf,
    pub difficulty: usize,
}

impl ChainConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), difficulty: DIFFICULTY }
    }
}

/// The blockchain. One mutex guards the in-memory chain and the on-disk
/// ledger together; mining is CPU-bound and may hold it for a while, which
/// is acceptable for a single-writer ledger.
pub struct Blockchain {
    difficulty: usize,
    ledger_path: PathBuf,
    chain: Mutex<Vec<Block>>,
}

impl Blockchain {
    /// Load the ledger from disk, creating and mining the genesis block if
    /// the chain is empty.
    pub fn open(config: ChainConfig) -> Result<Self, LedgerError> {
        fs::create_dir_all(&config.data_dir)
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        let ledger_path = config.data_dir.join(LEDGER_FILE);
        let chain: Vec<Block> = load_json(&ledger_path, Vec::new());
        info!(blocks = chain.len(), "loaded ledger");

        let blockchain = Self {
            difficulty: config.difficulty,
            ledger_path,
            chain: Mutex::new(chain),
        };

        {
            let mut chain = blockchain.chain.lock().expect("chain mutex poisoned");
            if chain.is_empty() {
                info!(difficulty = blockchain.difficulty, "mining genesis block");
                let seed_hash = sha256_hex(GENESIS_PAYLOAD_SEED);
                let mut genesis = Block::new(
                    0,
                    mask_account(SYSTEM_SUBJECT),
                    seed_hash.clone(),
                    seed_hash,
                    GENESIS_PREVIOUS_HASH.to_string(),
                );
                genesis.mine(blockchain.difficulty);
                chain.push(genesis);
                atomic_write_json(&blockchain.ledger_path, &*chain)?;
            }
        }

        Ok(blockchain)
    }

    /// Mine a block holding `payload` and append it. Returns the new index.
    pub fn add_block(
        &self,
        account_mask: String,
        payload: String,
        tx_hash: String,
    ) -> Result<u64, LedgerError> {
        let mut chain = self.chain.lock().expect("chain mutex poisoned");
        let previous_hash = chain.last().expect("chain always holds genesis").hash.clone();

        let mut block = Block::new(
            chain.len() as u64,
            account_mask,
            payload,
            tx_hash,
            previous_hash,
        );
        let started = Instant::now();
        block.mine(self.difficulty);
        info!(
            index = block.index,
            nonce = block.nonce,
            elapsed_ms = started.elapsed().as_millis() as u64,
            hash = %block.hash,
            "mined block"
        );

        let index = block.index;
        chain.push(block);
        if let Err(e) = atomic_write_json(&self.ledger_path, &*chain) {
            // Keep memory consistent with disk.
            chain.pop();
            return Err(e);
        }
        Ok(index)
    }

    /// Structural validation: recomputed hash, chain link, and PoW prefix
    /// for every block past genesis. Returns `(false, i)` at the first bad
    /// block, `(true, -1)` on full success.
    pub fn is_valid(&self) -> (bool, i64) {
        let chain = self.chain.lock().expect("chain mutex poisoned");
        for i in 1..chain.len() {
            let current = &chain[i];
            let previous = &chain[i - 1];

            if current.index != i as u64 || current.hash != current.compute_hash() {
                warn!(index = i, "block hash mismatch - tampered");
                return (false, i as i64);
            }
            if current.previous_hash != previous.hash {
                warn!(index = i, "chain link broken - tampered");
                return (false, i as i64);
            }
            if !current.meets_difficulty(self.difficulty) {
                warn!(index = i, "proof-of-work prefix missing - tampered");
                return (false, i as i64);
            }
        }
        (true, -1)
    }

    /// Deep validation pass for chain load: every payload must hash to its
    /// block's `tx_hash`, parse as a transaction, and carry a signature the
    /// CA accepts.
    pub fn verify_transactions(&self, ca: &CertificateAuthority) -> Result<(), LedgerError> {
        let chain = self.chain.lock().expect("chain mutex poisoned");
        for (i, block) in chain.iter().enumerate().skip(1) {
            if sha256_hex(block.encrypted_tx_hex.as_bytes()) != block.tx_hash {
                return Err(LedgerError::PayloadHashMismatch { index: i as u64 });
            }
            let tx: Transaction = serde_json::from_str(&block.encrypted_tx_hex)
                .map_err(|_| LedgerError::InvalidBlockTransaction { index: i as u64 })?;
            if !ca.verify_transaction(&tx) {
                return Err(LedgerError::InvalidBlockTransaction { index: i as u64 });
            }
        }
        Ok(())
    }

    /// Balance of `subject` by replaying every committed transaction.
    /// Deposits and incoming transfers credit; withdrawals and outgoing
    /// transfers debit. Undecodable payloads are skipped (they surface via
    /// [`Blockchain::verify_transactions`] instead).
    pub fn balance_of(&self, subject: &str) -> f64 {
        let chain = self.chain.lock().expect("chain mutex poisoned");
        let mut balance = 0.0;
        for block in chain.iter().skip(1) {
            let Ok(tx) = serde_json::from_str::<Transaction>(&block.encrypted_tx_hex) else {
                continue;
            };
            match tx.tx_type {
                TxType::Deposit | TxType::Transfer if tx.receiver_id == subject => {
                    balance += tx.amount;
                }
                _ => {}
            }
            match tx.tx_type {
                TxType::Withdraw | TxType::Transfer if tx.sender_subject() == subject => {
                    balance -= tx.amount;
                }
                _ => {}
            }
        }
        balance
    }

    /// A copy of the committed chain. External readers never see the live
    /// vector.
    pub fn snapshot(&self) -> Vec<Block> {
        self.chain.lock().expect("chain mutex poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.chain.lock().expect("chain mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }
}
