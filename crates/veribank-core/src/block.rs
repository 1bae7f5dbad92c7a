use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::hash::sha256_hex;
use crate::types::now_iso;

/// A mined link in the chain. Mutated only while mining (`nonce`, `hash`);
/// immutable once appended.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    /// Monotonically increasing; block 0 is genesis.
    pub index: u64,
    pub timestamp: String,
    /// Masked subject of the mining principal, e.g. `Ali***`.
    pub account_mask: String,
    /// Opaque payload string. The ledger stores the canonical signed JSON
    /// of the transaction here; the block does not interpret it.
    pub encrypted_tx_hex: String,
    /// SHA-256 hex digest of the payload bytes.
    pub tx_hash: String,
    /// Hash of the previous block, or 64 zeros for genesis.
    pub previous_hash: String,
    /// Incremented during mining.
    pub nonce: u64,
    /// SHA-256 hex digest of [`Block::compute_hash`]'s input.
    pub hash: String,
}

/// The hashed portion of a block: every field except `hash`.
#[derive(Serialize)]
struct BlockDigest<'a> {
    index: u64,
    timestamp: &'a str,
    account_mask: &'a str,
    encrypted_tx_hex: &'a str,
    tx_hash: &'a str,
    previous_hash: &'a str,
    nonce: u64,
}

impl Block {
    /// A fresh block stamped with the current time, hash precomputed at
    /// nonce 0.
    pub fn new(
        index: u64,
        account_mask: String,
        encrypted_tx_hex: String,
        tx_hash: String,
        previous_hash: String,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp: now_iso(),
            account_mask,
            encrypted_tx_hex,
            tx_hash,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// SHA-256 hex over the canonical JSON of all fields except `hash`.
    pub fn compute_hash(&self) -> String {
        let bytes = canonical::to_bytes(&BlockDigest {
            index: self.index,
            timestamp: &self.timestamp,
            account_mask: &self.account_mask,
            encrypted_tx_hex: &self.encrypted_tx_hex,
            tx_hash: &self.tx_hash,
            previous_hash: &self.previous_hash,
            nonce: self.nonce,
        })
        .expect("block digest serialization is infallible");
        sha256_hex(&bytes)
    }

    /// Search over the nonce until the hash gains `difficulty` leading `'0'`
    /// hex characters. Returns the winning hash.
    pub fn mine(&mut self, difficulty: usize) -> &str {
        let target = "0".repeat(difficulty);
        while !self.hash.starts_with(&target) {
            self.nonce += 1;
            self.hash = self.compute_hash();
        }
        &self.hash
    }

    /// Whether the stored hash satisfies the PoW prefix.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.hash.starts_with(&"0".repeat(difficulty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Block {
        Block::new(
            1,
            "Ali***".into(),
            "payload".into(),
            sha256_hex(b"payload"),
            "0".repeat(64),
        )
    }

    #[test]
    fn stored_hash_matches_recomputation() {
        let block = sample();
        assert_eq!(block.hash, block.compute_hash());
    }

    #[test]
    fn hash_excludes_itself() {
        let mut block = sample();
        let computed = block.compute_hash();
        block.hash = "f".repeat(64);
        assert_eq!(block.compute_hash(), computed);
    }

    #[test]
    fn mining_reaches_the_target_prefix() {
        let mut block = sample();
        block.mine(2);
        assert!(block.hash.starts_with("00"));
        assert!(block.meets_difficulty(2));
        assert_eq!(block.hash, block.compute_hash());
    }

    #[test]
    fn any_field_change_invalidates_the_hash() {
        let mut block = sample();
        block.mine(1);
        let mined = block.hash.clone();
        block.tx_hash = sha256_hex(b"tampered");
        assert_ne!(block.compute_hash(), mined);
    }
}
