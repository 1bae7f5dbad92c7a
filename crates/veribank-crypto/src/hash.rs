use rand::RngCore;

use veribank_core::hash::sha256_hex;

/// Short unique transaction identifier: the first 16 hex characters of
/// SHA-256 over 8 random bytes.
pub fn new_tx_id() -> String {
    let mut seed = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut seed);
    sha256_hex(&seed)[..16].to_string()
}
