//! ─── Veribank ledger constants ──────────────────────────────────────────────

// ── Proof-of-Work ────────────────────────────────────────────────────────────

/// Leading `'0'` hex characters required of every block hash. Fixed at
/// startup; at 2 a block mines in well under a second on commodity hardware.
pub const DIFFICULTY: usize = 2;

/// `previous_hash` of the genesis block: 64 zero hex characters.
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Fixed seed hashed to produce the genesis payload and tx_hash.
pub const GENESIS_PAYLOAD_SEED: &[u8] = b"GENESIS";

// ── Symmetric cipher ─────────────────────────────────────────────────────────

/// AES-256 session key length in bytes.
pub const AES_KEY_SIZE: usize = 32;

/// AES-CBC initialization vector length in bytes.
pub const AES_IV_SIZE: usize = 16;

// ── PKI ──────────────────────────────────────────────────────────────────────

/// RSA modulus size for the CA root key.
pub const CA_KEY_BITS: usize = 4096;

/// RSA modulus size for wallet keys.
pub const WALLET_KEY_BITS: usize = 2048;

/// Name the CA writes into the `issuer` field of every certificate.
pub const CA_ISSUER_NAME: &str = "Veribank Root CA";

/// Certificate lifetime. Informational only — lifetimes are stamped and
/// signed but not enforced during verification.
pub const CERT_VALIDITY_DAYS: i64 = 365;

/// Subject of the distinguished certificate the CA issues over its own
/// public key. Deposits are signed under this identity.
pub const SYSTEM_SUBJECT: &str = "SYSTEM";

// ── Accounts ─────────────────────────────────────────────────────────────────

/// Credit mined for every freshly registered user.
pub const DEFAULT_BALANCE: f64 = 1000.00;

/// Subjects that can never be registered.
pub const RESERVED_USERNAMES: [&str; 5] = ["SYSTEM", "ADMIN", "ROOT", "DAEMON", "GUEST"];

// ── Persisted files (relative to the data directory) ─────────────────────────

pub const LEDGER_FILE: &str = "ledger.json";
pub const CERT_STORE_FILE: &str = "certificates.json";
pub const CA_KEY_FILE: &str = "ca_key.pem";
pub const AUDIT_LOG_FILE: &str = "audit_log.txt";
pub const KEYSTORE_DIR: &str = "keystore";

// ── Transport ────────────────────────────────────────────────────────────────

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5005";

/// Upper bound on a single length-prefixed frame.
pub const MAX_FRAME_BYTES: u32 = 1024 * 1024;
