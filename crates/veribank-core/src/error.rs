use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    // ── Invalid input ────────────────────────────────────────────────────────
    #[error("amount must be a positive finite value: {0}")]
    InvalidAmount(f64),

    #[error("unknown recipient: {0}")]
    UnknownRecipient(String),

    #[error("self-transfer not allowed")]
    SelfTransfer,

    #[error("user id '{0}' is reserved")]
    ReservedUsername(String),

    #[error("invalid user id: {0}")]
    InvalidUserId(String),

    #[error("insufficient balance: need {need:.2}, have {have:.2}")]
    InsufficientBalance { need: f64, have: f64 },

    // ── Authentication ───────────────────────────────────────────────────────
    /// Signature or certificate verification failed. The cause is not
    /// distinguished so a caller cannot learn which check rejected it.
    #[error("invalid signature or certificate")]
    AuthFailure,

    // ── Chain integrity ──────────────────────────────────────────────────────
    #[error("block #{index} hash mismatch")]
    HashMismatch { index: u64 },

    #[error("block #{index} chain link broken")]
    BrokenLink { index: u64 },

    #[error("block #{index} fails the proof-of-work prefix")]
    PowNotSatisfied { index: u64 },

    #[error("block #{index} payload hash mismatch")]
    PayloadHashMismatch { index: u64 },

    #[error("block #{index} carries an invalid transaction")]
    InvalidBlockTransaction { index: u64 },

    // ── Crypto / storage ─────────────────────────────────────────────────────
    #[error("crypto failure: {0}")]
    Crypto(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    // ── State ────────────────────────────────────────────────────────────────
    #[error("state conflict: {0}")]
    StateConflict(String),

    // ── Client side ──────────────────────────────────────────────────────────
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rejected by ledger: {0}")]
    Rejected(String),
}
