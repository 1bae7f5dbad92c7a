//! veribank-core — data model and canonical encodings for the Veribank ledger.
//!
//! Everything that is hashed or signed anywhere in the system goes through
//! [`canonical`], so the byte representation of a certificate, transaction or
//! block is unique regardless of how the value was built.

pub mod block;
pub mod canonical;
pub mod certificate;
pub mod constants;
pub mod error;
pub mod hash;
pub mod protocol;
pub mod transaction;
pub mod types;

pub use block::Block;
pub use certificate::Certificate;
pub use error::LedgerError;
pub use transaction::{Transaction, TxType};
