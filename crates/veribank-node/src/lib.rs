//! veribank-node — the ledger service and its framed-JSON TCP transport.

pub mod server;
pub mod service;

pub use service::LedgerService;
