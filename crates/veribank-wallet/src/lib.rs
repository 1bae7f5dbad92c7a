//! veribank-wallet — key custody and transaction building.
//!
//! A wallet owns an RSA-2048 key pair under
//! `<data_dir>/keystore/<user_id>/` plus the certificate the CA issued for
//! it. Transactions are built here in the only order the signature allows:
//! hybrid memo encryption first, signing second.

pub mod client;
pub mod wallet;

pub use client::LedgerClient;
pub use wallet::Wallet;
