//! Canonical JSON: UTF-8, keys sorted ascending, no inter-token whitespace.
//!
//! `serde_json`'s default object map is BTree-backed, so round-tripping any
//! `Serialize` value through `serde_json::Value` and emitting the compact
//! form yields a unique byte representation. Every hash and every signature
//! in the system is computed over these bytes.

use serde::Serialize;

use crate::error::LedgerError;

/// Canonical JSON string of `value`.
pub fn to_string<T: Serialize>(value: &T) -> Result<String, LedgerError> {
    let value =
        serde_json::to_value(value).map_err(|e| LedgerError::Serialization(e.to_string()))?;
    serde_json::to_string(&value).map_err(|e| LedgerError::Serialization(e.to_string()))
}

/// Canonical JSON bytes of `value`.
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    Ok(to_string(value)?.into_bytes())
}
