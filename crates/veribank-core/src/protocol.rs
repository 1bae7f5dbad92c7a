//! Message shapes the ledger consumes and produces at its transport
//! boundary. The transport itself (framing, sockets) lives with the node and
//! wallet; these types only fix the JSON vocabulary.

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::certificate::Certificate;
use crate::error::LedgerError;
use crate::transaction::Transaction;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    Register { user_id: String, public_key: String },
    GetCertificate { user_id: String },
    SendTransaction { transaction: Transaction },
    GetChain,
    GetBalance { user_id: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        certificate: Option<Certificate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chain: Option<Vec<Block>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        balance: Option<f64>,
    },
    Error { message: String },
}

impl Response {
    pub fn ok_message(message: impl Into<String>) -> Self {
        Response::Success {
            message: Some(message.into()),
            certificate: None,
            chain: None,
            balance: None,
        }
    }

    pub fn ok_certificate(certificate: Certificate) -> Self {
        Response::Success {
            message: None,
            certificate: Some(certificate),
            chain: None,
            balance: None,
        }
    }

    pub fn ok_chain(chain: Vec<Block>) -> Self {
        Response::Success { message: None, certificate: None, chain: Some(chain), balance: None }
    }

    pub fn ok_balance(balance: f64) -> Self {
        Response::Success { message: None, certificate: None, chain: None, balance: Some(balance) }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Response::Error { message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }
}

impl From<&LedgerError> for Response {
    fn from(err: &LedgerError) -> Self {
        Response::error(err.to_string())
    }
}
