//! Synchronous client for the node's framed-JSON protocol: one request per
//! connection, 4-byte big-endian length prefix, JSON body.

use std::io::{Read, Write};
use std::net::TcpStream;

use veribank_core::constants::MAX_FRAME_BYTES;
use veribank_core::protocol::{Request, Response};
use veribank_core::{Block, Certificate, LedgerError, Transaction};

pub struct LedgerClient {
    addr: String,
}

impl LedgerClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Issue one request and read back the response.
    pub fn call(&self, request: &Request) -> Result<Response, LedgerError> {
        let mut stream = TcpStream::connect(&self.addr)
            .map_err(|e| LedgerError::Transport(format!("connect {}: {e}", self.addr)))?;

        let body = serde_json::to_vec(request)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        stream
            .write_all(&(body.len() as u32).to_be_bytes())
            .and_then(|_| stream.write_all(&body))
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        let mut len_buf = [0u8; 4];
        stream
            .read_exact(&mut len_buf)
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let len = u32::from_be_bytes(len_buf);
        if len > MAX_FRAME_BYTES {
            return Err(LedgerError::Transport(format!("oversized frame: {len} bytes")));
        }

        let mut body = vec![0u8; len as usize];
        stream
            .read_exact(&mut body)
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    pub fn register(&self, user_id: &str, public_key: &str) -> Result<Certificate, LedgerError> {
        let response = self.call(&Request::Register {
            user_id: user_id.to_string(),
            public_key: public_key.to_string(),
        })?;
        match response {
            Response::Success { certificate: Some(cert), .. } => Ok(cert),
            other => Err(rejected(other)),
        }
    }

    pub fn get_certificate(&self, user_id: &str) -> Result<Certificate, LedgerError> {
        let response = self.call(&Request::GetCertificate { user_id: user_id.to_string() })?;
        match response {
            Response::Success { certificate: Some(cert), .. } => Ok(cert),
            other => Err(rejected(other)),
        }
    }

    /// Returns the node's confirmation message.
    pub fn send_transaction(&self, transaction: Transaction) -> Result<String, LedgerError> {
        let response = self.call(&Request::SendTransaction { transaction })?;
        match response {
            Response::Success { message, .. } => {
                Ok(message.unwrap_or_else(|| "ok".to_string()))
            }
            other => Err(rejected(other)),
        }
    }

    pub fn get_chain(&self) -> Result<Vec<Block>, LedgerError> {
        let response = self.call(&Request::GetChain)?;
        match response {
            Response::Success { chain: Some(chain), .. } => Ok(chain),
            other => Err(rejected(other)),
        }
    }

    pub fn get_balance(&self, user_id: &str) -> Result<f64, LedgerError> {
        let response = self.call(&Request::GetBalance { user_id: user_id.to_string() })?;
        match response {
            Response::Success { balance: Some(balance), .. } => Ok(balance),
            other => Err(rejected(other)),
        }
    }
}

fn rejected(response: Response) -> LedgerError {
    match response {
        Response::Error { message } => LedgerError::Rejected(message),
        Response::Success { .. } => {
            LedgerError::Transport("response is missing the expected field".into())
        }
    }
}
