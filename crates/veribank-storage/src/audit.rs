use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use tracing::warn;

use veribank_core::types::now_iso;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpStatus {
    Success,
    Fail,
}

impl fmt::Display for OpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            OpStatus::Success => "SUCCESS",
            OpStatus::Fail => "FAIL",
        })
    }
}

/// Append-only operation log.
///
/// Appends are best-effort: a failed write is reported through the error
/// channel (`tracing::warn`) and never fails the originating operation.
#[derive(Clone, Debug)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one line of the form
    /// `[<iso-timestamp>] User: <uid> | Status: <SUCCESS|FAIL> | Action: <text>`.
    pub fn record(&self, user_id: &str, action: &str, status: OpStatus) {
        let line = format!(
            "[{}] User: {:<12} | Status: {:<8} | Action: {}\n",
            now_iso(),
            user_id,
            status,
            action
        );
        if let Err(e) = self.append(&line) {
            warn!(path = %self.path.display(), error = %e, "could not write audit log entry");
        }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}
