use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info, warn};

use veribank_core::LedgerError;

const WRITE_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(200);

/// Durably replace the JSON document at `path` with `value`.
///
/// Sequence per attempt: write the full document to `<path>.tmp`, flush and
/// fsync it, rotate any existing primary to `<path>.bak` (removing a stale
/// backup first), then atomically rename the temp file over the primary.
/// I/O errors are retried up to 3 times with a short backoff; after
/// exhaustion the temp file is removed and a storage error surfaced.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), LedgerError> {
    let document = serde_json::to_vec_pretty(value)
        .map_err(|e| LedgerError::Serialization(e.to_string()))?;
    let tmp = with_suffix(path, ".tmp");
    let bak = with_suffix(path, ".bak");

    let mut last_error = String::new();
    for attempt in 1..=WRITE_ATTEMPTS {
        match commit(path, &tmp, &bak, &document) {
            Ok(()) => return Ok(()),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    attempt,
                    error = %e,
                    "atomic write attempt failed"
                );
                last_error = e.to_string();
                thread::sleep(RETRY_BACKOFF);
            }
        }
    }

    let _ = fs::remove_file(&tmp);
    Err(LedgerError::Storage(format!(
        "failed to write {} after {WRITE_ATTEMPTS} attempts: {last_error}",
        path.display()
    )))
}

fn commit(path: &Path, tmp: &Path, bak: &Path, document: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(document)?;
    file.flush()?;
    file.sync_all()?;
    drop(file);

    if path.exists() {
        if bak.exists() {
            fs::remove_file(bak)?;
        }
        fs::rename(path, bak)?;
    }
    fs::rename(tmp, path)
}

/// Load the JSON document at `path`, falling back to `<path>.bak`.
///
/// A recovered backup is promoted to primary through the write protocol.
/// When neither file yields a valid document the caller's `default` is
/// returned; no file is created.
pub fn load_json<T>(path: &Path, default: T) -> T
where
    T: DeserializeOwned + Serialize,
{
    if path.exists() {
        match read_parse(path) {
            Ok(value) => return value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "primary file unreadable, trying backup");
            }
        }
    }

    let bak = with_suffix(path, ".bak");
    if bak.exists() {
        match read_parse::<T>(&bak) {
            Ok(value) => {
                if let Err(e) = atomic_write_json(path, &value) {
                    warn!(path = %path.display(), error = %e, "could not promote backup to primary");
                }
                info!(path = %path.display(), "recovered from backup");
                return value;
            }
            Err(e) => {
                error!(path = %bak.display(), error = %e, "backup also unreadable");
            }
        }
    }

    default
}

fn read_parse<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}
