//! Framed-JSON transport: 4-byte big-endian length prefix, then the JSON
//! body. One request per connection.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use veribank_core::constants::MAX_FRAME_BYTES;
use veribank_core::protocol::{Request, Response};

use crate::service::LedgerService;

/// Accept loop. Each connection gets its own task; the synchronous core
/// (mining included) runs on the blocking pool.
pub async fn serve(listener: TcpListener, service: Arc<LedgerService>) -> anyhow::Result<()> {
    info!(addr = %listener.local_addr()?, "ledger listening");
    loop {
        let (stream, peer) = listener.accept().await?;
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, service).await {
                warn!(%peer, error = %e, "connection error");
            }
        });
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    service: Arc<LedgerService>,
) -> anyhow::Result<()> {
    let len = stream.read_u32().await?;
    if len > MAX_FRAME_BYTES {
        anyhow::bail!("oversized frame: {len} bytes");
    }
    let mut body = vec![0u8; len as usize];
    stream.read_exact(&mut body).await?;

    let response = match serde_json::from_slice::<Request>(&body) {
        Ok(request) => tokio::task::spawn_blocking(move || service.handle(request)).await?,
        Err(e) => Response::error(format!("malformed request: {e}")),
    };

    let body = serde_json::to_vec(&response)?;
    stream.write_u32(body.len() as u32).await?;
    stream.write_all(&body).await?;
    stream.shutdown().await?;
    Ok(())
}
