//! veribank-node — the ledger daemon.
//!
//! Startup sequence:
//!   1. Open the CA (generate the root key and SYSTEM certificate if fresh)
//!   2. Open the blockchain (mine genesis if the ledger is empty)
//!   3. Validate the chain: structure first, then transaction signatures
//!   4. Serve the framed-JSON protocol

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use veribank_ca::{CaConfig, CertificateAuthority};
use veribank_chain::{Blockchain, ChainConfig};
use veribank_core::constants::{AUDIT_LOG_FILE, CA_KEY_BITS, DEFAULT_LISTEN_ADDR, DIFFICULTY};
use veribank_node::server;
use veribank_node::LedgerService;
use veribank_storage::AuditLog;

#[derive(Parser, Debug)]
#[command(
    name = "veribank-node",
    version,
    about = "Veribank ledger node — PKI-backed blockchain banking"
)]
struct Args {
    /// Directory for keys, certificate store, ledger and audit log.
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// TCP listen address for the framed-JSON protocol.
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    listen: String,

    /// Proof-of-work difficulty: required leading '0' hex characters.
    #[arg(long, default_value_t = DIFFICULTY)]
    difficulty: usize,

    /// RSA modulus size used when generating a fresh CA root key.
    #[arg(long, default_value_t = CA_KEY_BITS)]
    ca_key_bits: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,veribank=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("veribank node starting");

    let ca = {
        let mut config = CaConfig::new(&args.data_dir);
        config.key_bits = args.ca_key_bits;
        Arc::new(CertificateAuthority::open(config).context("opening certificate authority")?)
    };

    let chain = {
        let mut config = ChainConfig::new(&args.data_dir);
        config.difficulty = args.difficulty;
        Arc::new(Blockchain::open(config).context("opening blockchain")?)
    };

    match chain.is_valid() {
        (true, _) => info!(blocks = chain.len(), "chain passed structural validation"),
        (false, index) => warn!(index, "chain FAILED structural validation - tampered ledger"),
    }
    if let Err(e) = chain.verify_transactions(&ca) {
        warn!(error = %e, "chain failed transaction re-verification");
    }

    let audit = AuditLog::new(args.data_dir.join(AUDIT_LOG_FILE));
    let service = Arc::new(LedgerService::new(ca, chain, audit));

    let listener = TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("binding {}", args.listen))?;
    server::serve(listener, service).await
}
