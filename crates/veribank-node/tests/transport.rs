//! Transport round-trip: a real TCP listener served by the node, driven by
//! the wallet's synchronous framed client.

use std::sync::Arc;

use tempfile::TempDir;
use tokio::net::TcpListener;

use veribank_ca::{CaConfig, CertificateAuthority};
use veribank_chain::{Blockchain, ChainConfig};
use veribank_core::constants::AUDIT_LOG_FILE;
use veribank_node::{server, LedgerService};
use veribank_storage::AuditLog;
use veribank_wallet::{LedgerClient, Wallet};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn framed_protocol_round_trips_over_tcp() {
    let dir = TempDir::new().unwrap();

    let mut ca_config = CaConfig::new(dir.path());
    ca_config.key_bits = 2048;
    let ca = Arc::new(CertificateAuthority::open(ca_config).unwrap());

    let mut chain_config = ChainConfig::new(dir.path());
    chain_config.difficulty = 1;
    let chain = Arc::new(Blockchain::open(chain_config).unwrap());

    let audit = AuditLog::new(dir.path().join(AUDIT_LOG_FILE));
    let service = Arc::new(LedgerService::new(ca, Arc::clone(&chain), audit));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, service));

    let keystore = dir.path().to_path_buf();
    let mined = tokio::task::spawn_blocking(move || {
        let client = LedgerClient::new(addr.to_string());

        let mut alice = Wallet::load_or_generate(&keystore, "Alice").unwrap();
        let cert = client.register("Alice", &alice.public_key_pem).unwrap();
        alice.set_certificate(cert).unwrap();

        let mut bob = Wallet::load_or_generate(&keystore, "Bob").unwrap();
        let cert = client.register("Bob", &bob.public_key_pem).unwrap();
        bob.set_certificate(cert).unwrap();

        let recipient = client.get_certificate("Bob").unwrap();
        let tx = alice
            .build_transfer("Bob", 42.0, "over the wire", Some(&recipient.public_key))
            .unwrap();
        let message = client.send_transaction(tx).unwrap();
        assert_eq!(message, "Transaction Verified & Mined");

        assert_eq!(client.get_balance("Bob").unwrap(), 1042.0);

        let blocks = client.get_chain().unwrap();
        let last = blocks.last().unwrap().clone();
        let mined: veribank_core::Transaction =
            serde_json::from_str(&last.encrypted_tx_hex).unwrap();
        assert_eq!(bob.open_memo(&mined), "over the wire");
        blocks.len()
    })
    .await
    .unwrap();

    assert_eq!(mined, chain.len());
    assert_eq!(chain.is_valid(), (true, -1));
}
