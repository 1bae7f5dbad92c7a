//! veribank-wallet — CLI for key custody and signed transactions.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use veribank_core::constants::DEFAULT_LISTEN_ADDR;
use veribank_core::hash::sha256_hex;
use veribank_core::Transaction;
use veribank_wallet::{LedgerClient, Wallet};

#[derive(Parser, Debug)]
#[command(
    name = "veribank-wallet",
    version,
    about = "Veribank wallet — keys, certificates and signed transactions"
)]
struct Args {
    /// Directory holding the keystore.
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Address of the ledger node.
    #[arg(long, default_value = DEFAULT_LISTEN_ADDR)]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate keys if needed and request a certificate from the CA.
    Register { user_id: String },

    /// Send a signed transfer. The memo is encrypted for the recipient
    /// unless --plaintext-memo is given.
    Send {
        user_id: String,
        receiver_id: String,
        amount: f64,
        #[arg(long, default_value = "")]
        memo: String,
        #[arg(long)]
        plaintext_memo: bool,
    },

    /// Withdraw funds from the ledger.
    Withdraw {
        user_id: String,
        amount: f64,
        #[arg(long, default_value = "")]
        memo: String,
    },

    /// Show the ledger balance for a user.
    Balance { user_id: String },

    /// Dump the full chain as JSON.
    Chain,

    /// Show this wallet's transaction history.
    History { user_id: String },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let client = LedgerClient::new(&args.server);

    match args.command {
        Command::Register { user_id } => {
            let mut wallet = Wallet::load_or_generate(&args.data_dir, &user_id)?;
            let cert = client
                .register(&user_id, &wallet.public_key_pem)
                .context("registration")?;
            wallet.set_certificate(cert.clone())?;
            println!("registered '{user_id}' (serial {})", cert.serial_number);
        }

        Command::Send { user_id, receiver_id, amount, memo, plaintext_memo } => {
            let wallet = Wallet::load_or_generate(&args.data_dir, &user_id)?;
            let recipient_pem = if memo.is_empty() || plaintext_memo {
                None
            } else {
                Some(client.get_certificate(&receiver_id).context("recipient lookup")?.public_key)
            };
            let tx =
                wallet.build_transfer(&receiver_id, amount, &memo, recipient_pem.as_deref())?;
            let message = client.send_transaction(tx).context("send")?;
            println!("{message}");
        }

        Command::Withdraw { user_id, amount, memo } => {
            let wallet = Wallet::load_or_generate(&args.data_dir, &user_id)?;
            let tx = wallet.build_withdraw(amount, &memo)?;
            let message = client.send_transaction(tx).context("withdraw")?;
            println!("{message}");
        }

        Command::Balance { user_id } => {
            let balance = client.get_balance(&user_id)?;
            println!("{balance:.2}");
        }

        Command::Chain => {
            let chain = client.get_chain()?;
            println!("{}", serde_json::to_string_pretty(&chain)?);
        }

        Command::History { user_id } => {
            let wallet = Wallet::load_or_generate(&args.data_dir, &user_id)?;
            let chain = client.get_chain()?;
            for block in chain.iter().skip(1) {
                let Ok(tx) = serde_json::from_str::<Transaction>(&block.encrypted_tx_hex) else {
                    println!("#{:<4} [X] undecodable payload", block.index);
                    continue;
                };
                let sender = tx.sender_subject();
                if sender != user_id && tx.receiver_id != user_id {
                    continue;
                }
                let intact =
                    sha256_hex(block.encrypted_tx_hex.as_bytes()) == block.tx_hash;
                let status = if intact { "[OK]" } else { "[X] tampered" };
                let memo = if tx.receiver_id == user_id {
                    wallet.open_memo(&tx)
                } else {
                    tx.memo.clone()
                };
                println!(
                    "#{:<4} {status} {:<8} {:>10.2}  {} -> {}  {}",
                    block.index, tx.tx_type, tx.amount, sender, tx.receiver_id, memo
                );
            }
        }
    }

    Ok(())
}
