//! `sol-offline`: one subcommand per pipeline stage.
//!
//! Blobs go to stdout (or `--out`) so they can be carried to another machine
//! and signed or submitted there. Logs go to stderr.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use signer_core::logging::init_logging;
use signer_core::WalletConfig;

#[derive(Debug, Parser)]
#[command(
    name = "sol-offline",
    version,
    about = "Solana keypair store, offline transaction signer and submitter"
)]
struct Cli {
    /// Debug-level logs for the signer crates.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Keypair directory (overrides SOLANA_KEYPAIR_DIR).
    #[arg(long, global = true)]
    keypair_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a keypair and save it as <address>.json.
    Keygen,

    /// Print known addresses: the SOLANA_PRIVATE_KEY one, then the store.
    Address,

    /// Fetch the latest blockhash.
    Checkpoint,

    /// Build and sign a native SOL transfer.
    Transfer {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Amount in SOL, or lamports with --raw.
        #[arg(long)]
        amount: String,
        #[arg(long)]
        raw: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Build and sign an SPL token transfer.
    TokenTransfer {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        mint: String,
        /// Amount in whole tokens, scaled by the mint's decimals.
        #[arg(long)]
        amount: String,
        /// Expected mint decimals; the command fails if the mint disagrees.
        #[arg(long)]
        decimals: Option<u8>,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Build a MintTo into the owner's token account.
    ///
    /// Signs with every signer available locally; the blob may still need
    /// the other party's signature (see `sign`).
    MintTo {
        #[arg(long)]
        payer: String,
        /// Defaults to the payer.
        #[arg(long)]
        authority: Option<String>,
        #[arg(long)]
        mint: String,
        #[arg(long)]
        owner: String,
        /// Amount in whole tokens, scaled by the mint's decimals.
        #[arg(long)]
        amount: String,
        /// Expected mint decimals; the command fails if the mint disagrees.
        #[arg(long)]
        decimals: Option<u8>,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Add a signature to an existing blob.
    Sign {
        /// Blob file, or `-` for stdin.
        input: String,
        #[arg(long)]
        signer: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Decode a blob and describe it.
    Inspect {
        /// Blob file, or `-` for stdin.
        input: String,
    },

    /// Broadcast a fully signed blob.
    Submit {
        /// Blob file, or `-` for stdin.
        input: String,
    },

    /// Look up a transaction by id.
    Status { id: String },

    /// Recent transactions for an address.
    History {
        address: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Balance of an address in SOL.
    Balance { address: String },

    /// Request test SOL (not available on mainnet).
    Airdrop {
        address: String,
        /// Amount in SOL.
        #[arg(long, default_value = "1")]
        amount: String,
    },

    /// Token balances held by an address.
    Tokens { address: String },

    /// Decimals, supply and authorities of a mint.
    MintInfo { mint: String },

    /// Wallet behind a token account (or the address itself for a wallet).
    Owner { address: String },

    /// Rent-exempt minimum for an existing account, in SOL.
    Rent { address: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let mut config = WalletConfig::from_env().context("Failed to load configuration")?;
    if let Some(dir) = cli.keypair_dir {
        config.keypair_dir = dir;
    }

    commands::run(cli.command, &config).await
}
