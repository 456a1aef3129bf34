//! CLI argument definitions using clap

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "wallet-ledger",
    version,
    about = "Wallet Ledger - balance and time-lock accounting for wallet output snapshots",
    long_about = None
)]
pub struct Cli {
    /// Wallet name to use
    #[arg(short, long, global = true)]
    pub wallet: Option<String>,

    /// Network to use: mainnet, stagenet, testnet (overrides config)
    #[arg(short, long, global = true)]
    pub network: Option<String>,

    /// Average block interval in seconds (overrides config)
    #[arg(long, global = true)]
    pub block_interval: Option<u64>,

    /// Confirmations required before an output may be spent (overrides config)
    #[arg(long, global = true)]
    pub maturation_blocks: Option<u64>,

    /// Custom data directory for wallets
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize or manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Wallet management commands
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },

    /// Show the balance of a wallet
    Balance {
        /// Evaluate at this block height instead of the snapshot tip
        #[arg(long)]
        height: Option<u64>,

        /// Evaluate at this instant (RFC 3339) instead of the snapshot tip
        #[arg(long)]
        at: Option<String>,

        /// Output format: table, json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List the outputs of a wallet with their lock status
    Outputs {
        /// Only show outputs that can be spent
        #[arg(long)]
        spendable_only: bool,

        /// Evaluate at this block height instead of the snapshot tip
        #[arg(long)]
        height: Option<u64>,

        /// Evaluate at this instant (RFC 3339) instead of the snapshot tip
        #[arg(long)]
        at: Option<String>,

        /// Output format: table, json
        #[arg(short, long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize configuration file with defaults
    Init {
        /// Network to initialize for (defaults to mainnet)
        #[arg(short, long)]
        network: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum WalletAction {
    /// List all wallets
    List,
}
