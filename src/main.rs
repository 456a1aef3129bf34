//! Wallet Ledger CLI
//!
//! Command-line interface for inspecting wallet balances and time locks
//! from output snapshots

use clap::Parser;
use std::process;
use wallet_ledger::cli::args::{Cli, Commands, ConfigAction, WalletAction};
use wallet_ledger::cli::commands;
use wallet_ledger::config::{ConfigOverrides, NetworkType};

fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    // Parse network string to NetworkType
    let network = cli.network.as_ref().map(|n| match n.parse::<NetworkType>() {
        Ok(network) => network,
        Err(_) => {
            eprintln!(
                "Error: Invalid network '{}'. Use: mainnet, stagenet, or testnet",
                n
            );
            process::exit(1);
        }
    });

    // Build config overrides from global arguments
    let overrides = ConfigOverrides {
        network,
        block_interval_secs: cli.block_interval,
        maturation_blocks: cli.maturation_blocks,
        wallets_dir: cli.data_dir.clone(),
    };

    let result: Result<(), Box<dyn std::error::Error>> = match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Init { network } => commands::config::init(network).map_err(Into::into),
        },

        Commands::Wallet { action } => match action {
            WalletAction::List => commands::wallet::list(overrides).map_err(Into::into),
        },

        Commands::Balance { height, at, format } => match tokio::runtime::Runtime::new() {
            Ok(rt) => rt
                .block_on(commands::ledger::balance(
                    cli.wallet, height, at, format, overrides,
                ))
                .map_err(Into::into),
            Err(e) => Err(format!("Failed to create async runtime: {}", e).into()),
        },

        Commands::Outputs {
            spendable_only,
            height,
            at,
            format,
        } => match tokio::runtime::Runtime::new() {
            Ok(rt) => rt
                .block_on(commands::ledger::outputs(
                    cli.wallet,
                    spendable_only,
                    height,
                    at,
                    format,
                    overrides,
                ))
                .map_err(Into::into),
            Err(e) => Err(format!("Failed to create async runtime: {}", e).into()),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
