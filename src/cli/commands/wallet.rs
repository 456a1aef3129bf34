//! Wallet command implementations

use crate::config::{load_config, ConfigError, ConfigOverrides};
use crate::storage::file_system::{list_wallets as list_wallets_from_fs, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum WalletCommandError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// List all wallets
pub fn list(overrides: ConfigOverrides) -> Result<(), WalletCommandError> {
    let config = load_config(None, overrides)?;
    let wallets = list_wallets_from_fs(config.wallets_dir.as_deref())?;

    if wallets.is_empty() {
        println!("No wallets found.");
        return Ok(());
    }

    println!("Wallets:");
    println!();

    for wallet in wallets {
        let network = wallet
            .network
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} ({}, height {}, {} output(s))",
            wallet.name, network, wallet.height, wallet.output_count
        );
    }

    Ok(())
}
