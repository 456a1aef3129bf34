//! Balance and output listing commands

use chrono::{DateTime, Utc};

use crate::cache::{CacheError, WalletHandleCache};
use crate::config::{load_config, ConfigError, ConfigOverrides};
use crate::ledger::{output_status, Anchor, TimeSpan};
use crate::storage::file_system::{SnapshotOpener, StorageError};
use crate::storage::models::LoadedWallet;
use crate::types::{format_amount, OutputFormat, OutputInfo, OutputStatus};

#[derive(Debug, thiserror::Error)]
pub enum LedgerCommandError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] CacheError<StorageError>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid instant '{0}': expected RFC 3339, e.g. 2024-01-01T00:00:00Z")]
    InvalidInstant(String),

    #[error("{0}")]
    InvalidFormat(String),

    #[error("Wallet not specified. Use --wallet <name>")]
    WalletNotSpecified,
}

/// Show the balance of a wallet
pub async fn balance(
    wallet_name: Option<String>,
    height: Option<u64>,
    at: Option<String>,
    format: String,
    overrides: ConfigOverrides,
) -> Result<(), LedgerCommandError> {
    let format: OutputFormat = format.parse().map_err(LedgerCommandError::InvalidFormat)?;
    let (wallet, tip) = open_at(wallet_name, height, at, overrides).await?;

    let balance = wallet.balance_at(&tip);

    match format {
        OutputFormat::Json => {
            let locked: Vec<serde_json::Value> = balance
                .locked_schedule()
                .into_iter()
                .map(|(span, amount)| {
                    let (blocks, seconds) = match span {
                        TimeSpan::Blocks(blocks) => (Some(blocks), None),
                        TimeSpan::Duration(duration) => (None, Some(duration.num_seconds())),
                    };
                    serde_json::json!({
                        "unlocks_in": span.to_string(),
                        "blocks": blocks,
                        "seconds": seconds,
                        "amount": amount,
                    })
                })
                .collect();

            let json = serde_json::json!({
                "wallet": wallet.name,
                "height": tip.height(),
                "timestamp": tip.instant().to_rfc3339(),
                "confirmed": balance.confirmed_amount,
                "pending": balance.pending_amount,
                "total": balance.total_amount,
                "locked": locked,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Table => {
            println!(
                "Balance of '{}' at height {} ({}):",
                wallet.name,
                tip.height(),
                tip.instant().to_rfc3339()
            );
            println!("  Confirmed: {}", format_amount(balance.confirmed_amount));
            println!("  Pending:   {}", format_amount(balance.pending_amount));
            println!("  Total:     {}", format_amount(balance.total_amount));

            let schedule = balance.locked_schedule();
            if !schedule.is_empty() {
                println!();
                println!("Locked:");
                for (span, amount) in schedule {
                    println!("  {} unlocks in {}", format_amount(amount), span);
                }
            }
        }
    }

    Ok(())
}

/// List the outputs of a wallet with their status
pub async fn outputs(
    wallet_name: Option<String>,
    spendable_only: bool,
    height: Option<u64>,
    at: Option<String>,
    format: String,
    overrides: ConfigOverrides,
) -> Result<(), LedgerCommandError> {
    let format: OutputFormat = format.parse().map_err(LedgerCommandError::InvalidFormat)?;
    let (wallet, tip) = open_at(wallet_name, height, at, overrides).await?;

    let infos: Vec<OutputInfo> = wallet
        .outputs
        .iter()
        .filter(|output| output.value.is_received_by(tip.height()))
        .map(|output| {
            let status = output_status(output, &tip);
            OutputInfo {
                tx_id: output.value.id().to_hex(),
                amount: output.value.amount(),
                block_height: output.value.block_height(),
                spent_height: output.value.spent_height(),
                age: output.value.age(tip.height()),
                status,
                unlocks_in: (status == OutputStatus::Locked)
                    .then(|| output.time_until_unlock_at(&tip).to_string()),
            }
        })
        .filter(|info| !spendable_only || info.status == OutputStatus::Unlocked)
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&infos)?),
        OutputFormat::Table => {
            if infos.is_empty() {
                println!("No outputs found.");
                return Ok(());
            }

            println!(
                "{:<66} {:>22} {:>10} {:>10}  Unlocks in",
                "Tx ID", "Amount", "Height", "Status"
            );
            for info in &infos {
                println!(
                    "{:<66} {:>22} {:>10} {:>10}  {}",
                    info.tx_id,
                    format_amount(info.amount),
                    info.block_height,
                    info.status,
                    info.unlocks_in.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

/// Open a wallet through the handle cache and pick the evaluation tip
async fn open_at(
    wallet_name: Option<String>,
    height: Option<u64>,
    at: Option<String>,
    overrides: ConfigOverrides,
) -> Result<(std::sync::Arc<LoadedWallet>, Anchor), LedgerCommandError> {
    let wallet_name = wallet_name.ok_or(LedgerCommandError::WalletNotSpecified)?;
    let instant = at.as_deref().map(parse_instant).transpose()?;

    let config = load_config(None, overrides)?;
    let cache = WalletHandleCache::new(SnapshotOpener::new(config));
    let wallet = cache.get(wallet_name).await?;

    let tip = wallet.tip.retarget(height, instant);
    Ok((wallet, tip))
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>, LedgerCommandError> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| LedgerCommandError::InvalidInstant(value.to_string()))
}
