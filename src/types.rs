//! Shared types for wallet-ledger
//!
//! Common data structures used by the ledger and the CLI.

use serde::{Deserialize, Serialize};

/// Atomic units per whole coin (12 decimal places)
pub const ATOMIC_UNITS_PER_COIN: u64 = 1_000_000_000_000;

/// Spendability of a single owned output at a given chain tip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStatus {
    /// Received in the most recent block, not yet confirmed
    Pending,

    /// Lock has matured, output can be spent
    Unlocked,

    /// Still waiting for its lock to open
    Locked,

    /// Already spent
    Spent,

    /// Discovered above the evaluated tip
    Unreceived,
}

/// Information about a single owned output, for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputInfo {
    /// Transaction id (hex)
    pub tx_id: String,

    /// Amount in atomic units
    pub amount: u64,

    /// Height of the block the output was discovered in
    pub block_height: u64,

    /// Height of the spending block (0 if unspent)
    pub spent_height: u64,

    /// Confirmations at the evaluated tip
    pub age: u64,

    /// Status at the evaluated tip
    pub status: OutputStatus,

    /// Remaining wait, human readable (None unless locked)
    pub unlocks_in: Option<String>,
}

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable table format (default)
    #[default]
    Table,

    /// JSON format for machine parsing
    Json,
}

/// Render an atomic amount as a decimal coin amount
///
/// ```
/// use wallet_ledger::types::format_amount;
///
/// assert_eq!(format_amount(1_500_000_000_000), "1.500000000000");
/// ```
pub fn format_amount(atomic: u64) -> String {
    format!(
        "{}.{:012}",
        atomic / ATOMIC_UNITS_PER_COIN,
        atomic % ATOMIC_UNITS_PER_COIN
    )
}

impl std::fmt::Display for OutputStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputStatus::Pending => write!(f, "Pending"),
            OutputStatus::Unlocked => write!(f, "Unlocked"),
            OutputStatus::Locked => write!(f, "Locked"),
            OutputStatus::Spent => write!(f, "Spent"),
            OutputStatus::Unreceived => write!(f, "Unreceived"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Invalid output format '{}'. Valid options: table, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
