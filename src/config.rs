//! Configuration types for wallet-ledger
//!
//! Manages global configuration: network selection, ledger parameters
//! (block interval, maturation window) and the wallets directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ledger::{DEFAULT_BLOCK_INTERVAL_SECS, DEFAULT_MATURATION_BLOCKS};

/// Global wallet configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub network: NetworkType,
    pub ledger: LedgerConfig,
    /// Optional custom wallets directory
    pub wallets_dir: Option<String>,
}

/// Parameters of the balance calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Average block interval used to convert heights and instants
    pub block_interval_secs: u64,

    /// Confirmations required before a received output may be spent
    pub maturation_blocks: u64,
}

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Stagenet,
    Testnet,
}

impl GlobalConfig {
    /// Create default configuration for the given network
    pub fn for_network(network: NetworkType) -> Self {
        Self {
            network,
            ledger: LedgerConfig::default(),
            wallets_dir: None,
        }
    }

    /// Create default configuration for mainnet
    pub fn default_mainnet() -> Self {
        Self::for_network(NetworkType::Mainnet)
    }

    /// Create default configuration for stagenet
    pub fn default_stagenet() -> Self {
        Self::for_network(NetworkType::Stagenet)
    }

    /// Block interval as a duration
    pub fn block_interval(&self) -> chrono::Duration {
        let secs = i64::try_from(self.ledger.block_interval_secs).unwrap_or(i64::MAX);
        chrono::Duration::seconds(secs.min(i64::MAX / 1_000))
    }

    /// Check the values a file or override may have broken
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ledger.block_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "block_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self::default_mainnet()
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            block_interval_secs: DEFAULT_BLOCK_INTERVAL_SECS as u64,
            maturation_blocks: DEFAULT_MATURATION_BLOCKS,
        }
    }
}

impl std::str::FromStr for NetworkType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(NetworkType::Mainnet),
            "stagenet" => Ok(NetworkType::Stagenet),
            "testnet" => Ok(NetworkType::Testnet),
            _ => Err(ConfigError::InvalidNetwork(s.to_string())),
        }
    }
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkType::Mainnet => write!(f, "mainnet"),
            NetworkType::Stagenet => write!(f, "stagenet"),
            NetworkType::Testnet => write!(f, "testnet"),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid network: {0}")]
    InvalidNetwork(String),

    #[error("Config directory not found")]
    DirectoryNotFound,
}

/// Configuration overrides from CLI arguments or environment variables
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub network: Option<NetworkType>,
    pub block_interval_secs: Option<u64>,
    pub maturation_blocks: Option<u64>,
    pub wallets_dir: Option<String>,
}

impl ConfigOverrides {
    /// Create empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Create overrides from environment variables
    ///
    /// Reads `WALLET_LEDGER_NETWORK`, `WALLET_LEDGER_BLOCK_INTERVAL`,
    /// `WALLET_LEDGER_MATURATION_BLOCKS` and `WALLETS_DIR`. Unparseable
    /// values are ignored.
    pub fn from_env() -> Self {
        Self {
            network: std::env::var("WALLET_LEDGER_NETWORK")
                .ok()
                .and_then(|s| s.parse().ok()),
            block_interval_secs: std::env::var("WALLET_LEDGER_BLOCK_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok()),
            maturation_blocks: std::env::var("WALLET_LEDGER_MATURATION_BLOCKS")
                .ok()
                .and_then(|s| s.parse().ok()),
            wallets_dir: std::env::var("WALLETS_DIR").ok(),
        }
    }

    /// Merge with another set of overrides (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if other.network.is_some() {
            self.network = other.network;
        }
        if other.block_interval_secs.is_some() {
            self.block_interval_secs = other.block_interval_secs;
        }
        if other.maturation_blocks.is_some() {
            self.maturation_blocks = other.maturation_blocks;
        }
        if other.wallets_dir.is_some() {
            self.wallets_dir = other.wallets_dir;
        }
        self
    }
}

/// Get the default configuration directory path
///
/// Returns: `~/.wallet-ledger/`
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".wallet-ledger"))
        .ok_or(ConfigError::DirectoryNotFound)
}

/// Get the default configuration file path
///
/// Returns: `~/.wallet-ledger/config.json`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_config_dir()?.join("config.json"))
}

/// Load configuration from file with overrides
///
/// # Priority (highest to lowest):
/// 1. CLI overrides (passed as argument)
/// 2. Environment variables
/// 3. Config file
/// 4. Network defaults
///
/// # Example
///
/// ```ignore
/// use wallet_ledger::config::{load_config, ConfigOverrides, NetworkType};
///
/// let mut cli_overrides = ConfigOverrides::new();
/// cli_overrides.network = Some(NetworkType::Stagenet);
///
/// let config = load_config(None, cli_overrides)?;
/// ```
pub fn load_config(
    config_path: Option<&Path>,
    cli_overrides: ConfigOverrides,
) -> Result<GlobalConfig, ConfigError> {
    load_config_with_env(config_path, ConfigOverrides::from_env(), cli_overrides)
}

/// Load configuration with explicitly supplied environment overrides
///
/// Same precedence as [`load_config`], without reading the process
/// environment.
pub fn load_config_with_env(
    config_path: Option<&Path>,
    env_overrides: ConfigOverrides,
    cli_overrides: ConfigOverrides,
) -> Result<GlobalConfig, ConfigError> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(&path)?;
        serde_json::from_str(&contents)?
    } else {
        let network = cli_overrides
            .network
            .or(env_overrides.network)
            .unwrap_or(NetworkType::Mainnet);
        GlobalConfig::for_network(network)
    };

    apply_overrides(&mut config, env_overrides.merge(cli_overrides));
    config.validate()?;

    log::debug!(
        "Loaded config: network={} block_interval={}s maturation={} blocks",
        config.network,
        config.ledger.block_interval_secs,
        config.ledger.maturation_blocks
    );

    Ok(config)
}

/// Save configuration to file
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &GlobalConfig, config_path: Option<&Path>) -> Result<(), ConfigError> {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;

    Ok(())
}

/// Apply configuration overrides (internal helper)
fn apply_overrides(config: &mut GlobalConfig, overrides: ConfigOverrides) {
    if let Some(network) = overrides.network {
        config.network = network;
    }
    if let Some(secs) = overrides.block_interval_secs {
        config.ledger.block_interval_secs = secs;
    }
    if let Some(blocks) = overrides.maturation_blocks {
        config.ledger.maturation_blocks = blocks;
    }
    if let Some(wallets_dir) = overrides.wallets_dir {
        config.wallets_dir = Some(wallets_dir);
    }
}
