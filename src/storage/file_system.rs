//! File system operations for wallet snapshots
//!
//! Manages the wallets directory layout, saving and loading output
//! snapshots, and the opener the wallet handle cache uses to load them.

use std::fs;
use std::future::Future;
use std::path::PathBuf;

use crate::cache::WalletOpener;
use crate::config::{GlobalConfig, NetworkType};
use crate::ledger::{OutputError, TimeError};
use crate::storage::models::{LoadedWallet, OutputSnapshot, WalletInfo};

/// Snapshot file name inside a wallet directory
pub const SNAPSHOT_FILE: &str = "outputs.json";

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("Time error: {0}")]
    Time(#[from] TimeError),

    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    #[error("Wallet belongs to {found}, expected {expected}")]
    NetworkMismatch {
        expected: NetworkType,
        found: NetworkType,
    },

    #[error("Wallets directory not found")]
    WalletsDirectoryNotFound,

    #[error("Loader task failed: {0}")]
    Task(String),
}

/// Get the default wallets directory path
///
/// Returns: `~/.wallet-ledger/wallets/`
pub fn default_wallets_dir() -> Result<PathBuf, StorageError> {
    let config_dir = crate::config::default_config_dir()
        .map_err(|_| StorageError::WalletsDirectoryNotFound)?;
    Ok(config_dir.join("wallets"))
}

/// Get the wallets directory (custom or default)
pub fn wallets_dir(custom_dir: Option<&str>) -> Result<PathBuf, StorageError> {
    match custom_dir {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => default_wallets_dir(),
    }
}

/// Get the directory path for a specific wallet
///
/// Returns: `<base>/<wallet_name>/` or `~/.wallet-ledger/wallets/<wallet_name>/`
pub fn wallet_dir(wallet_name: &str, custom_base: Option<&str>) -> Result<PathBuf, StorageError> {
    Ok(wallets_dir(custom_base)?.join(wallet_name))
}

/// Check if a wallet directory with a snapshot exists
pub fn wallet_exists(wallet_name: &str, custom_base: Option<&str>) -> bool {
    wallet_dir(wallet_name, custom_base)
        .map(|path| path.join(SNAPSHOT_FILE).exists())
        .unwrap_or(false)
}

/// Save an output snapshot, creating the wallet directory if needed
///
/// # Example
///
/// ```ignore
/// let snapshot = OutputSnapshot::new(1005, Utc::now(), records);
/// save_snapshot("my_wallet", &snapshot, None)?;
/// ```
pub fn save_snapshot(
    wallet_name: &str,
    snapshot: &OutputSnapshot,
    custom_base: Option<&str>,
) -> Result<PathBuf, StorageError> {
    let wallet_path = wallet_dir(wallet_name, custom_base)?;
    fs::create_dir_all(&wallet_path)?;

    let snapshot_path = wallet_path.join(SNAPSHOT_FILE);
    fs::write(&snapshot_path, serde_json::to_string_pretty(snapshot)?)?;

    Ok(snapshot_path)
}

/// Load a wallet's output snapshot
///
/// # Errors
///
/// Returns error if:
/// - Wallet directory or snapshot not found
/// - Snapshot is not valid JSON
pub fn load_snapshot(
    wallet_name: &str,
    custom_base: Option<&str>,
) -> Result<OutputSnapshot, StorageError> {
    let snapshot_path = wallet_dir(wallet_name, custom_base)?.join(SNAPSHOT_FILE);

    if !snapshot_path.exists() {
        return Err(StorageError::WalletNotFound(wallet_name.to_string()));
    }

    let json = fs::read_to_string(&snapshot_path)?;
    Ok(serde_json::from_str(&json)?)
}

/// List all wallets
///
/// Returns one entry per directory holding a readable snapshot, sorted by
/// name. Unreadable snapshots are logged and skipped.
pub fn list_wallets(custom_base: Option<&str>) -> Result<Vec<WalletInfo>, StorageError> {
    let wallets_path = wallets_dir(custom_base)?;

    if !wallets_path.exists() {
        return Ok(Vec::new());
    }

    let mut wallets = Vec::new();

    for entry in fs::read_dir(&wallets_path)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        let snapshot_path = path.join(SNAPSHOT_FILE);
        if !snapshot_path.exists() {
            continue;
        }

        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        match fs::read_to_string(&snapshot_path)
            .map_err(StorageError::from)
            .and_then(|json| serde_json::from_str::<OutputSnapshot>(&json).map_err(Into::into))
        {
            Ok(snapshot) => wallets.push(WalletInfo::from_snapshot(name, path, &snapshot)),
            Err(e) => log::warn!("Failed to read snapshot at {:?}: {}", snapshot_path, e),
        }
    }

    wallets.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(wallets)
}

/// Load and validate a wallet in one step
pub fn load_wallet(wallet_name: &str, config: &GlobalConfig) -> Result<LoadedWallet, StorageError> {
    let snapshot = load_snapshot(wallet_name, config.wallets_dir.as_deref())?;
    LoadedWallet::from_snapshot(wallet_name, &snapshot, config)
}

/// Opens wallets by name from their snapshot on disk
///
/// File access runs on tokio's blocking pool.
#[derive(Debug, Clone)]
pub struct SnapshotOpener {
    config: GlobalConfig,
}

impl SnapshotOpener {
    pub fn new(config: GlobalConfig) -> Self {
        Self { config }
    }
}

impl WalletOpener<String> for SnapshotOpener {
    type Handle = LoadedWallet;
    type Error = StorageError;

    fn open(
        &self,
        key: &String,
    ) -> impl Future<Output = Result<LoadedWallet, StorageError>> + Send + 'static {
        let name = key.clone();
        let config = self.config.clone();

        async move {
            tokio::task::spawn_blocking(move || load_wallet(&name, &config))
                .await
                .map_err(|e| StorageError::Task(e.to_string()))?
        }
    }
}
