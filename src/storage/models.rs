//! Storage data models
//!
//! The output snapshot a wallet directory holds, and the in-memory wallet
//! handle built from it.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{GlobalConfig, NetworkType};
use crate::ledger::{
    calculate_balance, spendable_outputs, Anchor, Balance, OwnedOutput, OwnedOutputRecord,
    TimeError, TimeLocked,
};
use crate::storage::file_system::StorageError;

/// Owned outputs exported by the native wallet engine at a chain tip
///
/// Stored as `outputs.json` in the wallet directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSnapshot {
    /// Network the outputs belong to (unchecked when absent)
    #[serde(default)]
    pub network: Option<NetworkType>,

    /// Chain height at export
    pub height: u64,

    /// Time of the block at `height`
    pub timestamp: DateTime<Utc>,

    /// Owned outputs, spent ones included
    pub outputs: Vec<OwnedOutputRecord>,
}

/// Wallet summary for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletInfo {
    pub name: String,
    pub path: PathBuf,
    pub network: Option<NetworkType>,
    pub height: u64,
    pub output_count: usize,
}

/// A wallet opened from its snapshot
///
/// Outputs carry their effective lock: the later of the declared unlock
/// time and the maturation window.
#[derive(Debug, Clone)]
pub struct LoadedWallet {
    pub name: String,
    pub tip: Anchor,
    pub outputs: Vec<TimeLocked<OwnedOutput>>,
}

impl OutputSnapshot {
    pub fn new(height: u64, timestamp: DateTime<Utc>, outputs: Vec<OwnedOutputRecord>) -> Self {
        Self {
            network: None,
            height,
            timestamp,
            outputs,
        }
    }

    /// Anchor at the snapshot's tip
    pub fn anchor(&self, block_interval: chrono::Duration) -> Result<Anchor, TimeError> {
        Anchor::new(self.height, self.timestamp, block_interval)
    }
}

impl WalletInfo {
    pub fn from_snapshot(name: String, path: PathBuf, snapshot: &OutputSnapshot) -> Self {
        Self {
            name,
            path,
            network: snapshot.network,
            height: snapshot.height,
            output_count: snapshot.outputs.len(),
        }
    }
}

impl LoadedWallet {
    /// Validate a snapshot's records and attach their effective locks
    ///
    /// Records repeating an already seen output identifier are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot belongs to another network, the
    /// configured block interval is unusable or any record is invalid.
    pub fn from_snapshot(
        name: &str,
        snapshot: &OutputSnapshot,
        config: &GlobalConfig,
    ) -> Result<Self, StorageError> {
        if let Some(network) = snapshot.network {
            if network != config.network {
                return Err(StorageError::NetworkMismatch {
                    expected: config.network,
                    found: network,
                });
            }
        }

        let tip = snapshot.anchor(config.block_interval())?;
        let mut seen = HashSet::new();
        let mut outputs = Vec::with_capacity(snapshot.outputs.len());

        for record in &snapshot.outputs {
            let output = OwnedOutput::try_from(record)?;
            if !seen.insert(output.id().clone()) {
                log::warn!("Skipping duplicate output {} in wallet '{}'", output.id(), name);
                continue;
            }
            let declared = record.declared_lock();
            outputs.push(output.time_locked(declared, config.ledger.maturation_blocks));
        }

        log::debug!(
            "Loaded wallet '{}': {} output(s) at height {}",
            name,
            outputs.len(),
            tip.height()
        );

        Ok(Self {
            name: name.to_string(),
            tip,
            outputs,
        })
    }

    /// Balance at the snapshot's tip
    pub fn balance(&self) -> Balance {
        self.balance_at(&self.tip)
    }

    /// Balance at an arbitrary tip
    pub fn balance_at(&self, tip: &Anchor) -> Balance {
        calculate_balance(&self.outputs, tip)
    }

    /// Outputs spendable at `tip`
    pub fn spendable_at<'a>(
        &'a self,
        tip: &'a Anchor,
    ) -> impl Iterator<Item = &'a TimeLocked<OwnedOutput>> + 'a {
        spendable_outputs(&self.outputs, tip)
    }
}
