//! Owned outputs
//!
//! Records of fund units controlled by the wallet, as reported by the
//! native wallet engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::timelock::{TimeLock, TimeLocked};

/// Confirmations an output needs before it may be spent
pub const DEFAULT_MATURATION_BLOCKS: u64 = 10;

/// Errors raised while constructing an owned output
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutputError {
    #[error("Invalid output: {0}")]
    InvalidOutput(String),
}

/// Identity key of an owned output
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(Vec<u8>);

/// Transaction output that belongs to the wallet
///
/// Immutable once constructed. Two outputs denote the same fund unit iff
/// their identifiers match. There is no `PartialEq`: use
/// [`OwnedOutput::same_output`] for identity and [`OwnedOutput::fields_eq`]
/// to compare every field.
#[derive(Debug, Clone)]
pub struct OwnedOutput {
    id: OutputId,
    amount: u64,
    block_height: u64,
    spent_height: u64,
}

/// Output record as delivered across the native engine boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedOutputRecord {
    /// Transaction id (hex-encoded)
    pub tx_id: String,

    /// Amount in atomic units
    pub amount: i64,

    /// Height of the block the output was discovered in
    pub block_height: i64,

    /// Height of the block that spent the output (0 if unspent)
    #[serde(default)]
    pub spent_height: i64,

    /// Raw unlock time declared by the transaction (0 if none)
    #[serde(default)]
    pub unlock_time: u64,
}

impl OutputId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<&[u8]> for OutputId {
    fn from(bytes: &[u8]) -> Self {
        OutputId(bytes.to_vec())
    }
}

impl OwnedOutput {
    /// Create an owned output
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::InvalidOutput`] if:
    /// - the identifier is empty
    /// - the amount is zero
    /// - the output is spent (`spent_height != 0`) at or before the block it
    ///   was discovered in
    pub fn new(
        id: impl Into<Vec<u8>>,
        amount: u64,
        block_height: u64,
        spent_height: u64,
    ) -> Result<Self, OutputError> {
        let id = id.into();

        if id.is_empty() {
            return Err(OutputError::InvalidOutput("empty identifier".to_string()));
        }
        if amount == 0 {
            return Err(OutputError::InvalidOutput(format!(
                "zero amount for output {}",
                hex::encode(&id)
            )));
        }
        if spent_height != 0 && spent_height <= block_height {
            return Err(OutputError::InvalidOutput(format!(
                "output {} spent at height {} but discovered at height {}",
                hex::encode(&id),
                spent_height,
                block_height
            )));
        }

        Ok(Self {
            id: OutputId(id),
            amount,
            block_height,
            spent_height,
        })
    }

    pub fn id(&self) -> &OutputId {
        &self.id
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Height of the block the output was discovered in
    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    /// Height of the spending block, 0 while unspent
    pub fn spent_height(&self) -> u64 {
        self.spent_height
    }

    pub fn is_spent(&self) -> bool {
        self.spent_height != 0
    }

    /// Whether the output had been discovered by `height`
    pub fn is_received_by(&self, height: u64) -> bool {
        self.block_height <= height
    }

    /// Blocks elapsed since discovery at `current_height`
    ///
    /// An output with age 0 was received in the most recent block and has
    /// no confirmations yet. Outputs discovered above `current_height`
    /// also report age 0; check [`OwnedOutput::is_received_by`] first.
    pub fn age(&self, current_height: u64) -> u64 {
        current_height.saturating_sub(self.block_height)
    }

    /// Identity comparison: true iff both records denote the same output,
    /// whatever their other fields say
    pub fn same_output(&self, other: &OwnedOutput) -> bool {
        self.id == other.id
    }

    /// Full comparison of every field
    pub fn fields_eq(&self, other: &OwnedOutput) -> bool {
        self.id == other.id
            && self.amount == other.amount
            && self.block_height == other.block_height
            && self.spent_height == other.spent_height
    }

    /// Lock implied by the confirmation window after discovery
    pub fn maturation_lock(&self, window: u64) -> TimeLock {
        TimeLock::ByHeight(self.block_height.saturating_add(window))
    }

    /// Pair the output with its effective lock: open once both the
    /// declared lock and the maturation window are
    pub fn time_locked(self, declared: TimeLock, window: u64) -> TimeLocked<Self> {
        let lock = declared.max_of(self.maturation_lock(window));
        TimeLocked::new(self, lock)
    }
}

impl OwnedOutputRecord {
    /// Lock declared by the transaction's unlock time
    pub fn declared_lock(&self) -> TimeLock {
        TimeLock::from_unlock_time(self.unlock_time)
    }
}

impl TryFrom<&OwnedOutputRecord> for OwnedOutput {
    type Error = OutputError;

    fn try_from(record: &OwnedOutputRecord) -> Result<Self, Self::Error> {
        let id = hex::decode(&record.tx_id).map_err(|e| {
            OutputError::InvalidOutput(format!("bad tx id '{}': {}", record.tx_id, e))
        })?;

        let amount = non_negative(record.amount, "amount", &record.tx_id)?;
        let block_height = non_negative(record.block_height, "block height", &record.tx_id)?;
        let spent_height = non_negative(record.spent_height, "spent height", &record.tx_id)?;

        OwnedOutput::new(id, amount, block_height, spent_height)
    }
}

impl TryFrom<OwnedOutputRecord> for OwnedOutput {
    type Error = OutputError;

    fn try_from(record: OwnedOutputRecord) -> Result<Self, Self::Error> {
        OwnedOutput::try_from(&record)
    }
}

impl From<&OwnedOutput> for OwnedOutputRecord {
    fn from(output: &OwnedOutput) -> Self {
        Self {
            tx_id: output.id.to_hex(),
            amount: i64::try_from(output.amount).unwrap_or(i64::MAX),
            block_height: i64::try_from(output.block_height).unwrap_or(i64::MAX),
            spent_height: i64::try_from(output.spent_height).unwrap_or(i64::MAX),
            unlock_time: 0,
        }
    }
}

fn non_negative(value: i64, field: &str, tx_id: &str) -> Result<u64, OutputError> {
    u64::try_from(value).map_err(|_| {
        OutputError::InvalidOutput(format!("negative {} {} for output {}", field, value, tx_id))
    })
}
