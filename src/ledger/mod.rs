//! Balance and time-lock accounting
//!
//! Owned outputs, the locks that gate them, and the balance calculated
//! from both at an explicit chain tip.

pub mod balance;
pub mod output;
pub mod time;
pub mod timelock;

pub use balance::{
    calculate_balance, is_spendable, locked_amounts_at, output_status, partition_pending,
    spendable_outputs, unlocked_amount_at, Balance,
};
pub use output::{OutputError, OutputId, OwnedOutput, OwnedOutputRecord, DEFAULT_MATURATION_BLOCKS};
pub use time::{Anchor, BlockchainTime, TimeError, TimeSpan, DEFAULT_BLOCK_INTERVAL_SECS};
pub use timelock::{TimeLock, TimeLocked, UNLOCK_TIME_HEIGHT_LIMIT};
