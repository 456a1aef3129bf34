//! Balance calculation
//!
//! Turns a set of time-locked owned outputs into a [`Balance`] snapshot at
//! an explicit chain tip. Nothing here reads the clock: the same outputs
//! and the same anchor always produce the same balance.

use std::collections::HashMap;
use std::fmt;

use crate::ledger::output::OwnedOutput;
use crate::ledger::time::{Anchor, TimeSpan};
use crate::ledger::timelock::TimeLocked;
use crate::types::{format_amount, OutputStatus};

/// Wallet balance at a given chain tip (atomic units)
///
/// Sums cap at `u64::MAX`; hitting the cap is logged as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Balance {
    /// Outputs received in the most recent block
    pub pending_amount: u64,

    /// Outputs whose lock has matured
    pub confirmed_amount: u64,

    /// Confirmed plus pending; locked funds are not included
    pub total_amount: u64,

    /// Locked funds grouped by remaining wait
    pub locked_amounts: HashMap<TimeSpan, u64>,
}

impl Balance {
    /// Create a balance, deriving the total
    pub fn new(
        pending_amount: u64,
        confirmed_amount: u64,
        locked_amounts: HashMap<TimeSpan, u64>,
    ) -> Self {
        Self {
            pending_amount,
            confirmed_amount,
            total_amount: add_amount(confirmed_amount, pending_amount),
            locked_amounts,
        }
    }

    /// Check if the wallet holds nothing, locked funds included
    pub fn is_empty(&self) -> bool {
        self.total_amount == 0 && self.locked_amounts.is_empty()
    }

    /// Sum of all locked amounts
    pub fn locked_total(&self) -> u64 {
        self.locked_amounts
            .values()
            .fold(0u64, |sum, amount| add_amount(sum, *amount))
    }

    /// Locked amounts ordered from the soonest to the latest unlock
    pub fn locked_schedule(&self) -> Vec<(TimeSpan, u64)> {
        let mut schedule: Vec<(TimeSpan, u64)> = self
            .locked_amounts
            .iter()
            .map(|(span, amount)| (*span, *amount))
            .collect();
        schedule.sort();
        schedule
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "confirmed -- {}", format_amount(self.confirmed_amount))?;
        writeln!(f, "pending   -- {}", format_amount(self.pending_amount))?;
        writeln!(f, "total     -- {}", format_amount(self.total_amount))?;
        for (span, amount) in self.locked_schedule() {
            writeln!(f, "locked    -- {} (unlocks in {})", format_amount(amount), span)?;
        }
        Ok(())
    }
}

/// Status of one output at `tip`
///
/// Spent outputs are [`OutputStatus::Spent`] and outputs discovered above
/// the tip are [`OutputStatus::Unreceived`]. An unspent output of age 0 is
/// [`OutputStatus::Pending`] whatever its lock says; otherwise the lock
/// decides between [`OutputStatus::Unlocked`] and [`OutputStatus::Locked`].
pub fn output_status(output: &TimeLocked<OwnedOutput>, tip: &Anchor) -> OutputStatus {
    if output.value.is_spent() {
        OutputStatus::Spent
    } else if !output.value.is_received_by(tip.height()) {
        OutputStatus::Unreceived
    } else if output.value.age(tip.height()) == 0 {
        OutputStatus::Pending
    } else if output.is_unlocked_at(tip) {
        OutputStatus::Unlocked
    } else {
        OutputStatus::Locked
    }
}

/// Whether an output can be spent at `tip`
pub fn is_spendable(output: &TimeLocked<OwnedOutput>, tip: &Anchor) -> bool {
    output_status(output, tip) == OutputStatus::Unlocked
}

/// Outputs that can be spent at `tip`
pub fn spendable_outputs<'a, I>(
    outputs: I,
    tip: &'a Anchor,
) -> impl Iterator<Item = &'a TimeLocked<OwnedOutput>> + 'a
where
    I: IntoIterator<Item = &'a TimeLocked<OwnedOutput>>,
    I::IntoIter: 'a,
{
    outputs
        .into_iter()
        .filter(move |output| is_spendable(output, tip))
}

/// Split unspent outputs into the pending amount and the time-locked
/// amounts of everything older
///
/// Spent outputs and outputs discovered above `current_height` are
/// dropped. The result does not depend on any time other than
/// `current_height`.
pub fn partition_pending<'a, I>(outputs: I, current_height: u64) -> (u64, Vec<TimeLocked<u64>>)
where
    I: IntoIterator<Item = &'a TimeLocked<OwnedOutput>>,
{
    let mut pending_amount = 0u64;
    let mut aged = Vec::new();

    let held = outputs
        .into_iter()
        .filter(|o| !o.value.is_spent() && o.value.is_received_by(current_height));

    for output in held {
        if output.value.age(current_height) == 0 {
            pending_amount = add_amount(pending_amount, output.value.amount());
        } else {
            aged.push(TimeLocked::new(output.value.amount(), output.lock));
        }
    }

    (pending_amount, aged)
}

/// Sum of the amounts whose lock is open at `tip`
pub fn unlocked_amount_at(amounts: &[TimeLocked<u64>], tip: &Anchor) -> u64 {
    amounts
        .iter()
        .filter(|amount| amount.is_unlocked_at(tip))
        .fold(0u64, |sum, amount| add_amount(sum, amount.value))
}

/// Amounts still locked at `tip`, summed per remaining wait
pub fn locked_amounts_at(amounts: &[TimeLocked<u64>], tip: &Anchor) -> HashMap<TimeSpan, u64> {
    let mut locked: HashMap<TimeSpan, u64> = HashMap::new();

    for amount in amounts.iter().filter(|amount| amount.lock.is_locked_at(tip)) {
        let entry = locked.entry(amount.time_until_unlock_at(tip)).or_insert(0);
        *entry = add_amount(*entry, amount.value);
    }

    locked
}

/// Calculate the wallet balance at `tip`
///
/// # Process
///
/// 1. Spent outputs and outputs discovered above `tip` are discarded
/// 2. Outputs of age 0 count as pending, even if their lock is closed
/// 3. Older outputs count as confirmed when their lock is open at `tip`,
///    otherwise as locked under their remaining wait
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use wallet_ledger::ledger::{calculate_balance, Anchor, OwnedOutput, TimeLock, TimeLocked, TimeSpan};
///
/// let output = OwnedOutput::new(vec![0xaa], 100, 1000, 0).unwrap();
/// let outputs = vec![TimeLocked::new(output, TimeLock::ByHeight(1010))];
/// let tip = Anchor::at(1005, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
///
/// let balance = calculate_balance(&outputs, &tip);
/// assert_eq!(balance.confirmed_amount, 0);
/// assert_eq!(balance.locked_amounts.get(&TimeSpan::Blocks(5)), Some(&100));
/// ```
pub fn calculate_balance<'a, I>(outputs: I, tip: &Anchor) -> Balance
where
    I: IntoIterator<Item = &'a TimeLocked<OwnedOutput>>,
{
    let (pending_amount, aged) = partition_pending(outputs, tip.height());

    let balance = Balance::new(
        pending_amount,
        unlocked_amount_at(&aged, tip),
        locked_amounts_at(&aged, tip),
    );

    log::debug!(
        "Balance at height {}: confirmed={} pending={} locked={} in {} group(s)",
        tip.height(),
        balance.confirmed_amount,
        balance.pending_amount,
        balance.locked_total(),
        balance.locked_amounts.len()
    );

    balance
}

/// `sum + amount`, capped at `u64::MAX`
fn add_amount(sum: u64, amount: u64) -> u64 {
    sum.checked_add(amount).unwrap_or_else(|| {
        log::warn!("Amount overflow adding {} to {}, capping at u64::MAX", amount, sum);
        u64::MAX
    })
}
