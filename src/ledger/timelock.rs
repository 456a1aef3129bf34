//! Time locks
//!
//! A time lock gates when a value becomes spendable. It waits for a block
//! height, a calendar date, or both at once.

use chrono::{DateTime, Utc};

use crate::ledger::time::{Anchor, BlockchainTime, TimeError, TimeSpan};

/// Raw unlock times below this value are block heights, the rest are
/// Unix timestamps in seconds
pub const UNLOCK_TIME_HEIGHT_LIMIT: u64 = 500_000_000;

/// When a value matures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeLock {
    /// No restriction
    #[default]
    Unlocked,

    /// Spendable from this block height on
    ByHeight(u64),

    /// Spendable from this instant on
    ByDate(DateTime<Utc>),

    /// Spendable once both the height and the instant are reached
    ByHeightAndDate { height: u64, date: DateTime<Utc> },
}

/// A value together with the lock that gates it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeLocked<T> {
    pub value: T,
    pub lock: TimeLock,
}

impl TimeLock {
    /// Decode the on-chain unlock time field
    ///
    /// `0` means no lock, values below [`UNLOCK_TIME_HEIGHT_LIMIT`] are
    /// block heights and anything larger is a Unix timestamp.
    pub fn from_unlock_time(raw: u64) -> Self {
        match raw {
            0 => TimeLock::Unlocked,
            height if height < UNLOCK_TIME_HEIGHT_LIMIT => TimeLock::ByHeight(height),
            timestamp => TimeLock::ByDate(
                i64::try_from(timestamp)
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .unwrap_or(DateTime::<Utc>::MAX_UTC),
            ),
        }
    }

    fn from_parts(height: Option<u64>, date: Option<DateTime<Utc>>) -> Self {
        match (height, date) {
            (None, None) => TimeLock::Unlocked,
            (Some(height), None) => TimeLock::ByHeight(height),
            (None, Some(date)) => TimeLock::ByDate(date),
            (Some(height), Some(date)) => TimeLock::ByHeightAndDate { height, date },
        }
    }

    /// Height the lock waits for, if any
    pub fn height_threshold(&self) -> Option<u64> {
        match self {
            TimeLock::ByHeight(height) | TimeLock::ByHeightAndDate { height, .. } => Some(*height),
            TimeLock::Unlocked | TimeLock::ByDate(_) => None,
        }
    }

    /// Instant the lock waits for, if any
    pub fn date_threshold(&self) -> Option<DateTime<Utc>> {
        match self {
            TimeLock::ByDate(date) | TimeLock::ByHeightAndDate { date, .. } => Some(*date),
            TimeLock::Unlocked | TimeLock::ByHeight(_) => None,
        }
    }

    /// Whether the lock is open at `now`
    ///
    /// A lock maturing exactly at `now` counts as open. When `now` is in a
    /// different domain than a threshold, the anchor is required to
    /// convert it.
    pub fn is_unlocked(&self, now: &BlockchainTime, anchor: Option<&Anchor>) -> Result<bool, TimeError> {
        let height_open = match self.height_threshold() {
            None => true,
            Some(height) => BlockchainTime::Height(height).compare(now, anchor)?.is_le(),
        };
        let date_open = match self.date_threshold() {
            None => true,
            Some(date) => BlockchainTime::Instant(date).compare(now, anchor)?.is_le(),
        };
        Ok(height_open && date_open)
    }

    pub fn is_locked(&self, now: &BlockchainTime, anchor: Option<&Anchor>) -> Result<bool, TimeError> {
        self.is_unlocked(now, anchor).map(|unlocked| !unlocked)
    }

    /// Remaining wait until the lock opens, in the domain of the threshold
    /// that opens last
    ///
    /// Zero once the lock is open.
    pub fn time_until_unlock(
        &self,
        now: &BlockchainTime,
        anchor: Option<&Anchor>,
    ) -> Result<TimeSpan, TimeError> {
        let by_height = self
            .height_threshold()
            .map(|height| now.span_until(&BlockchainTime::Height(height), anchor))
            .transpose()?;
        let by_date = self
            .date_threshold()
            .map(|date| now.span_until(&BlockchainTime::Instant(date), anchor))
            .transpose()?;

        match (by_height, by_date) {
            (Some(blocks), Some(duration)) => {
                let anchor = anchor.ok_or(TimeError::MissingAnchor)?;
                Ok(longer(blocks, duration, anchor.block_interval()))
            }
            (Some(span), None) | (None, Some(span)) => Ok(span),
            (None, None) => Ok(TimeSpan::Blocks(0)),
        }
    }

    /// Whether the lock is open at the anchor's tip
    ///
    /// An anchor carries both a height and an instant, so no conversion
    /// is involved and this cannot fail.
    pub fn is_unlocked_at(&self, tip: &Anchor) -> bool {
        self.height_threshold().map_or(true, |height| tip.height() >= height)
            && self.date_threshold().map_or(true, |date| tip.instant() >= date)
    }

    pub fn is_locked_at(&self, tip: &Anchor) -> bool {
        !self.is_unlocked_at(tip)
    }

    /// Remaining wait at the anchor's tip
    ///
    /// A lock on both height and date reports whichever wait is longer,
    /// converting blocks at the anchor's block interval to compare them.
    pub fn time_until_unlock_at(&self, tip: &Anchor) -> TimeSpan {
        let by_height = self
            .height_threshold()
            .map(|height| TimeSpan::Blocks(height.saturating_sub(tip.height())));
        let by_date = self.date_threshold().map(|date| {
            TimeSpan::Duration(
                date.signed_duration_since(tip.instant())
                    .max(chrono::Duration::zero()),
            )
        });

        match (by_height, by_date) {
            (Some(blocks), Some(duration)) => longer(blocks, duration, tip.block_interval()),
            (Some(span), None) | (None, Some(span)) => span,
            (None, None) => TimeSpan::Blocks(0),
        }
    }

    /// Lock that opens only once both `self` and `other` are open
    ///
    /// Thresholds of the same domain collapse to the later one; a height
    /// and a date are both kept.
    pub fn max_of(self, other: TimeLock) -> TimeLock {
        let height = match (self.height_threshold(), other.height_threshold()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let date = match (self.date_threshold(), other.date_threshold()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        TimeLock::from_parts(height, date)
    }
}

/// The longer of two waits, an open one never winning over a closed one
fn longer(a: TimeSpan, b: TimeSpan, block_interval: chrono::Duration) -> TimeSpan {
    if a.is_zero() {
        b
    } else if b.is_zero() {
        a
    } else if a.approximate_duration(block_interval) >= b.approximate_duration(block_interval) {
        a
    } else {
        b
    }
}

impl<T> TimeLocked<T> {
    pub fn new(value: T, lock: TimeLock) -> Self {
        Self { value, lock }
    }

    /// Wrap a value that is not subject to any lock
    pub fn unlocked(value: T) -> Self {
        Self::new(value, TimeLock::Unlocked)
    }

    pub fn is_unlocked(&self, now: &BlockchainTime, anchor: Option<&Anchor>) -> Result<bool, TimeError> {
        self.lock.is_unlocked(now, anchor)
    }

    pub fn is_locked(&self, now: &BlockchainTime, anchor: Option<&Anchor>) -> Result<bool, TimeError> {
        self.lock.is_locked(now, anchor)
    }

    pub fn time_until_unlock(
        &self,
        now: &BlockchainTime,
        anchor: Option<&Anchor>,
    ) -> Result<TimeSpan, TimeError> {
        self.lock.time_until_unlock(now, anchor)
    }

    pub fn is_unlocked_at(&self, tip: &Anchor) -> bool {
        self.lock.is_unlocked_at(tip)
    }

    pub fn time_until_unlock_at(&self, tip: &Anchor) -> TimeSpan {
        self.lock.time_until_unlock_at(tip)
    }

    /// Same lock, different value
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TimeLocked<U> {
        TimeLocked {
            value: f(self.value),
            lock: self.lock,
        }
    }
}
