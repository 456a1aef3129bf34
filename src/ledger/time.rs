//! Blockchain time
//!
//! A point on the chain can be expressed as a block height or as a
//! wall-clock instant. Converting between the two needs an [`Anchor`]:
//! a height known to coincide with an instant, plus the average block
//! interval used to extrapolate from it.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Duration, Utc};

/// Target block interval of the network (two minutes)
pub const DEFAULT_BLOCK_INTERVAL_SECS: i64 = 120;

/// Errors raised by cross-domain time arithmetic
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("Cannot compare a block height with an instant without an anchor")]
    MissingAnchor,

    #[error("Invalid block interval: {0}")]
    InvalidBlockInterval(String),
}

/// A point in time measured either in blocks or on the wall clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockchainTime {
    /// Block height
    Height(u64),

    /// Wall-clock instant
    Instant(DateTime<Utc>),
}

/// Distance between two points of blockchain time
///
/// The domain follows the point being measured towards: blocks for a
/// height target, a duration for an instant target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeSpan {
    Blocks(u64),
    Duration(Duration),
}

/// Reference point pairing a block height with the instant it was produced
///
/// Used to estimate the height of an instant and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor {
    height: u64,
    instant: DateTime<Utc>,
    block_interval: Duration,
}

impl BlockchainTime {
    pub fn from_height(height: u64) -> Self {
        BlockchainTime::Height(height)
    }

    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        BlockchainTime::Instant(instant)
    }

    /// Express this time as a block height, estimating through the anchor
    /// when it is an instant
    pub fn to_height(&self, anchor: Option<&Anchor>) -> Result<u64, TimeError> {
        match self {
            BlockchainTime::Height(height) => Ok(*height),
            BlockchainTime::Instant(instant) => anchor
                .map(|anchor| anchor.estimate_height(*instant))
                .ok_or(TimeError::MissingAnchor),
        }
    }

    /// Express this time as an instant, estimating through the anchor when
    /// it is a block height
    pub fn to_instant(&self, anchor: Option<&Anchor>) -> Result<DateTime<Utc>, TimeError> {
        match self {
            BlockchainTime::Instant(instant) => Ok(*instant),
            BlockchainTime::Height(height) => anchor
                .map(|anchor| anchor.estimate_instant(*height))
                .ok_or(TimeError::MissingAnchor),
        }
    }

    /// Order `self` against `other`
    ///
    /// Values of the same kind compare directly and ignore the anchor. For
    /// mixed kinds `other` is converted into the domain of `self` first,
    /// which fails with [`TimeError::MissingAnchor`] when no anchor is given.
    pub fn compare(&self, other: &Self, anchor: Option<&Anchor>) -> Result<Ordering, TimeError> {
        match self {
            BlockchainTime::Height(height) => Ok(height.cmp(&other.to_height(anchor)?)),
            BlockchainTime::Instant(instant) => Ok(instant.cmp(&other.to_instant(anchor)?)),
        }
    }

    /// Distance from `self` forward to `later`, in the domain of `later`
    ///
    /// Zero when `later` is not after `self`.
    pub fn span_until(&self, later: &Self, anchor: Option<&Anchor>) -> Result<TimeSpan, TimeError> {
        match later {
            BlockchainTime::Height(target) => {
                let from = self.to_height(anchor)?;
                Ok(TimeSpan::Blocks(target.saturating_sub(from)))
            }
            BlockchainTime::Instant(target) => {
                let from = self.to_instant(anchor)?;
                Ok(TimeSpan::Duration(
                    target.signed_duration_since(from).max(Duration::zero()),
                ))
            }
        }
    }
}

impl fmt::Display for BlockchainTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockchainTime::Height(height) => write!(f, "block {}", height),
            BlockchainTime::Instant(instant) => write!(f, "{}", instant.to_rfc3339()),
        }
    }
}

impl TimeSpan {
    pub fn is_zero(&self) -> bool {
        match self {
            TimeSpan::Blocks(blocks) => *blocks == 0,
            TimeSpan::Duration(duration) => *duration == Duration::zero(),
        }
    }

    /// Approximate wall-clock length of the span
    pub fn approximate_duration(&self, block_interval: Duration) -> Duration {
        match self {
            TimeSpan::Blocks(blocks) => scale(block_interval, *blocks as i128),
            TimeSpan::Duration(duration) => *duration,
        }
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSpan::Blocks(1) => write!(f, "1 block"),
            TimeSpan::Blocks(blocks) => write!(f, "{} blocks", blocks),
            TimeSpan::Duration(duration) => {
                let secs = duration.num_seconds();
                let days = secs / 86_400;
                let hours = (secs % 86_400) / 3_600;
                let minutes = (secs % 3_600) / 60;
                if days > 0 {
                    write!(f, "{}d {}h", days, hours)
                } else if hours > 0 {
                    write!(f, "{}h {}m", hours, minutes)
                } else if minutes > 0 {
                    write!(f, "{}m", minutes)
                } else {
                    write!(f, "{}s", secs)
                }
            }
        }
    }
}

impl Anchor {
    /// Anchor with the default two-minute block interval
    pub fn at(height: u64, instant: DateTime<Utc>) -> Self {
        Self {
            height,
            instant,
            block_interval: Duration::seconds(DEFAULT_BLOCK_INTERVAL_SECS),
        }
    }

    /// Anchor with an explicit block interval
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidBlockInterval`] unless the interval is
    /// at least one millisecond.
    pub fn new(
        height: u64,
        instant: DateTime<Utc>,
        block_interval: Duration,
    ) -> Result<Self, TimeError> {
        if block_interval.num_milliseconds() <= 0 {
            return Err(TimeError::InvalidBlockInterval(format!(
                "{}ms",
                block_interval.num_milliseconds()
            )));
        }

        Ok(Self {
            height,
            instant,
            block_interval,
        })
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    pub fn block_interval(&self) -> Duration {
        self.block_interval
    }

    /// Estimated production time of the block at `height`
    pub fn estimate_instant(&self, height: u64) -> DateTime<Utc> {
        let blocks = height as i128 - self.height as i128;
        let offset = scale(self.block_interval, blocks);

        self.instant.checked_add_signed(offset).unwrap_or(if blocks < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
    }

    /// Estimated chain height at `instant`
    ///
    /// Partial blocks round towards the past; heights clamp at zero.
    pub fn estimate_height(&self, instant: DateTime<Utc>) -> u64 {
        let elapsed_ms = instant.signed_duration_since(self.instant).num_milliseconds() as i128;
        let interval_ms = self.block_interval.num_milliseconds() as i128;
        let height = self.height as i128 + elapsed_ms.div_euclid(interval_ms);

        height.clamp(0, u64::MAX as i128) as u64
    }

    /// The same anchor moved `blocks` blocks (and the matching time) forward
    pub fn advanced_by(&self, blocks: u64) -> Self {
        let height = self.height.saturating_add(blocks);
        Self {
            height,
            instant: self.estimate_instant(height),
            block_interval: self.block_interval,
        }
    }

    /// Move the anchor to another tip
    ///
    /// A missing height is estimated from the instant and vice versa; with
    /// neither the anchor is returned unchanged.
    pub fn retarget(&self, height: Option<u64>, instant: Option<DateTime<Utc>>) -> Self {
        let (height, instant) = match (height, instant) {
            (None, None) => return *self,
            (Some(height), None) => (height, self.estimate_instant(height)),
            (None, Some(instant)) => (self.estimate_height(instant), instant),
            (Some(height), Some(instant)) => (height, instant),
        };

        Self {
            height,
            instant,
            block_interval: self.block_interval,
        }
    }
}

/// `interval * factor`, saturating at the representable range
fn scale(interval: Duration, factor: i128) -> Duration {
    let max_ms = i64::MAX as i128;
    let ms = (interval.num_milliseconds() as i128)
        .saturating_mul(factor)
        .clamp(-max_ms, max_ms);

    Duration::milliseconds(ms as i64)
}
