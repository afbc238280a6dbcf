//! Construction-time configuration.

use serde::{Deserialize, Serialize};

use crate::arena::NULL_INDEX;
use crate::command::Tick;
use crate::error::{BookError, BookResult};

/// Lowest addressable tick by default ($0.01).
pub const DEFAULT_MIN_PRICE: Tick = 1;
/// Highest addressable tick by default ($2000.00).
pub const DEFAULT_MAX_PRICE: Tick = 200_000;
/// Maximum simultaneously resting orders by default.
pub const DEFAULT_CAPACITY: u32 = 1_000_000;
/// Dead entries a level may accumulate before it is compacted.
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 64;
/// Widest tick range a ladder may span (per side). Both sides are
/// allocated up front, so this bounds the ladder at a few hundred MiB.
pub const MAX_TICK_RANGE: usize = 1 << 22;

/// Fixed bounds of one book instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Lowest addressable tick (inclusive)
    pub min_price: Tick,
    /// Highest addressable tick (inclusive)
    pub max_price: Tick,
    /// Arena capacity
    pub capacity: u32,
    /// See [`PriceLevel::pop_front`](crate::price_level::PriceLevel::pop_front)
    pub compaction_threshold: usize,
}

impl BookConfig {
    /// Config with the default tick range and the given capacity.
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Config with an explicit tick range.
    pub fn with_range(min_price: Tick, max_price: Tick, capacity: u32) -> Self {
        Self {
            min_price,
            max_price,
            capacity,
            ..Self::default()
        }
    }

    /// Number of ticks on each side of the ladder.
    #[inline]
    pub fn range(&self) -> usize {
        (self.max_price as i64 - self.min_price as i64 + 1) as usize
    }

    /// True if `tick` is addressable.
    #[inline]
    pub fn contains(&self, tick: Tick) -> bool {
        tick >= self.min_price && tick <= self.max_price
    }

    /// Reported as the best bid when no bids rest.
    #[inline]
    pub fn bid_sentinel(&self) -> Tick {
        self.min_price - 1
    }

    /// Reported as the best ask when no asks rest.
    #[inline]
    pub fn ask_sentinel(&self) -> Tick {
        self.max_price + 1
    }

    pub fn validate(&self) -> BookResult<()> {
        if self.min_price > self.max_price {
            return Err(BookError::InvalidConfig(format!(
                "min_price {} exceeds max_price {}",
                self.min_price, self.max_price
            )));
        }
        // Both sentinels must sit outside the range without overflowing.
        if self.min_price == Tick::MIN || self.max_price == Tick::MAX {
            return Err(BookError::InvalidConfig(
                "tick range must leave room for the empty-side sentinels".into(),
            ));
        }
        if self.range() > MAX_TICK_RANGE {
            return Err(BookError::InvalidConfig(format!(
                "tick range spans {} ticks, at most {} allowed",
                self.range(),
                MAX_TICK_RANGE
            )));
        }
        if self.capacity == 0 || self.capacity >= NULL_INDEX {
            return Err(BookError::InvalidConfig(format!(
                "capacity must be in 1..{}, got {}",
                NULL_INDEX, self.capacity
            )));
        }
        Ok(())
    }
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            min_price: DEFAULT_MIN_PRICE,
            max_price: DEFAULT_MAX_PRICE,
            capacity: DEFAULT_CAPACITY,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
        }
    }
}
