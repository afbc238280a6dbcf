//! Price Ladder - one price level per tick, per side.
//!
//! Tick `t` lives at index `t - min_price` on both sides. The arrays are
//! sized once at construction, so lookups never hash or walk a tree.

use crate::command::{Side, Tick};
use crate::error::{BookError, BookResult};
use crate::price_level::PriceLevel;

pub struct PriceLadder {
    bids: Box<[PriceLevel]>,
    asks: Box<[PriceLevel]>,
    min_price: Tick,
    max_price: Tick,
}

impl PriceLadder {
    /// Allocate both sides for `[min_price, max_price]`.
    pub fn new(min_price: Tick, max_price: Tick) -> Self {
        debug_assert!(min_price <= max_price);
        let range = (max_price as i64 - min_price as i64 + 1) as usize;
        Self {
            bids: vec![PriceLevel::new(); range].into_boxed_slice(),
            asks: vec![PriceLevel::new(); range].into_boxed_slice(),
            min_price,
            max_price,
        }
    }

    #[inline]
    pub fn min_price(&self) -> Tick {
        self.min_price
    }

    #[inline]
    pub fn max_price(&self) -> Tick {
        self.max_price
    }

    /// Number of ticks per side
    #[inline]
    pub fn range(&self) -> usize {
        self.bids.len()
    }

    /// Array index for `tick`, or `None` if it is off the ladder.
    #[inline]
    pub fn index(&self, tick: Tick) -> Option<usize> {
        if tick < self.min_price || tick > self.max_price {
            None
        } else {
            Some((tick as i64 - self.min_price as i64) as usize)
        }
    }

    /// Like [`index`](Self::index), but reports `OutOfRange`.
    #[inline]
    pub fn check(&self, tick: Tick) -> BookResult<usize> {
        self.index(tick).ok_or(BookError::OutOfRange {
            tick,
            min: self.min_price,
            max: self.max_price,
        })
    }

    #[inline]
    pub fn level(&self, side: Side, tick: Tick) -> Option<&PriceLevel> {
        let idx = self.index(tick)?;
        Some(match side {
            Side::Bid => &self.bids[idx],
            Side::Ask => &self.asks[idx],
        })
    }

    #[inline]
    pub fn level_mut(&mut self, side: Side, tick: Tick) -> Option<&mut PriceLevel> {
        let idx = self.index(tick)?;
        Some(match side {
            Side::Bid => &mut self.bids[idx],
            Side::Ask => &mut self.asks[idx],
        })
    }
}

impl std::fmt::Debug for PriceLadder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceLadder")
            .field("min_price", &self.min_price)
            .field("max_price", &self.max_price)
            .field("range", &self.range())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;

    #[test]
    fn test_index_mapping() {
        let ladder = PriceLadder::new(100, 199);
        assert_eq!(ladder.range(), 100);
        assert_eq!(ladder.index(100), Some(0));
        assert_eq!(ladder.index(199), Some(99));
        assert_eq!(ladder.index(99), None);
        assert_eq!(ladder.index(200), None);
    }

    #[test]
    fn test_check_reports_range() {
        let ladder = PriceLadder::new(1, 10);
        assert_eq!(ladder.check(5), Ok(4));
        assert_eq!(
            ladder.check(11),
            Err(BookError::OutOfRange { tick: 11, min: 1, max: 10 })
        );
    }

    #[test]
    fn test_sides_are_independent() {
        let mut arena = Arena::new(4);
        let mut ladder = PriceLadder::new(1, 10);
        let h = arena.acquire(5, 3).unwrap();

        ladder.level_mut(Side::Bid, 3).unwrap().push_back(h);

        assert_eq!(ladder.level(Side::Bid, 3).unwrap().len(), 1);
        assert!(ladder.level(Side::Ask, 3).unwrap().is_empty());
        assert!(ladder.level(Side::Bid, 4).unwrap().is_empty());
        assert!(ladder.level(Side::Bid, 11).is_none());
    }

    #[test]
    fn test_negative_ticks() {
        let ladder = PriceLadder::new(-5, 5);
        assert_eq!(ladder.index(-5), Some(0));
        assert_eq!(ladder.index(0), Some(5));
        assert_eq!(ladder.range(), 11);
    }
}
