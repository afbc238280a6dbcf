//! Active-Level Index - the occupied ticks of each side.
//!
//! A tick is in the index iff its price level holds a live order. The
//! best bid and best ask are cached and refreshed from the index extremum
//! only when the level holding the current best goes away.

use std::collections::btree_set;
use std::collections::BTreeSet;

use crate::command::{Side, Tick};

#[derive(Clone, Debug, Default)]
pub struct ActiveLevels {
    bids: BTreeSet<Tick>,
    asks: BTreeSet<Tick>,
    /// Cached best bid price (highest buy price)
    best_bid: Option<Tick>,
    /// Cached best ask price (lowest sell price)
    best_ask: Option<Tick>,
}

impl ActiveLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Best price on a given side
    #[inline]
    pub fn best(&self, side: Side) -> Option<Tick> {
        match side {
            Side::Bid => self.best_bid,
            Side::Ask => self.best_ask,
        }
    }

    /// Mark `tick` occupied. Returns true if it was not already.
    pub fn insert(&mut self, side: Side, tick: Tick) -> bool {
        match side {
            Side::Bid => {
                if self.best_bid.map_or(true, |best| tick > best) {
                    self.best_bid = Some(tick);
                }
                self.bids.insert(tick)
            }
            Side::Ask => {
                if self.best_ask.map_or(true, |best| tick < best) {
                    self.best_ask = Some(tick);
                }
                self.asks.insert(tick)
            }
        }
    }

    /// Mark `tick` empty. Returns true if it was present.
    pub fn remove(&mut self, side: Side, tick: Tick) -> bool {
        match side {
            Side::Bid => {
                let removed = self.bids.remove(&tick);
                if self.best_bid == Some(tick) {
                    self.best_bid = self.bids.last().copied();
                }
                removed
            }
            Side::Ask => {
                let removed = self.asks.remove(&tick);
                if self.best_ask == Some(tick) {
                    self.best_ask = self.asks.first().copied();
                }
                removed
            }
        }
    }

    #[inline]
    pub fn contains(&self, side: Side, tick: Tick) -> bool {
        match side {
            Side::Bid => self.bids.contains(&tick),
            Side::Ask => self.asks.contains(&tick),
        }
    }

    /// Number of occupied ticks on a side
    #[inline]
    pub fn len(&self, side: Side) -> usize {
        match side {
            Side::Bid => self.bids.len(),
            Side::Ask => self.asks.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Occupied ticks from best to worst: descending for bids, ascending
    /// for asks.
    pub fn best_first(&self, side: Side) -> BestFirst<'_> {
        match side {
            Side::Bid => BestFirst::Bids(self.bids.iter().rev()),
            Side::Ask => BestFirst::Asks(self.asks.iter()),
        }
    }
}

/// Iterator returned by [`ActiveLevels::best_first`].
pub enum BestFirst<'a> {
    Bids(std::iter::Rev<btree_set::Iter<'a, Tick>>),
    Asks(btree_set::Iter<'a, Tick>),
}

impl Iterator for BestFirst<'_> {
    type Item = Tick;

    #[inline]
    fn next(&mut self) -> Option<Tick> {
        match self {
            BestFirst::Bids(it) => it.next().copied(),
            BestFirst::Asks(it) => it.next().copied(),
        }
    }
}
