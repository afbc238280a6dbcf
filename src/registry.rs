//! Order Registry - identity to location lookup.
//!
//! An entry exists iff the order is resting. Modify and cancel go straight
//! to the right side and tick instead of scanning the ladder.

use rustc_hash::FxHashMap;

use crate::arena::OrderHandle;
use crate::command::{OrderId, Side, Tick};

/// Where a resting order lives
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderLocation {
    pub side: Side,
    pub price: Tick,
    /// Handle of the record in the arena
    pub handle: OrderHandle,
}

#[derive(Debug, Default)]
pub struct OrderRegistry {
    entries: FxHashMap<OrderId, OrderLocation>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-sized for `capacity` resting orders.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Record a newly resting order.
    #[inline]
    pub fn insert(&mut self, id: OrderId, location: OrderLocation) {
        let previous = self.entries.insert(id, location);
        debug_assert!(previous.is_none(), "order {id} registered twice");
    }

    #[inline]
    pub fn get(&self, id: OrderId) -> Option<&OrderLocation> {
        self.entries.get(&id)
    }

    #[inline]
    pub fn remove(&mut self, id: OrderId) -> Option<OrderLocation> {
        self.entries.remove(&id)
    }

    #[inline]
    pub fn contains(&self, id: OrderId) -> bool {
        self.entries.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All resting identities, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.entries.keys().copied()
    }
}
