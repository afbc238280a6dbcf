//! Price Level - A FIFO queue of orders at a single price tick.
//!
//! Handles are appended to a backing vector and consumed by advancing a
//! head cursor, so a fill never shifts the queue. Everything before the
//! head is dead and is never dereferenced; it is dropped in bulk once it
//! outgrows the live region.

use crate::arena::{Arena, OrderHandle};
use crate::command::OrderId;

/// A queue of orders at a specific price level.
///
/// Entries at or after `head` are live and ordered by arrival, oldest
/// first.
#[derive(Clone, Debug, Default)]
pub struct PriceLevel {
    entries: Vec<OrderHandle>,
    head: usize,
}

impl PriceLevel {
    /// Create a new empty price level
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            head: 0,
        }
    }

    /// Returns true if there are no live orders at this level
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head >= self.entries.len()
    }

    /// Number of live orders
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len() - self.head
    }

    /// Number of consumed entries still held before the head
    #[inline]
    pub fn dead_prefix(&self) -> usize {
        self.head
    }

    /// Append an order to the tail of the queue (newest order).
    ///
    /// # Complexity
    /// O(1) amortized
    #[inline]
    pub fn push_back(&mut self, handle: OrderHandle) {
        self.entries.push(handle);
    }

    /// The oldest live order, if any.
    #[inline]
    pub fn front(&self) -> Option<OrderHandle> {
        self.entries.get(self.head).copied()
    }

    /// Remove and return the oldest live order.
    ///
    /// The record is NOT released; the caller owns that. The dead prefix
    /// is dropped once it holds at least `compaction_threshold` entries
    /// and is no shorter than the live region. A threshold of 0 drops it on
    /// every pop. An emptied queue is always reset.
    ///
    /// # Complexity
    /// O(1) amortized
    #[inline]
    pub fn pop_front(&mut self, compaction_threshold: usize) -> Option<OrderHandle> {
        let handle = *self.entries.get(self.head)?;
        self.head += 1;

        if self.is_empty() {
            self.reset();
        } else if compaction_threshold == 0
            || (self.head >= compaction_threshold && self.head >= self.len())
        {
            self.compact();
        }

        Some(handle)
    }

    /// Physically drop the dead prefix. Returns how many entries were dropped.
    pub fn compact(&mut self) -> usize {
        let dropped = self.head;
        if dropped > 0 {
            self.entries.drain(..dropped);
            self.head = 0;
        }
        dropped
    }

    /// Remove an order from anywhere in the live region (for cancel).
    ///
    /// Scans only this level. The record is NOT released.
    pub fn erase_by_identity(&mut self, arena: &Arena, id: OrderId) -> Option<OrderHandle> {
        let pos = self.position_of(arena, id)?;
        let handle = self.entries.remove(self.head + pos);
        if self.is_empty() {
            self.reset();
        }
        Some(handle)
    }

    /// Queue position of `id` among live orders (0 = front).
    pub fn position_of(&self, arena: &Arena, id: OrderId) -> Option<usize> {
        self.iter()
            .position(|h| arena.get(h).is_some_and(|r| r.id == id))
    }

    /// Live handles, oldest first.
    #[inline]
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = OrderHandle> + ExactSizeIterator + '_ {
        self.entries[self.head..].iter().copied()
    }

    /// Sum of remaining quantity over live orders.
    pub fn total_qty(&self, arena: &Arena) -> u64 {
        self.iter()
            .filter_map(|h| arena.get(h))
            .map(|r| r.qty as u64)
            .sum()
    }

    #[inline]
    fn reset(&mut self) {
        self.entries.clear();
        self.head = 0;
    }
}
