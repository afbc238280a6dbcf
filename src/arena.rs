//! Arena Allocator - O(1) slab allocator for order records.
//!
//! The arena pre-allocates every record at startup, eliminating heap
//! allocation in the hot path. Free slots are kept on an index stack.
//!
//! Records are addressed through generation-checked handles: releasing a
//! slot bumps its generation, so a handle kept past `release` no longer
//! resolves, and a handle minted by another arena carries the wrong tag.
//! The tag is never part of an order's identity; ids come from a counter
//! owned by each arena.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use thiserror::Error;

use crate::command::{OrderId, Qty, Tick};

/// Upper bound (exclusive) on arena capacity
pub const NULL_INDEX: u32 = u32::MAX;

/// Source of per-arena tags. Only distinguishes allocators; order
/// identities come from each arena's own counter.
static NEXT_ARENA_TAG: AtomicU32 = AtomicU32::new(1);

/// Errors reported by the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// No free slot left
    #[error("arena exhausted")]
    Exhausted,
    /// Handle was minted by another arena, or indexes past the end
    #[error("handle does not belong to this arena")]
    ForeignHandle,
    /// Slot was released (and possibly reused) since the handle was minted
    #[error("handle refers to a released record")]
    StaleHandle,
}

/// Stable reference to a live record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OrderHandle {
    arena: u32,
    index: u32,
    generation: u32,
}

impl OrderHandle {
    /// Slot index inside the owning arena
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// A single resting unit of interest.
///
/// | Field      | Type | Offset | Size |
/// |------------|------|--------|------|
/// | id         | u64  | 0      | 8    |
/// | price      | i32  | 8      | 4    |
/// | qty        | u32  | 12     | 4    |
/// | generation | u32  | 16     | 4    |
/// | live       | bool | 20     | 1    |
/// | (padding)  | -    | 21     | 3    |
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct OrderRecord {
    /// Identity assigned at acquire time
    pub id: OrderId,
    /// Price tick
    pub price: Tick,
    /// Remaining quantity
    pub qty: Qty,
    generation: u32,
    live: bool,
}

const _: () = assert!(
    std::mem::size_of::<OrderRecord>() == 24,
    "OrderRecord must stay 24 bytes"
);

impl OrderRecord {
    #[inline]
    pub fn is_live(&self) -> bool {
        self.live
    }
}

impl fmt::Debug for OrderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderRecord")
            .field("id", &self.id)
            .field("price", &self.price)
            .field("qty", &self.qty)
            .field("live", &self.live)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Pre-allocated pool of order records.
pub struct Arena {
    tag: u32,
    records: Box<[OrderRecord]>,
    /// Free slot indices; the top is handed out next
    free: Vec<u32>,
    /// Next identity to assign (starts at 1, never recycled)
    next_id: OrderId,
}

impl Arena {
    /// Create a new arena with the specified capacity.
    ///
    /// # Panics
    /// Panics if capacity is zero or not below `NULL_INDEX`.
    pub fn new(capacity: u32) -> Self {
        assert!(capacity > 0, "arena capacity must be > 0");
        assert!(capacity < NULL_INDEX, "Capacity must be less than NULL_INDEX");

        // Reverse so that slot 0 is handed out first
        let free: Vec<u32> = (0..capacity).rev().collect();

        Self {
            tag: NEXT_ARENA_TAG.fetch_add(1, Ordering::Relaxed),
            records: vec![OrderRecord::default(); capacity as usize].into_boxed_slice(),
            free,
            next_id: 1,
        }
    }

    /// Take a free slot and initialize it as a live record.
    ///
    /// # Complexity
    /// O(1) - pops the free stack
    #[inline]
    pub fn acquire(&mut self, qty: Qty, price: Tick) -> Result<OrderHandle, ArenaError> {
        let index = self.free.pop().ok_or(ArenaError::Exhausted)?;
        let id = self.next_id;
        self.next_id += 1;

        let record = &mut self.records[index as usize];
        debug_assert!(!record.live, "acquired an in-use slot");
        record.id = id;
        record.price = price;
        record.qty = qty;
        record.live = true;

        Ok(OrderHandle {
            arena: self.tag,
            index,
            generation: record.generation,
        })
    }

    /// Return a record's slot to the free stack.
    ///
    /// Foreign and stale handles are rejected without touching the free
    /// stack; either one means the caller's bookkeeping is broken.
    ///
    /// # Complexity
    /// O(1)
    #[inline]
    pub fn release(&mut self, handle: OrderHandle) -> Result<(), ArenaError> {
        let record = self.slot_mut(handle)?;
        record.live = false;
        record.qty = 0;
        record.generation = record.generation.wrapping_add(1);
        self.free.push(handle.index);
        Ok(())
    }

    /// Resolve a handle to its record.
    #[inline]
    pub fn get(&self, handle: OrderHandle) -> Option<&OrderRecord> {
        self.check(handle).ok()?;
        Some(&self.records[handle.index as usize])
    }

    /// Resolve a handle to its record, mutably.
    #[inline]
    pub fn get_mut(&mut self, handle: OrderHandle) -> Option<&mut OrderRecord> {
        self.slot_mut(handle).ok()
    }

    #[inline]
    fn check(&self, handle: OrderHandle) -> Result<(), ArenaError> {
        if handle.arena != self.tag || handle.index as usize >= self.records.len() {
            return Err(ArenaError::ForeignHandle);
        }
        let record = &self.records[handle.index as usize];
        if !record.live || record.generation != handle.generation {
            return Err(ArenaError::StaleHandle);
        }
        Ok(())
    }

    #[inline]
    fn slot_mut(&mut self, handle: OrderHandle) -> Result<&mut OrderRecord, ArenaError> {
        self.check(handle)?;
        Ok(&mut self.records[handle.index as usize])
    }

    /// Returns the number of live records.
    #[inline]
    pub fn allocated(&self) -> u32 {
        self.capacity() - self.available()
    }

    /// Returns the number of free slots.
    #[inline]
    pub fn available(&self) -> u32 {
        self.free.len() as u32
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.records.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.allocated() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Identity the next `acquire` will assign.
    #[inline]
    pub fn next_id(&self) -> OrderId {
        self.next_id
    }

    /// Pre-fault all memory pages (warm-up routine).
    ///
    /// Touches every record so the OS maps the pages before the first
    /// order arrives.
    pub fn warm_up(&mut self) {
        for record in self.records.iter_mut() {
            record.qty = std::hint::black_box(record.qty);
        }
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("tag", &self.tag)
            .field("capacity", &self.capacity())
            .field("allocated", &self.allocated())
            .field("next_id", &self.next_id)
            .finish()
    }
}
