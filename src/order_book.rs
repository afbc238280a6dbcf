//! Order Book - the ladder, the active-level index and the registry.
//!
//! The three structures describe the same set of resting orders. Every
//! mutation here updates all of them together, so a tick is active iff its
//! level is non-empty and an identity is registered iff it is queued.

use crate::active_levels::ActiveLevels;
use crate::arena::{Arena, OrderHandle};
use crate::command::{LevelSummary, OrderId, OrderView, Side, Tick};
use crate::config::BookConfig;
use crate::ladder::PriceLadder;
use crate::price_level::PriceLevel;
use crate::registry::{OrderLocation, OrderRegistry};

/// Dense order book over a fixed tick range.
pub struct OrderBook {
    ladder: PriceLadder,
    active: ActiveLevels,
    registry: OrderRegistry,
    compaction_threshold: usize,
}

impl OrderBook {
    /// Create an empty book for an already validated config.
    pub fn new(config: &BookConfig) -> Self {
        Self {
            ladder: PriceLadder::new(config.min_price, config.max_price),
            active: ActiveLevels::new(),
            registry: OrderRegistry::with_capacity(config.capacity as usize),
            compaction_threshold: config.compaction_threshold,
        }
    }

    // ========================================================================
    // Best Price Access
    // ========================================================================

    #[inline]
    pub fn best_bid(&self) -> Option<Tick> {
        self.active.best(Side::Bid)
    }

    #[inline]
    pub fn best_ask(&self) -> Option<Tick> {
        self.active.best(Side::Ask)
    }

    #[inline]
    pub fn best_price(&self, side: Side) -> Option<Tick> {
        self.active.best(side)
    }

    /// Best price an incoming order on `side` could trade against
    #[inline]
    pub fn best_opposite_price(&self, side: Side) -> Option<Tick> {
        self.active.best(side.opposite())
    }

    /// Calculate spread (best_ask - best_bid)
    pub fn spread(&self) -> Option<Tick> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) if ask > bid => Some(ask - bid),
            _ => None,
        }
    }

    // ========================================================================
    // Level Access
    // ========================================================================

    #[inline]
    pub fn ladder(&self) -> &PriceLadder {
        &self.ladder
    }

    #[inline]
    pub fn active_levels(&self) -> &ActiveLevels {
        &self.active
    }

    #[inline]
    pub fn get_level(&self, side: Side, price: Tick) -> Option<&PriceLevel> {
        self.ladder.level(side, price)
    }

    #[inline]
    pub fn get_level_mut(&mut self, side: Side, price: Tick) -> Option<&mut PriceLevel> {
        self.ladder.level_mut(side, price)
    }

    // ========================================================================
    // Order Management
    // ========================================================================

    /// Append a live record to the back of its level.
    ///
    /// The caller has already range-checked `price`; `handle` must be live
    /// in `arena`. Returns false, touching nothing, if either does not hold.
    pub fn rest(&mut self, arena: &Arena, side: Side, price: Tick, handle: OrderHandle) -> bool {
        let Some(record) = arena.get(handle) else {
            return false;
        };
        let id = record.id;
        let Some(level) = self.ladder.level_mut(side, price) else {
            return false;
        };

        level.push_back(handle);
        self.active.insert(side, price);
        self.registry.insert(id, OrderLocation { side, price, handle });
        true
    }

    /// Unlink a resting order from its level and the registry (for cancel).
    ///
    /// The record is NOT released; the caller owns that.
    pub fn remove_order(&mut self, arena: &Arena, order_id: OrderId) -> Option<OrderLocation> {
        let location = self.registry.remove(order_id)?;

        if let Some(level) = self.ladder.level_mut(location.side, location.price) {
            let erased = level.erase_by_identity(arena, order_id);
            debug_assert_eq!(erased, Some(location.handle));
            if level.is_empty() {
                self.active.remove(location.side, location.price);
            }
        }

        Some(location)
    }

    /// Pop the front order of a level after it was fully filled.
    ///
    /// Returns the popped handle and whether the level is now empty.
    /// The record is NOT released.
    pub fn pop_front_order(
        &mut self,
        side: Side,
        price: Tick,
        order_id: OrderId,
    ) -> Option<(OrderHandle, bool)> {
        let level = self.ladder.level_mut(side, price)?;
        let handle = level.pop_front(self.compaction_threshold)?;
        let emptied = level.is_empty();

        self.registry.remove(order_id);
        if emptied {
            self.active.remove(side, price);
        }
        Some((handle, emptied))
    }

    #[inline]
    pub fn get_order(&self, order_id: OrderId) -> Option<&OrderLocation> {
        self.registry.get(order_id)
    }

    #[inline]
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.registry.contains(order_id)
    }

    #[inline]
    pub fn registry(&self) -> &OrderRegistry {
        &self.registry
    }

    // ========================================================================
    // Enumeration
    // ========================================================================

    /// Read-only view of one occupied level.
    pub fn level_view<'a>(&'a self, arena: &'a Arena, side: Side, price: Tick) -> Option<LevelView<'a>> {
        if !self.active.contains(side, price) {
            return None;
        }
        let level = self.ladder.level(side, price)?;
        Some(LevelView {
            side,
            price,
            level,
            arena,
        })
    }

    /// Occupied levels of one side, best first.
    pub fn levels<'a>(&'a self, arena: &'a Arena, side: Side) -> impl Iterator<Item = LevelView<'a>> + 'a {
        self.active
            .best_first(side)
            .filter_map(move |price| self.level_view(arena, side, price))
    }

    // ========================================================================
    // Utility Methods
    // ========================================================================

    /// Get the total number of orders in the book
    pub fn order_count(&self) -> usize {
        self.registry.len()
    }

    /// Get the number of occupied levels on a side
    pub fn level_count(&self, side: Side) -> usize {
        self.active.len(side)
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Get depth at a price level as (total qty, order count)
    pub fn depth_at(&self, arena: &Arena, side: Side, price: Tick) -> (u64, u32) {
        self.ladder
            .level(side, price)
            .map(|l| (l.total_qty(arena), l.len() as u32))
            .unwrap_or((0, 0))
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("best_bid", &self.best_bid())
            .field("best_ask", &self.best_ask())
            .field("bid_levels", &self.level_count(Side::Bid))
            .field("ask_levels", &self.level_count(Side::Ask))
            .field("order_count", &self.order_count())
            .finish()
    }
}

/// Borrowed view of one occupied price level.
#[derive(Clone, Copy)]
pub struct LevelView<'a> {
    side: Side,
    price: Tick,
    level: &'a PriceLevel,
    arena: &'a Arena,
}

impl<'a> LevelView<'a> {
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    #[inline]
    pub fn price(&self) -> Tick {
        self.price
    }

    /// Number of live orders at this level
    #[inline]
    pub fn order_count(&self) -> usize {
        self.level.len()
    }

    /// Aggregate remaining quantity
    pub fn total_qty(&self) -> u64 {
        self.level.total_qty(self.arena)
    }

    /// Orders in time priority, oldest first.
    pub fn orders(&self) -> impl Iterator<Item = OrderView> + 'a {
        let (side, arena) = (self.side, self.arena);
        self.level.iter().filter_map(move |h| {
            arena.get(h).map(|r| OrderView {
                id: r.id,
                side,
                price: r.price,
                qty: r.qty,
            })
        })
    }

    pub fn summary(&self) -> LevelSummary {
        LevelSummary {
            price: self.price,
            total_qty: self.total_qty(),
            order_count: self.order_count() as u32,
        }
    }
}

impl std::fmt::Debug for LevelView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelView")
            .field("side", &self.side)
            .field("price", &self.price)
            .field("orders", &self.orders().collect::<Vec<_>>())
            .finish()
    }
}
