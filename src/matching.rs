//! Matching Engine - Core order matching algorithm.
//!
//! Implements the sweep/rest algorithm:
//! 1. SWEEPING: consume the opposite side best level first, oldest order
//!    first, each fill priced at the resting order's tick
//! 2. RESTING: place a limit order's remaining quantity in the book
//!
//! Market orders never rest; whatever the book cannot fill is dropped.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use arrayvec::ArrayVec;
use tracing::{debug, error, trace};

use crate::arena::{Arena, OrderHandle};
use crate::command::{
    Execution, LevelSummary, OrderId, OrderType, OrderView, Qty, Side, Tick,
};
use crate::config::BookConfig;
use crate::error::{BookError, BookResult};
use crate::order_book::{LevelView, OrderBook};

/// The matching engine core. Owns every record, queue and index of one
/// book; callers must serialize access.
pub struct MatchingEngine {
    arena: Arena,
    book: OrderBook,
    config: BookConfig,
}

impl MatchingEngine {
    /// Create an empty engine.
    pub fn new(config: BookConfig) -> BookResult<Self> {
        config.validate()?;
        Ok(Self {
            arena: Arena::new(config.capacity),
            book: OrderBook::new(&config),
            config,
        })
    }

    /// Submit a market or limit order.
    ///
    /// All validation happens before the book is touched: zero quantity,
    /// a limit order without a price or with an off-ladder price, and a
    /// limit order that would have to rest into a full arena without
    /// crossing anything are rejected. A limit order that crosses at least
    /// one maker always has room to rest, since its remainder only exists
    /// after every crossed maker was consumed and released.
    pub fn submit(
        &mut self,
        order_type: OrderType,
        side: Side,
        qty: Qty,
        price: Option<Tick>,
    ) -> BookResult<Execution> {
        if qty == 0 {
            debug!(%side, "rejected submit with zero quantity");
            return Err(BookError::InvalidQuantity);
        }

        let limit = match order_type {
            OrderType::Market => None,
            OrderType::Limit => {
                let price = price.ok_or(BookError::MissingLimitPrice)?;
                self.book.ladder().check(price).inspect_err(|err| {
                    debug!(%side, price, %err, "rejected limit order");
                })?;
                Some(price)
            }
        };

        if let Some(limit) = limit {
            if self.arena.is_full() && !self.crosses(side, limit) {
                debug!(%side, limit, "rejected limit order: arena full");
                return Err(self.capacity_exceeded());
            }
        }

        trace!(?order_type, %side, qty, ?limit, "submit");

        let mut execution = Execution::default();
        let remaining = self.sweep(side, qty, limit, &mut execution);

        if remaining > 0 {
            match limit {
                Some(price) => {
                    execution.resting_id = Some(self.rest_order(side, price, remaining)?);
                }
                None => trace!(%side, remaining, "market order remainder discarded"),
            }
        }

        Ok(execution)
    }

    /// Rest an order without matching.
    pub fn add_order(&mut self, qty: Qty, price: Tick, side: Side) -> BookResult<OrderId> {
        if qty == 0 {
            return Err(BookError::InvalidQuantity);
        }
        self.book.ladder().check(price)?;
        self.rest_order(side, price, qty)
    }

    /// Change the remaining quantity of a resting order.
    ///
    /// The order keeps its queue position whether the quantity goes up or
    /// down. A new quantity of zero cancels the order. Returns false if
    /// `order_id` is not resting.
    pub fn modify_order(&mut self, order_id: OrderId, new_qty: Qty) -> bool {
        if new_qty == 0 {
            return self.cancel_order(order_id);
        }

        let Some(location) = self.book.get_order(order_id).copied() else {
            trace!(order_id, "modify of unknown order");
            return false;
        };

        match self.arena.get_mut(location.handle) {
            Some(record) => {
                trace!(order_id, old_qty = record.qty, new_qty, "modify");
                record.qty = new_qty;
                true
            }
            None => self.corrupted(location.handle, "registered order has no live record"),
        }
    }

    /// Cancel a resting order. Returns false if `order_id` is not resting.
    pub fn cancel_order(&mut self, order_id: OrderId) -> bool {
        match self.book.remove_order(&self.arena, order_id) {
            Some(location) => {
                trace!(order_id, side = %location.side, price = location.price, "cancel");
                self.release(location.handle);
                true
            }
            None => {
                trace!(order_id, "cancel of unknown order");
                false
            }
        }
    }

    // ========================================================================
    // Sweep / Rest
    // ========================================================================

    /// Consume opposite-side liquidity, best level first.
    ///
    /// # Returns
    /// Remaining quantity after matching
    fn sweep(
        &mut self,
        side: Side,
        mut remaining: Qty,
        limit: Option<Tick>,
        execution: &mut Execution,
    ) -> Qty {
        let maker_side = side.opposite();

        while remaining > 0 {
            let Some(price) = self.book.best_price(maker_side) else {
                break; // No orders on opposite side
            };

            // Levels only get worse from here
            if let Some(limit) = limit {
                if !prices_cross(side, limit, price) {
                    break;
                }
            }

            remaining = self.match_at_level(maker_side, price, remaining, execution);
        }

        remaining
    }

    /// Match against orders at one price level, front to back.
    ///
    /// # Returns
    /// Remaining quantity after matching at this level
    fn match_at_level(
        &mut self,
        maker_side: Side,
        price: Tick,
        mut remaining: Qty,
        execution: &mut Execution,
    ) -> Qty {
        while remaining > 0 {
            let Some(maker) = self
                .book
                .get_level(maker_side, price)
                .and_then(|level| level.front())
            else {
                break;
            };

            let Some(record) = self.arena.get_mut(maker) else {
                self.corrupted(maker, "queued handle has no live record");
            };

            if record.qty > remaining {
                // Maker partially filled, taker done
                record.qty -= remaining;
                execution.record_fill(price, remaining);
                remaining = 0;
            } else {
                // Maker fully filled
                let (maker_id, filled) = (record.id, record.qty);
                execution.record_fill(price, filled);
                remaining -= filled;

                let Some((handle, emptied)) =
                    self.book.pop_front_order(maker_side, price, maker_id)
                else {
                    self.corrupted(maker, "filled maker missing from its level");
                };
                self.release(handle);
                if emptied {
                    trace!(side = %maker_side, price, "level cleared");
                }
            }
        }

        remaining
    }

    /// Allocate a record and append it to its level.
    fn rest_order(&mut self, side: Side, price: Tick, qty: Qty) -> BookResult<OrderId> {
        let handle = self
            .arena
            .acquire(qty, price)
            .map_err(|_| self.capacity_exceeded())?;

        let order_id = match self.arena.get(handle) {
            Some(record) => record.id,
            None => self.corrupted(handle, "freshly acquired handle does not resolve"),
        };
        if !self.book.rest(&self.arena, side, price, handle) {
            self.corrupted(handle, "acquired record could not be queued");
        }

        trace!(order_id, %side, price, qty, "rest");
        Ok(order_id)
    }

    /// Would an order on `side` limited at `limit` trade right now?
    #[inline]
    fn crosses(&self, side: Side, limit: Tick) -> bool {
        self.book
            .best_opposite_price(side)
            .is_some_and(|best| prices_cross(side, limit, best))
    }

    /// Return a record to the arena. A rejected release means the engine's
    /// own bookkeeping is broken, so it does not continue.
    fn release(&mut self, handle: OrderHandle) {
        if let Err(err) = self.arena.release(handle) {
            self.corrupted(handle, &err.to_string());
        }
    }

    #[cold]
    fn corrupted(&self, handle: OrderHandle, what: &str) -> ! {
        error!(?handle, what, "allocator corruption");
        panic!("allocator corruption: {what} ({handle:?})");
    }

    fn capacity_exceeded(&self) -> BookError {
        BookError::CapacityExceeded {
            capacity: self.arena.capacity(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Best resting price on a side, if any
    #[inline]
    pub fn best_price(&self, side: Side) -> Option<Tick> {
        self.book.best_price(side)
    }

    /// Best price with per-side sentinels for an empty side:
    /// `min_price - 1` for bids, `max_price + 1` for asks.
    #[inline]
    pub fn best_quote(&self, side: Side) -> Tick {
        self.best_price(side).unwrap_or(match side {
            Side::Bid => self.config.bid_sentinel(),
            Side::Ask => self.config.ask_sentinel(),
        })
    }

    #[inline]
    pub fn best_bid(&self) -> Option<Tick> {
        self.book.best_bid()
    }

    #[inline]
    pub fn best_ask(&self) -> Option<Tick> {
        self.book.best_ask()
    }

    #[inline]
    pub fn spread(&self) -> Option<Tick> {
        self.book.spread()
    }

    /// Get total resting order count
    #[inline]
    pub fn order_count(&self) -> usize {
        self.book.order_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.book.is_empty()
    }

    /// Snapshot of a resting order
    pub fn order(&self, order_id: OrderId) -> Option<OrderView> {
        let location = self.book.get_order(order_id)?;
        let record = self.arena.get(location.handle)?;
        Some(OrderView {
            id: record.id,
            side: location.side,
            price: location.price,
            qty: record.qty,
        })
    }

    /// One occupied level, or `None` if nothing rests there
    pub fn level(&self, side: Side, price: Tick) -> Option<LevelView<'_>> {
        self.book.level_view(&self.arena, side, price)
    }

    /// Occupied levels of a side, best first
    pub fn levels(&self, side: Side) -> impl Iterator<Item = LevelView<'_>> + '_ {
        self.book.levels(&self.arena, side)
    }

    /// Top `N` levels of a side, aggregated
    pub fn depth<const N: usize>(&self, side: Side) -> ArrayVec<LevelSummary, N> {
        self.levels(side).take(N).map(|l| l.summary()).collect()
    }

    /// Total resting quantity on a side
    pub fn total_quantity(&self, side: Side) -> u64 {
        self.levels(side).map(|l| l.total_qty()).sum()
    }

    /// Drop the dead prefix of one level now instead of waiting for the
    /// threshold. Returns the number of entries dropped.
    pub fn compact_level(&mut self, side: Side, price: Tick) -> usize {
        let dropped = self
            .book
            .get_level_mut(side, price)
            .map_or(0, |level| level.compact());
        if dropped > 0 {
            debug!(%side, price, dropped, "compacted level");
        }
        dropped
    }

    #[inline]
    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    #[inline]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    #[inline]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Warm up the engine (pre-fault memory pages)
    pub fn warm_up(&mut self) {
        self.arena.warm_up();
    }

    /// Compute a hash of the current state (for determinism testing)
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.best_bid().hash(&mut hasher);
        self.best_ask().hash(&mut hasher);
        self.order_count().hash(&mut hasher);
        self.arena.allocated().hash(&mut hasher);

        for side in [Side::Bid, Side::Ask] {
            for level in self.levels(side) {
                level.price().hash(&mut hasher);
                for order in level.orders() {
                    order.id.hash(&mut hasher);
                    order.qty.hash(&mut hasher);
                }
            }
        }

        hasher.finish()
    }

    /// Cross-check the ladder, the active-level index, the registry and
    /// the arena against each other. Walks the whole ladder; meant for
    /// tests and debugging, not the hot path.
    pub fn audit(&self) -> Result<(), String> {
        let mut queued = 0usize;

        for side in [Side::Bid, Side::Ask] {
            let mut extremum: Option<Tick> = None;

            for price in self.config.min_price..=self.config.max_price {
                let Some(level) = self.book.get_level(side, price) else {
                    return Err(format!("{side} tick {price} not addressable"));
                };
                let active = self.book.active_levels().contains(side, price);
                if active == level.is_empty() {
                    return Err(format!(
                        "{side} tick {price}: active={active} but level has {} orders",
                        level.len()
                    ));
                }
                if !level.is_empty() {
                    extremum = Some(match (side, extremum) {
                        (_, None) => price,
                        (Side::Bid, Some(best)) => best.max(price),
                        (Side::Ask, Some(best)) => best.min(price),
                    });
                }

                for handle in level.iter() {
                    let record = self
                        .arena
                        .get(handle)
                        .ok_or_else(|| format!("{side} tick {price}: dead handle {handle:?}"))?;
                    if record.price != price {
                        return Err(format!("order {} queued at {price} has price {}", record.id, record.price));
                    }
                    if record.qty == 0 {
                        return Err(format!("order {} rests with zero quantity", record.id));
                    }
                    match self.book.get_order(record.id) {
                        Some(loc) if loc.side == side && loc.price == price && loc.handle == handle => {}
                        other => {
                            return Err(format!("order {} registry mismatch: {other:?}", record.id))
                        }
                    }
                    queued += 1;
                }
            }

            if extremum != self.best_price(side) {
                return Err(format!(
                    "{side} best cache {:?} != index extremum {extremum:?}",
                    self.best_price(side)
                ));
            }
        }

        if queued != self.order_count() || queued != self.arena.allocated() as usize {
            return Err(format!(
                "queued {queued}, registered {}, allocated {}",
                self.order_count(),
                self.arena.allocated()
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for MatchingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchingEngine")
            .field("config", &self.config)
            .field("arena", &self.arena)
            .field("book", &self.book)
            .finish()
    }
}

/// Does a `side` order limited at `limit` trade against a resting `price`?
#[inline]
fn prices_cross(side: Side, limit: Tick, price: Tick) -> bool {
    match side {
        // Buyer willing to pay >= ask
        Side::Bid => price <= limit,
        // Seller willing to accept <= bid
        Side::Ask => price >= limit,
    }
}
