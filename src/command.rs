//! Command and result types for the matching engine.
//!
//! Commands are the requests an external order-flow layer hands to the
//! single writer. Outcomes and executions are what it gets back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BookError;

/// Integer price tick (e.g. one cent).
pub type Tick = i32;

/// Order quantity. Never negative.
pub type Qty = u32;

/// Engine-assigned order identity. Never reused within one book.
pub type OrderId = u64;

/// Order side (bid = buy, ask = sell)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Bid = 0,
    /// Sell side (asks)
    Ask = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => f.write_str("bid"),
            Side::Ask => f.write_str("ask"),
        }
    }
}

/// How an incoming order interacts with the book.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderType {
    /// Sweep with no price bound; any remainder is discarded.
    Market = 0,
    /// Sweep up to the limit; any remainder rests at the limit.
    Limit = 1,
}

impl TryFrom<u8> for OrderType {
    type Error = BookError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(OrderType::Market),
            1 => Ok(OrderType::Limit),
            other => Err(BookError::InvalidOrderType(other.to_string())),
        }
    }
}

impl FromStr for OrderType {
    type Err = BookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "market" => Ok(OrderType::Market),
            "limit" => Ok(OrderType::Limit),
            _ => Err(BookError::InvalidOrderType(s.to_string())),
        }
    }
}

// ============================================================================
// Input Commands
// ============================================================================

/// Submit a market or limit order (may sweep, may rest)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitOrder {
    pub order_type: OrderType,
    pub side: Side,
    pub qty: Qty,
    /// Required for limit orders, ignored for market orders
    pub price: Option<Tick>,
}

/// Rest an order without matching
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddOrder {
    pub side: Side,
    pub price: Tick,
    pub qty: Qty,
}

/// Change the quantity of a resting order in place
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModifyOrder {
    pub order_id: OrderId,
    pub new_qty: Qty,
}

/// Cancel a resting order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CancelOrder {
    pub order_id: OrderId,
}

/// Input commands, applied strictly in arrival order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Submit(SubmitOrder),
    Add(AddOrder),
    Modify(ModifyOrder),
    Cancel(CancelOrder),
}

// ============================================================================
// Results
// ============================================================================

/// Aggregate result of one `submit`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Execution {
    /// Total quantity filled across all visited levels
    pub units_transacted: u64,
    /// Sum of `maker tick * fill quantity`
    pub notional_value: i64,
    /// Identity of the remainder if a limit order came to rest
    pub resting_id: Option<OrderId>,
}

impl Execution {
    /// Account for one fill at the maker's tick.
    #[inline]
    pub(crate) fn record_fill(&mut self, price: Tick, qty: Qty) {
        self.units_transacted += qty as u64;
        self.notional_value += price as i64 * qty as i64;
    }

    /// Volume-weighted average fill price, if anything traded.
    pub fn average_price(&self) -> Option<f64> {
        if self.units_transacted == 0 {
            None
        } else {
            Some(self.notional_value as f64 / self.units_transacted as f64)
        }
    }
}

/// Snapshot of one resting order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderView {
    pub id: OrderId,
    pub side: Side,
    pub price: Tick,
    pub qty: Qty,
}

/// Aggregated view of one occupied price level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelSummary {
    pub price: Tick,
    pub total_qty: u64,
    pub order_count: u32,
}

/// Result of applying one `Command`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A submit ran to completion (possibly with zero fills)
    Executed(Execution),
    /// An add rested under this identity
    Rested(OrderId),
    /// Modify applied (`found == false` for unknown identities)
    Modified { order_id: OrderId, found: bool },
    /// Cancel applied (`found == false` for unknown identities)
    Canceled { order_id: OrderId, found: bool },
    /// Rejected before any mutation
    Rejected(BookError),
}
