//! Error types for the order book.
//!
//! Every `BookError` is raised before the book is mutated, so a rejected
//! request leaves the ladder, the active-level index and the registry
//! exactly as they were.

use thiserror::Error;

use crate::command::Tick;

/// Errors returned by book operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BookError {
    /// Price outside the ladder.
    #[error("price tick {tick} is outside the supported range [{min}, {max}]")]
    OutOfRange {
        /// The rejected tick
        tick: Tick,
        /// Lowest addressable tick
        min: Tick,
        /// Highest addressable tick
        max: Tick,
    },

    /// The order arena has no free slot.
    #[error("order capacity exhausted ({capacity} resting orders)")]
    CapacityExceeded {
        /// Configured arena capacity
        capacity: u32,
    },

    /// Order type tag other than market or limit.
    #[error("invalid order type: {0}")]
    InvalidOrderType(String),

    /// Zero quantity.
    #[error("order quantity must be positive")]
    InvalidQuantity,

    /// Limit order submitted without a price.
    #[error("limit order requires a price")]
    MissingLimitPrice,

    /// Rejected at construction time.
    #[error("invalid book configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for book operations.
pub type BookResult<T> = Result<T, BookError>;
