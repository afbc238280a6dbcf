//! # tick-ladder
//!
//! A single-instrument, price-time-priority limit order book.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: One thread owns the book exclusively (no locks)
//! - **Dense Ladder**: One FIFO queue per tick, addressed by `tick - min_price`
//! - **Arena Allocation**: Fixed-capacity slab with generation-checked handles
//! - **Lazy FIFO**: Fills advance a head cursor instead of shifting the queue
//!
//! ## Architecture
//!
//! ```text
//! [Producers] --> [SPSC Ring Buffer] --> [Engine Thread (Pinned)]
//!                                                |
//!                                         [MatchingEngine]
//!                          Arena | PriceLadder | ActiveLevels | OrderRegistry
//! ```
//!
//! ## Example
//!
//! ```
//! use tick_ladder::{BookConfig, MatchingEngine, OrderType, Side};
//!
//! let mut engine = MatchingEngine::new(BookConfig::with_range(9_000, 11_000, 1_000)).unwrap();
//! engine.add_order(100, 10_050, Side::Bid).unwrap();
//! engine.add_order(150, 10_050, Side::Bid).unwrap();
//!
//! let exec = engine.submit(OrderType::Market, Side::Ask, 200, None).unwrap();
//! assert_eq!(exec.units_transacted, 200);
//! assert_eq!(exec.notional_value, 10_050 * 200);
//! assert_eq!(engine.best_price(Side::Bid), Some(10_050));
//! ```

pub mod active_levels;
pub mod arena;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod ladder;
pub mod matching;
pub mod order_book;
pub mod price_level;
pub mod registry;

// Re-exports for convenience
pub use arena::{Arena, ArenaError, OrderHandle, OrderRecord};
pub use command::{
    AddOrder, CancelOrder, Command, Execution, LevelSummary, ModifyOrder, OrderId, OrderType,
    OrderView, Outcome, Qty, Side, SubmitOrder, Tick,
};
pub use config::BookConfig;
pub use engine::Engine;
pub use error::{BookError, BookResult};
pub use matching::MatchingEngine;
pub use order_book::{LevelView, OrderBook};
pub use price_level::PriceLevel;
