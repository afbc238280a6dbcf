//! Stress Tests - Push the engine to its limits.
//!
//! These tests verify correctness under extreme conditions:
//! - Near-capacity operation
//! - High contention at single price levels
//! - Rapid order churn
//! - Ladder bounds and maximum quantities

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tick_ladder::{
    AddOrder, BookConfig, BookError, CancelOrder, Command, Engine, MatchingEngine, OrderId,
    OrderType, Outcome, Side,
};

fn engine(capacity: u32) -> MatchingEngine {
    MatchingEngine::new(BookConfig::with_range(9_000, 11_000, capacity)).unwrap()
}

// ============================================================================
// Capacity Stress Tests
// ============================================================================

#[test]
fn test_near_capacity_operation() {
    const CAPACITY: u32 = 10_000;
    let mut engine = engine(CAPACITY);

    // Fill to 95% capacity, bids 9000-9990 and asks 10000-10990 never cross
    let target_orders = (CAPACITY as f64 * 0.95) as u32;

    for i in 0..target_orders {
        let (side, price) = if i % 2 == 0 {
            (Side::Bid, 9_000 + (i % 100) as i32 * 10)
        } else {
            (Side::Ask, 10_000 + (i % 100) as i32 * 10)
        };
        let result = engine.add_order(100, price, side);
        assert!(result.is_ok(), "Order {} should rest, got {:?}", i, result);
    }

    assert_eq!(engine.order_count(), target_orders as usize);
    assert_eq!(engine.arena().available(), CAPACITY - target_orders);
    assert!(engine.audit().is_ok());
}

#[test]
fn test_arena_full_rejection() {
    const CAPACITY: u32 = 100;
    let mut engine = engine(CAPACITY);

    for i in 0..CAPACITY {
        engine.add_order(100, 9_000 + i as i32, Side::Bid).unwrap();
    }

    assert_eq!(
        engine.add_order(100, 9_500, Side::Bid),
        Err(BookError::CapacityExceeded { capacity: CAPACITY })
    );
    // A non-crossing limit order cannot rest either
    assert_eq!(
        engine.submit(OrderType::Limit, Side::Ask, 10, Some(10_500)),
        Err(BookError::CapacityExceeded { capacity: CAPACITY })
    );
    assert_eq!(engine.order_count(), CAPACITY as usize);
}

#[test]
fn test_full_arena_crossing_limit_still_rests() {
    let mut engine = engine(2);
    engine.add_order(10, 9_900, Side::Bid).unwrap();
    engine.add_order(10, 9_800, Side::Bid).unwrap();
    assert!(engine.arena().is_full());

    // Consumes the 9900 bid, then rests its remainder in the freed slot
    let exec = engine
        .submit(OrderType::Limit, Side::Ask, 15, Some(9_900))
        .unwrap();

    assert_eq!(exec.units_transacted, 10);
    let resting = exec.resting_id.unwrap();
    assert_eq!(engine.order(resting).unwrap().qty, 5);
    assert_eq!(engine.best_ask(), Some(9_900));
    assert_eq!(engine.best_bid(), Some(9_800));
    assert!(engine.audit().is_ok());
}

#[test]
fn test_arena_reuse_after_cancel() {
    const CAPACITY: u32 = 100;
    let mut engine = engine(CAPACITY);

    let ids: Vec<OrderId> = (0..CAPACITY)
        .map(|i| engine.add_order(100, 9_000 + i as i32, Side::Bid).unwrap())
        .collect();

    for id in &ids[..50] {
        assert!(engine.cancel_order(*id));
    }

    for i in 0..50 {
        assert!(engine.add_order(100, 10_500 + i, Side::Ask).is_ok());
    }

    assert_eq!(engine.order_count(), CAPACITY as usize);
    // Ids keep increasing even though slots were recycled
    assert_eq!(engine.arena().next_id(), CAPACITY as u64 + 51);
}

// ============================================================================
// Contention Stress Tests
// ============================================================================

#[test]
fn test_single_price_level_contention() {
    const ORDERS: u32 = 1_000;
    let mut engine = engine(10_000);

    for _ in 0..ORDERS {
        engine.add_order(10, 10_000, Side::Ask).unwrap();
    }

    let level = engine.level(Side::Ask, 10_000).unwrap();
    assert_eq!(level.order_count(), ORDERS as usize);
    assert_eq!(level.total_qty(), 10 * ORDERS as u64);

    let exec = engine
        .submit(OrderType::Market, Side::Bid, 10 * ORDERS, None)
        .unwrap();

    assert_eq!(exec.units_transacted, 10 * ORDERS as u64);
    assert!(engine.is_empty());
    assert!(engine.level(Side::Ask, 10_000).is_none());
}

#[test]
fn test_fifo_priority_under_contention() {
    let mut engine = engine(10_000);

    let ids: Vec<OrderId> = (0..500)
        .map(|_| engine.add_order(7, 10_000, Side::Bid).unwrap())
        .collect();

    // Take them one slice at a time and check who is left at the front
    for (chunk, expected_front) in [(70u32, 10usize), (35, 15), (700, 115)] {
        engine.submit(OrderType::Market, Side::Ask, chunk, None).unwrap();
        let front = engine.level(Side::Bid, 10_000).unwrap().orders().next().unwrap();
        assert_eq!(front.id, ids[expected_front]);
        assert_eq!(front.qty, 7);
    }

    // The lazily drained prefix stays bounded
    let threshold = engine.config().compaction_threshold;
    let level = engine.book().get_level(Side::Bid, 10_000).unwrap();
    assert_eq!(level.len(), 385);
    assert!(level.dead_prefix() <= threshold.max(level.len()));
    assert!(engine.audit().is_ok());
}

#[test]
fn test_dead_prefix_is_compacted() {
    let mut engine = engine(10_000);
    let threshold = engine.config().compaction_threshold;

    for _ in 0..4 * threshold {
        engine.add_order(1, 10_000, Side::Ask).unwrap();
    }

    // Fill one at a time; every pop leaves dead <= max(threshold, live)
    for filled in 1..=3 * threshold {
        engine.submit(OrderType::Market, Side::Bid, 1, None).unwrap();
        let level = engine.book().get_level(Side::Ask, 10_000).unwrap();
        let live = 4 * threshold - filled;
        assert_eq!(level.len(), live);
        assert!(level.dead_prefix() <= threshold.max(live));
    }

    let level = engine.book().get_level(Side::Ask, 10_000).unwrap();
    let dead = level.dead_prefix();
    assert_eq!(engine.compact_level(Side::Ask, 10_000), dead);
    assert_eq!(
        engine.book().get_level(Side::Ask, 10_000).unwrap().dead_prefix(),
        0
    );
    assert_eq!(engine.level(Side::Ask, 10_000).unwrap().order_count(), threshold);
}

// ============================================================================
// Churn Stress Tests
// ============================================================================

#[test]
fn test_rapid_add_cancel_cycles() {
    let mut engine = engine(100);
    let before = engine.state_hash();

    for cycle in 0..10_000 {
        let price = 9_000 + (cycle % 2_001);
        let id = engine.add_order(1 + cycle as u32 % 50, price, Side::Bid).unwrap();
        assert!(engine.cancel_order(id));
    }

    assert!(engine.is_empty());
    assert_eq!(engine.arena().allocated(), 0);
    assert_eq!(engine.best_bid(), None);
    assert_eq!(engine.state_hash(), before);
}

#[test]
fn test_rapid_match_cycles() {
    let mut engine = engine(100);

    for cycle in 0..10_000u64 {
        engine.add_order(10, 10_000, Side::Ask).unwrap();
        let exec = engine.submit(OrderType::Market, Side::Bid, 10, None).unwrap();
        assert_eq!(exec.units_transacted, 10, "cycle {}", cycle);
    }

    assert!(engine.is_empty());
    assert_eq!(engine.arena().next_id(), 10_001);
}

#[test]
fn test_engine_command_churn() {
    let mut engine = Engine::new(BookConfig::with_range(9_000, 11_000, 64)).unwrap();

    for _ in 0..5_000 {
        let outcome = engine.process_command(Command::Add(AddOrder {
            side: Side::Ask,
            price: 10_250,
            qty: 3,
        }));
        let Outcome::Rested(order_id) = outcome else {
            panic!("Expected Rested, got {outcome:?}");
        };
        assert_eq!(
            engine.process_command(Command::Cancel(CancelOrder { order_id })),
            Outcome::Canceled { order_id, found: true }
        );
    }

    assert_eq!(engine.order_count(), 0);
}

// ============================================================================
// Edge Case Tests
// ============================================================================

#[test]
fn test_ladder_bounds() {
    let mut engine = engine(100);

    assert!(engine.add_order(1, 9_000, Side::Bid).is_ok());
    assert!(engine.add_order(1, 11_000, Side::Ask).is_ok());
    assert!(matches!(
        engine.add_order(1, 8_999, Side::Bid),
        Err(BookError::OutOfRange { tick: 8_999, .. })
    ));
    assert!(matches!(
        engine.submit(OrderType::Limit, Side::Ask, 1, Some(11_001)),
        Err(BookError::OutOfRange { tick: 11_001, .. })
    ));

    // Sweeping the whole ladder in one limit order
    let exec = engine
        .submit(OrderType::Limit, Side::Bid, 2, Some(11_000))
        .unwrap();
    assert_eq!(exec.units_transacted, 1);
    assert_eq!(engine.best_bid(), Some(11_000));
    assert_eq!(engine.best_ask(), None);
}

#[test]
fn test_max_quantity() {
    let mut engine = engine(100);

    engine.add_order(u32::MAX, 11_000, Side::Ask).unwrap();
    engine.add_order(u32::MAX, 11_000, Side::Ask).unwrap();

    let exec = engine
        .submit(OrderType::Market, Side::Bid, u32::MAX, None)
        .unwrap();
    assert_eq!(exec.units_transacted, u32::MAX as u64);
    assert_eq!(exec.notional_value, u32::MAX as i64 * 11_000);
    assert_eq!(engine.total_quantity(Side::Ask), u32::MAX as u64);
}

#[test]
fn test_many_price_levels() {
    let mut engine = engine(10_000);

    for price in 9_000..=11_000 {
        engine.add_order(1, price, Side::Ask).unwrap();
    }
    assert_eq!(engine.levels(Side::Ask).count(), 2_001);

    let exec = engine.submit(OrderType::Market, Side::Bid, 2_001, None).unwrap();
    assert_eq!(exec.units_transacted, 2_001);
    assert_eq!(exec.notional_value, (9_000..=11_000).map(i64::from).sum::<i64>());
    assert!(engine.is_empty());
}

#[test]
fn test_cancel_during_partial_fill() {
    let mut engine = engine(100);

    let id = engine.add_order(100, 10_000, Side::Ask).unwrap();
    engine.submit(OrderType::Market, Side::Bid, 60, None).unwrap();
    assert_eq!(engine.order(id).unwrap().qty, 40);

    assert!(engine.cancel_order(id));
    assert!(!engine.cancel_order(id));
    assert!(engine.level(Side::Ask, 10_000).is_none());
}

#[test]
fn test_self_trade_allowed() {
    let mut engine = engine(100);

    engine.add_order(100, 10_000, Side::Ask).unwrap();
    let exec = engine
        .submit(OrderType::Limit, Side::Bid, 100, Some(10_000))
        .unwrap();
    assert_eq!(exec.units_transacted, 100);
}

// ============================================================================
// Random Workload
// ============================================================================

#[test]
fn test_large_random_workload() {
    const OPS: usize = 50_000;
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);
    let mut engine = engine(2_000);
    let mut ids: Vec<OrderId> = Vec::new();

    for op in 0..OPS {
        let side = if rng.gen_bool(0.5) { Side::Bid } else { Side::Ask };
        match rng.gen_range(0..10) {
            0..=4 => {
                let price = rng.gen_range(9_900..=10_100);
                let qty = rng.gen_range(1..=100);
                match engine.submit(OrderType::Limit, side, qty, Some(price)) {
                    Ok(exec) => ids.extend(exec.resting_id),
                    Err(BookError::CapacityExceeded { .. }) => {}
                    Err(err) => panic!("op {op}: unexpected {err}"),
                }
            }
            5 => {
                engine
                    .submit(OrderType::Market, side, rng.gen_range(1..=300), None)
                    .unwrap();
            }
            6 | 7 if !ids.is_empty() => {
                let id = ids.swap_remove(rng.gen_range(0..ids.len()));
                engine.cancel_order(id);
            }
            _ if !ids.is_empty() => {
                let id = ids[rng.gen_range(0..ids.len())];
                engine.modify_order(id, rng.gen_range(0..=100));
            }
            _ => {}
        }

        if op % 1_000 == 0 {
            engine.audit().unwrap();
        }
    }

    engine.audit().unwrap();
    if let (Some(bid), Some(ask)) = (engine.best_bid(), engine.best_ask()) {
        assert!(bid < ask, "book is crossed: {bid} >= {ask}");
    }
}
