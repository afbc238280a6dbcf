//! Engine - single-writer command loop with CPU pinning and warm-up.
//!
//! The matching engine does no locking of its own. Producers that share a
//! book hand their requests to one `Engine`, which applies them strictly in
//! arrival order (via rtrb ring buffers with the `runtime` feature).

use tracing::{debug, info};

use crate::command::{Command, Outcome};
use crate::config::BookConfig;
use crate::error::BookResult;
use crate::matching::MatchingEngine;

/// The main engine that processes commands from a ring buffer.
pub struct Engine {
    /// The underlying matching engine
    pub matcher: MatchingEngine,
}

impl Engine {
    /// Create a new engine for the given book configuration.
    pub fn new(config: BookConfig) -> BookResult<Self> {
        Ok(Self {
            matcher: MatchingEngine::new(config)?,
        })
    }

    /// Run the engine event loop.
    ///
    /// # Arguments
    /// * `input` - Consumer end of the command ring buffer
    /// * `output` - Producer end of the outcome ring buffer
    /// * `pin_to_core` - Whether to pin to the last available CPU core
    ///
    /// # Note
    /// This function runs forever (until the program terminates).
    #[cfg(feature = "runtime")]
    pub fn run(
        &mut self,
        input: &mut rtrb::Consumer<Command>,
        output: &mut rtrb::Producer<Outcome>,
        pin_to_core: bool,
    ) {
        if pin_to_core {
            self.pin_to_core();
        }

        self.warm_up();

        // Main event loop (busy-wait)
        loop {
            while let Ok(cmd) = input.pop() {
                let outcome = self.process_command(cmd);
                // Best effort - drop if full
                if output.push(outcome).is_err() {
                    debug!("outcome ring full, dropping outcome");
                }
            }
            std::hint::spin_loop();
        }
    }

    /// Apply a single command.
    ///
    /// This is the main entry point for synchronous usage (testing, benchmarks).
    #[inline]
    pub fn process_command(&mut self, cmd: Command) -> Outcome {
        let result = match cmd {
            Command::Submit(o) => self
                .matcher
                .submit(o.order_type, o.side, o.qty, o.price)
                .map(Outcome::Executed),
            Command::Add(o) => self
                .matcher
                .add_order(o.qty, o.price, o.side)
                .map(Outcome::Rested),
            Command::Modify(m) => Ok(Outcome::Modified {
                order_id: m.order_id,
                found: self.matcher.modify_order(m.order_id, m.new_qty),
            }),
            Command::Cancel(c) => Ok(Outcome::Canceled {
                order_id: c.order_id,
                found: self.matcher.cancel_order(c.order_id),
            }),
        };

        result.unwrap_or_else(|err| {
            debug!(?cmd, %err, "command rejected");
            Outcome::Rejected(err)
        })
    }

    /// Pin the current thread to the last available CPU core.
    ///
    /// The last core is typically isolated from OS interrupts.
    pub fn pin_to_core(&self) {
        if let Some(last_core) = core_affinity::get_core_ids().and_then(|ids| ids.last().copied()) {
            if core_affinity::set_for_current(last_core) {
                info!(core = last_core.id, "engine pinned");
            }
        }
    }

    /// Warm up the engine by pre-faulting memory pages.
    pub fn warm_up(&mut self) {
        self.matcher.warm_up();
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.matcher.order_count()
    }

    /// Compute state hash for determinism testing.
    #[inline]
    pub fn state_hash(&self) -> u64 {
        self.matcher.state_hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{AddOrder, CancelOrder, ModifyOrder, OrderType, Side, SubmitOrder};
    use crate::error::BookError;

    fn engine() -> Engine {
        Engine::new(BookConfig::with_range(9_000, 11_000, 1000)).unwrap()
    }

    #[test]
    fn test_engine_creation() {
        let engine = engine();
        assert_eq!(engine.order_count(), 0);
        assert_eq!(engine.matcher.best_bid(), None);
    }

    #[test]
    fn test_engine_add_modify_cancel() {
        let mut engine = engine();

        let outcome = engine.process_command(Command::Add(AddOrder {
            side: Side::Bid,
            price: 10_000,
            qty: 100,
        }));
        let Outcome::Rested(order_id) = outcome else {
            panic!("Expected Rested, got {outcome:?}");
        };

        assert_eq!(
            engine.process_command(Command::Modify(ModifyOrder { order_id, new_qty: 40 })),
            Outcome::Modified { order_id, found: true }
        );
        assert_eq!(engine.matcher.order(order_id).unwrap().qty, 40);

        assert_eq!(
            engine.process_command(Command::Cancel(CancelOrder { order_id })),
            Outcome::Canceled { order_id, found: true }
        );
        assert_eq!(
            engine.process_command(Command::Cancel(CancelOrder { order_id })),
            Outcome::Canceled { order_id, found: false }
        );
        assert_eq!(engine.order_count(), 0);
    }

    #[test]
    fn test_engine_submit() {
        let mut engine = engine();
        engine.process_command(Command::Add(AddOrder {
            side: Side::Ask,
            price: 10_100,
            qty: 100,
        }));

        let outcome = engine.process_command(Command::Submit(SubmitOrder {
            order_type: OrderType::Market,
            side: Side::Bid,
            qty: 60,
            price: None,
        }));

        match outcome {
            Outcome::Executed(exec) => {
                assert_eq!(exec.units_transacted, 60);
                assert_eq!(exec.notional_value, 60 * 10_100);
            }
            other => panic!("Expected Executed, got {other:?}"),
        }
    }

    #[test]
    fn test_engine_rejection() {
        let mut engine = engine();
        let outcome = engine.process_command(Command::Add(AddOrder {
            side: Side::Bid,
            price: 20_000,
            qty: 1,
        }));
        assert!(matches!(outcome, Outcome::Rejected(BookError::OutOfRange { .. })));
    }

    #[test]
    fn test_engine_state_hash_determinism() {
        let mut engine1 = engine();
        let mut engine2 = engine();

        for i in 0..100 {
            let cmd = Command::Add(AddOrder {
                side: if i % 2 == 0 { Side::Bid } else { Side::Ask },
                price: if i % 2 == 0 { 9_900 - (i % 10) * 10 } else { 10_100 + (i % 10) * 10 },
                qty: 100,
            });
            engine1.process_command(cmd);
            engine2.process_command(cmd);
        }

        assert_eq!(engine1.state_hash(), engine2.state_hash());
    }

    #[test]
    fn test_engine_warm_up() {
        let mut engine = engine();
        engine.warm_up(); // Should not panic
    }
}
