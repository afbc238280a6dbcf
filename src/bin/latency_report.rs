use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use hdrhistogram::Histogram;
use serde::Serialize;
use tick_ladder::{BookConfig, MatchingEngine, OrderId, OrderType, Side};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Measure per-operation latency against a pre-populated book.
#[derive(Debug, Parser)]
#[command(name = "latency-report")]
struct Args {
    /// Operations to time, per kind
    #[arg(long, default_value_t = 100_000)]
    iterations: u64,

    /// Price levels to pre-populate
    #[arg(long, default_value_t = 10_000)]
    levels: u32,

    /// Orders per pre-populated level
    #[arg(long, default_value_t = 10)]
    orders_per_level: u32,

    /// Arena capacity
    #[arg(long, default_value_t = 1_000_000)]
    capacity: u32,

    /// PRNG seed
    #[arg(long, default_value_t = 12)]
    seed: u64,

    /// Write every sample to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct Sample {
    op: &'static str,
    nanos: u64,
}

/// Small LCG, good enough for synthetic order flow.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.0 >> 32
    }

    fn range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next() % (hi - lo + 1)
    }
}

const MIN_TEST_PRICE: u64 = 5_000; // $50.00
const MAX_TEST_PRICE: u64 = 150_000; // $1500.00

struct Recorder {
    histogram: Histogram<u64>,
    samples: Vec<Sample>,
    keep_samples: bool,
}

impl Recorder {
    fn new(keep_samples: bool) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            histogram: Histogram::new_with_bounds(1, 10_000_000, 3)?,
            samples: Vec::new(),
            keep_samples,
        })
    }

    fn record(&mut self, op: &'static str, started: Instant) {
        let nanos = started.elapsed().as_nanos() as u64;
        // Outliers above the bound are clamped rather than dropped
        self.histogram.saturating_record(nanos.max(1));
        if self.keep_samples {
            self.samples.push(Sample { op, nanos });
        }
    }

    fn report(&self, name: &str) {
        let h = &self.histogram;
        println!("\n=== {name} latency (ns) ===");
        println!("Samples: {}", h.len());
        println!("Min:    {:8}", h.min());
        println!("P50:    {:8}", h.value_at_quantile(0.50));
        println!("P90:    {:8}", h.value_at_quantile(0.90));
        println!("P99:    {:8}", h.value_at_quantile(0.99));
        println!("P99.9:  {:8}", h.value_at_quantile(0.999));
        println!("Max:    {:8}", h.max());
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut rng = Lcg(args.seed);
    let mut engine = MatchingEngine::new(BookConfig::with_capacity(args.capacity))?;
    engine.warm_up();

    // Pre-populate: even levels bid, odd levels ask, random prices
    let mut ids: Vec<OrderId> = Vec::new();
    for level in 0..args.levels {
        let price = rng.range(MIN_TEST_PRICE, MAX_TEST_PRICE) as i32;
        let side = if level % 2 == 0 { Side::Bid } else { Side::Ask };
        for _ in 0..args.orders_per_level {
            let qty = rng.range(100, 1_000) as u32;
            if let Ok(id) = engine.add_order(qty, price, side) {
                ids.push(id);
            }
        }
    }
    info!(orders = ids.len(), "book populated");
    println!("Created {} orders total.", ids.len());

    let keep = args.csv.is_some();
    let mut market = Recorder::new(keep)?;
    let mut limit = Recorder::new(keep)?;
    let mut modify = Recorder::new(keep)?;
    let mut cancel = Recorder::new(keep)?;

    for _ in 0..args.iterations {
        let side = if rng.next() % 2 == 0 { Side::Bid } else { Side::Ask };
        let qty = rng.range(100, 1_000) as u32;
        let started = Instant::now();
        std::hint::black_box(engine.submit(OrderType::Market, side, qty, None)?);
        market.record("market", started);

        let price = rng.range(MIN_TEST_PRICE, MAX_TEST_PRICE) as i32;
        let started = Instant::now();
        let exec = std::hint::black_box(engine.submit(OrderType::Limit, side, qty, Some(price)));
        limit.record("limit", started);
        if let Ok(exec) = exec {
            ids.extend(exec.resting_id);
        }

        if !ids.is_empty() {
            let id = ids[rng.next() as usize % ids.len()];
            let new_qty = rng.range(100, 1_000) as u32;
            let started = Instant::now();
            std::hint::black_box(engine.modify_order(id, new_qty));
            modify.record("modify", started);

            let idx = rng.next() as usize % ids.len();
            let id = ids.swap_remove(idx);
            let started = Instant::now();
            std::hint::black_box(engine.cancel_order(id));
            cancel.record("cancel", started);
        }
    }

    market.report("Market order");
    limit.report("Limit order");
    modify.report("Modify");
    cancel.report("Cancel");
    println!("\nResting orders at end: {}", engine.order_count());

    if let Some(path) = args.csv {
        let mut writer = csv::Writer::from_path(&path)?;
        for recorder in [&market, &limit, &modify, &cancel] {
            for sample in &recorder.samples {
                writer.serialize(sample)?;
            }
        }
        writer.flush()?;
        info!(path = %path.display(), "samples written");
    }

    Ok(())
}
