use std::error::Error;
use std::fmt::Write as _;

use clap::{Parser, ValueEnum};
use tick_ladder::{BookConfig, MatchingEngine, OrderType, Side, Tick};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Print the book as a price ladder, optionally after sending one order.
#[derive(Debug, Parser)]
#[command(name = "ladder-view")]
struct Args {
    /// Seed the book with a few random bids ($90-$100) and asks ($100-$110)
    #[arg(long)]
    dummies: bool,

    /// Arena capacity
    #[arg(long, default_value_t = 10_000)]
    capacity: u32,

    /// Order type to submit after seeding
    #[arg(long, value_enum)]
    order_type: Option<Kind>,

    /// Side of the submitted order
    #[arg(long, value_enum, default_value_t = Dir::Buy)]
    side: Dir,

    /// Quantity of the submitted order
    #[arg(long, default_value_t = 100)]
    qty: u32,

    /// Limit price in cents
    #[arg(long)]
    price: Option<Tick>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Market,
    Limit,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Dir {
    Buy,
    Sell,
}

fn seed_dummies(engine: &mut MatchingEngine) -> Result<(), Box<dyn Error>> {
    let mut state: u64 = 12;
    let mut next = move |modulo: u64| {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (state >> 33) % modulo
    };

    for (side, base) in [(Side::Bid, 9_000), (Side::Ask, 10_000)] {
        for _ in 0..3 {
            let price = base + next(1_001) as Tick;
            engine.add_order(next(100) as u32 + 1, price, side)?;
            engine.add_order(next(100) as u32 + 1, price, side)?;
        }
    }
    Ok(())
}

fn render_level(out: &mut String, price: Tick, qty: u64, color: &str) {
    let bar = "█".repeat((qty / 10) as usize);
    let _ = writeln!(
        out,
        "\t\x1b[1;{color}m${:>8.2}{qty:>6}\x1b[0m {bar}",
        price as f64 / 100.0
    );
}

/// Asks worst to best, the spread, then bids best to worst.
fn render(engine: &MatchingEngine) -> String {
    let mut out = String::from("========== Orderbook =========\n");

    let asks: Vec<_> = engine.levels(Side::Ask).map(|l| l.summary()).collect();
    for level in asks.iter().rev() {
        render_level(&mut out, level.price, level.total_qty, "31");
    }

    match (engine.best_price(Side::Bid), engine.best_price(Side::Ask)) {
        (Some(bid), Some(ask)) => {
            let bps = 10_000.0 * (ask - bid) as f64 / bid as f64;
            let _ = writeln!(out, "\n\x1b[1;33m======  {bps:.1}bps  ======\x1b[0m\n");
        }
        _ => {
            let _ = writeln!(out, "\n\x1b[1;33m======  one-sided  ======\x1b[0m\n");
        }
    }

    for level in engine.levels(Side::Bid) {
        render_level(&mut out, level.price(), level.total_qty(), "32");
    }
    out.push_str("==============================\n");
    out
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut engine = MatchingEngine::new(BookConfig::with_capacity(args.capacity))?;

    if args.dummies {
        seed_dummies(&mut engine)?;
    }
    print!("{}", render(&engine));

    if let Some(kind) = args.order_type {
        let order_type = match kind {
            Kind::Market => OrderType::Market,
            Kind::Limit => OrderType::Limit,
        };
        let side = match args.side {
            Dir::Buy => Side::Bid,
            Dir::Sell => Side::Ask,
        };

        let exec = engine.submit(order_type, side, args.qty, args.price)?;
        info!(?exec, "order submitted");
        println!(
            "\nFilled {} units, notional {} (avg {})\n",
            exec.units_transacted,
            exec.notional_value,
            exec.average_price()
                .map_or_else(|| "-".to_string(), |p| format!("{:.2}", p / 100.0))
        );
        print!("{}", render(&engine));
    }

    Ok(())
}
