//! Paper-trading demo: drive a ladder strategy over a synthetic dip-and-recover
//! price path and narrate every decision.
//!
//! Run with `cargo run --example paper_trading`.

use anyhow::Result;
use chrono::{Duration, Utc};
use serde_json::json;

use stratagem::prelude::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let registry = StrategyRegistry::new();
    let params = json!({ "max_levels": 3, "base_size": 5.0 });
    let mut strategy = registry.create("reverse_ratio", Some(&params))?;

    // 30 flat candles, a two-leg dip, then a recovery past the profit target
    let mut path = vec![100.0; 30];
    path.extend([97.0, 94.5, 92.0, 89.5, 91.0, 95.0, 99.0, 103.0, 107.5]);

    let start = Utc::now();
    let mut candles: Vec<Candle> = Vec::new();
    let mut balance = PortfolioBalance::new(10_000.0);
    let mut held: Vec<Position> = Vec::new();

    for (i, price) in path.iter().copied().enumerate() {
        candles.push(Candle::new(
            price,
            price * 1.002,
            price * 0.998,
            price,
            1_500.0,
            start + Duration::minutes(i as i64 * 5),
        ));

        let signal = strategy.analyze(&candles, price);
        match signal.kind {
            SignalKind::Buy => {
                let size = strategy.calculate_position_size(balance.usd, &signal, price);
                if size > 0.0 && balance.can_afford(size * price) {
                    balance.usd -= size * price;
                    balance.btc_positions += size;
                    let mut position = Position::new(price, size, start);
                    position.track_high(price);
                    held.push(position);
                    println!("BUY  {:>8.4} @ {:>7.2}  ({})", size, price, signal.reason);
                }
            }
            SignalKind::Sell => {
                let size = signal
                    .size
                    .unwrap_or_else(|| held.iter().map(|p| p.size).sum());
                balance.usd += size * price;
                balance.btc_positions = (balance.btc_positions - size).max(0.0);
                if signal.is_complete_exit() {
                    held.clear();
                } else {
                    let mut remaining = size;
                    held.retain_mut(|p| {
                        let taken = p.size.min(remaining);
                        p.size -= taken;
                        remaining -= taken;
                        p.size > 1e-12
                    });
                }
                println!("SELL {:>8.4} @ {:>7.2}  ({})", size, price, signal.reason);
            }
            SignalKind::Hold => {}
        }

        for position in &mut held {
            position.track_high(price);
        }
        let held_units: f64 = held.iter().map(|p| p.size).sum();
        strategy.sync_positions(&held, held_units);
    }

    let final_price = *path.last().unwrap();
    let equity = balance.usd + held.iter().map(|p| p.value(final_price)).sum::<f64>();
    println!("---");
    println!(
        "final equity {:.2} (cash {:.2}, {} open positions)",
        equity,
        balance.usd,
        held.len()
    );
    Ok(())
}
