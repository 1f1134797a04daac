//! Indicator throughput benchmarks
//!
//! The engine recomputes indicators from the candle window on every tick,
//! so per-call cost over a ~100-candle window is the number that matters.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use stratagem::data::Candle;
use stratagem::indicators::{macd, rsi, volatility, vwap_bands};

fn window(len: usize) -> Vec<Candle> {
    let start = Utc::now();
    (0..len)
        .map(|i| {
            let price = 100.0 + ((i % 13) as f64 - 6.0) * 0.8;
            Candle::new(
                price,
                price + 0.5,
                price - 0.5,
                price,
                1_000.0 + (i % 7) as f64 * 50.0,
                start + chrono::Duration::minutes(i as i64),
            )
        })
        .collect()
}

fn bench_indicators(c: &mut Criterion) {
    let candles = window(100);

    c.bench_function("rsi_14_over_100", |b| {
        b.iter(|| rsi(black_box(&candles), 14))
    });

    c.bench_function("macd_12_26_9_over_100", |b| {
        b.iter(|| macd(black_box(&candles), 12, 26, 9))
    });

    c.bench_function("vwap_bands_20_over_100", |b| {
        b.iter(|| vwap_bands(black_box(&candles), 20, false, 2.0, 2.0))
    });

    c.bench_function("volatility_20_over_100", |b| {
        b.iter(|| volatility(black_box(&candles), 20))
    });
}

criterion_group!(benches, bench_indicators);
criterion_main!(benches);
