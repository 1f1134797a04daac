//! End-to-end tests for the signal engine

use chrono::Utc;
use serde_json::json;

use stratagem::prelude::*;
use stratagem::strategy::presets;

/// Build a flat-price candle window ending in the given closes
fn candle_window(warmup: usize, base: f64, closes: &[f64]) -> Vec<Candle> {
    let start = Utc::now();
    let mut prices = vec![base; warmup];
    prices.extend_from_slice(closes);
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| {
            Candle::new(
                price,
                price,
                price,
                price,
                1_000.0,
                start + chrono::Duration::minutes(i as i64),
            )
        })
        .collect()
}

fn position(entry: f64, size: f64) -> Position {
    Position::new(entry, size, Utc::now())
}

#[test]
fn reverse_ratio_walkthrough() {
    // the canonical ladder walk: high 100, closes 95 / 90 / 107
    let registry = StrategyRegistry::new();
    let params = json!({
        "initial_drop_percent": 5.0,
        "level_drop_percent": 5.0,
        "max_levels": 3,
        "profit_target_percent": 7.0,
    });
    let mut strategy = registry.create("reverse_ratio", Some(&params)).unwrap();

    let balance = 10_000.0;
    let mut held: Vec<Position> = Vec::new();

    // 95: about 5% below the 100 high -> first entry
    let candles = candle_window(20, 100.0, &[95.0]);
    let signal = strategy.analyze(&candles, 95.0);
    assert_eq!(signal.kind, SignalKind::Buy);
    let size = strategy.calculate_position_size(balance, &signal, 95.0);
    assert!(size > 0.0);
    held.push(position(95.0, size));
    strategy.sync_positions(&held, held.iter().map(|p| p.size).sum());

    // 90: ~5.3% below the level-1 price -> second entry
    let candles = candle_window(20, 100.0, &[95.0, 90.0]);
    let signal = strategy.analyze(&candles, 90.0);
    assert_eq!(signal.kind, SignalKind::Buy);
    let size = strategy.calculate_position_size(balance, &signal, 90.0);
    assert!(size > 0.0);
    held.push(position(90.0, size));
    let total: f64 = held.iter().map(|p| p.size).sum();
    strategy.sync_positions(&held, total);

    // 107 >= 95 * 1.07 -> the whole ladder exits at once
    let candles = candle_window(20, 100.0, &[95.0, 90.0, 107.0]);
    let signal = strategy.analyze(&candles, 107.0);
    assert_eq!(signal.kind, SignalKind::Sell);
    assert!(signal.is_complete_exit());
    assert!((signal.size.unwrap() - total).abs() < 1e-9);

    // the caller closes out and reports empty: the machine re-arms
    held.clear();
    strategy.sync_positions(&held, 0.0);
    let candles = candle_window(20, 100.0, &[95.0, 90.0, 107.0, 101.0]);
    let signal = strategy.analyze(&candles, 101.0);
    assert_eq!(signal.kind, SignalKind::Buy, "fresh dip below the new high should re-enter");
}

#[test]
fn committed_value_never_exceeds_cap() {
    let mut strategy =
        LadderStrategy::new("reverse_ratio", presets::reverse_ratio()).unwrap();
    let cap_percent = strategy.config().max_position_percent;
    let balance = 10_000.0;
    let mut held: Vec<Position> = Vec::new();
    let mut committed = 0.0;

    let mut closes = Vec::new();
    let mut price = 100.0;
    for _ in 0..12 {
        price *= 0.94;
        closes.push(price);
        let candles = candle_window(20, 100.0, &closes);
        let signal = strategy.analyze(&candles, price);
        if signal.kind == SignalKind::Buy {
            let size = strategy.calculate_position_size(balance, &signal, price);
            committed += size * price;
            assert!(
                committed <= cap_percent / 100.0 * balance + 1e-6,
                "committed {} breached the {}% cap",
                committed,
                cap_percent
            );
            if size > 0.0 {
                held.push(position(price, size));
                strategy.sync_positions(&held, held.iter().map(|p| p.size).sum());
            }
        }
    }
}

#[test]
fn grid_buy_sell_walkthrough() {
    let registry = StrategyRegistry::new();
    let params = json!({
        "grid_levels": 10,
        "lower_bound": 50.0,
        "upper_bound": 95.0,
    });
    let mut strategy = registry.create("grid", Some(&params)).unwrap();

    // initializing at the bottom of the band seeds no inventory
    let candles = candle_window(25, 50.0, &[50.0]);
    let init = strategy.analyze(&candles, 50.0);
    assert_eq!(init.kind, SignalKind::Hold);

    // falling through the 50 level buys it; rising back through sells it
    let buy = strategy.analyze(&candles, 44.9);
    assert_eq!(buy.kind, SignalKind::Buy);
    strategy.on_trade_executed(&buy.clone().with_size(1.0));

    let sell = strategy.analyze(&candles, 50.1);
    assert_eq!(sell.kind, SignalKind::Sell);
    assert!((sell.size.unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn scalping_exits_through_trait_object() {
    let registry = StrategyRegistry::new();
    let strategy = registry.create("momentum_scalp", None).unwrap();

    let pos = position(100.0, 1.0);
    assert!(strategy.should_stop_loss(&pos, 98.9));
    assert!(!strategy.should_stop_loss(&pos, 99.5));
    assert!(strategy.should_take_profit(&pos, 101.6));
    assert!(!strategy.should_take_profit(&pos, 100.5));
}

#[test]
fn every_builtin_holds_gracefully_on_empty_feed() {
    let registry = StrategyRegistry::new();
    for identifier in registry.available() {
        let mut strategy = registry.create(&identifier, None).unwrap();
        let signal = strategy.analyze(&[], 100.0);
        assert_eq!(
            signal.kind,
            SignalKind::Hold,
            "{} must hold on an empty window",
            identifier
        );
        assert_eq!(strategy.calculate_position_size(10_000.0, &signal, 100.0), 0.0);
    }
}

#[test]
fn registry_lists_builtins() {
    let registry = StrategyRegistry::new();
    let available = registry.available();
    for expected in [
        "dca",
        "grid",
        "micro_scalp",
        "momentum_scalp",
        "nano_scalp",
        "reverse_ratio",
        "reverse_ratio_aggressive",
        "vwap_scalp",
    ] {
        assert!(available.iter().any(|n| n == expected), "missing {}", expected);
    }
}
