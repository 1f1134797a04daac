//! Property tests for the indicator math and strategy state machines

use chrono::Utc;
use proptest::prelude::*;

use stratagem::data::Candle;
use stratagem::indicators::{ema, rsi};
use stratagem::prelude::*;
use stratagem::strategy::presets;
use stratagem::strategy::Strategy;

fn candles_from(closes: &[f64]) -> Vec<Candle> {
    let start = Utc::now();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            Candle::new(
                close,
                close,
                close,
                close,
                1_000.0,
                start + chrono::Duration::minutes(i as i64),
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn rsi_stays_in_bounds(closes in prop::collection::vec(1.0f64..1_000.0, 16..64)) {
        let candles = candles_from(&closes);
        if let Some(value) = rsi(&candles, 14) {
            prop_assert!((0.0..=100.0).contains(&value), "RSI {} out of bounds", value);
        }
    }

    #[test]
    fn ema_of_constant_is_constant(value in 1.0f64..10_000.0, len in 5usize..50) {
        let series = vec![value; len];
        for out in ema(&series, 5) {
            prop_assert!((out - value).abs() < 1e-9);
        }
    }

    #[test]
    fn ema_stays_within_input_range(closes in prop::collection::vec(1.0f64..1_000.0, 10..60)) {
        let min = closes.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = closes.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        for out in ema(&closes, 8) {
            prop_assert!(out >= min - 1e-9 && out <= max + 1e-9);
        }
    }

    #[test]
    fn ladder_level_count_is_bounded(
        drops in prop::collection::vec(0.001f64..0.2, 1..30),
        max_levels in 1usize..8,
    ) {
        let mut config = presets::reverse_ratio();
        config.max_levels = max_levels;
        let mut strategy = LadderStrategy::new("reverse_ratio", config).unwrap();

        let mut closes = vec![100.0f64; 20];
        let mut price = 100.0;
        for drop in drops {
            price *= 1.0 - drop;
            closes.push(price);
            let candles = candles_from(&closes);
            strategy.analyze(&candles, price);
            prop_assert!(strategy.current_level() <= max_levels);
        }
    }

    #[test]
    fn ladder_never_sells_while_idle(closes in prop::collection::vec(50.0f64..150.0, 21..60)) {
        let mut strategy = LadderStrategy::new("reverse_ratio", presets::reverse_ratio()).unwrap();
        let candles = candles_from(&closes);
        // without any synced entry the very first signal cannot be a sell
        let signal = strategy.analyze(&candles, *closes.last().unwrap());
        prop_assert!(signal.kind != SignalKind::Sell);
    }

    #[test]
    fn signal_strength_is_always_normalized(
        closes in prop::collection::vec(50.0f64..150.0, 21..60),
    ) {
        let mut strategy = LadderStrategy::new("reverse_ratio", presets::reverse_ratio()).unwrap();
        let candles = candles_from(&closes);
        let signal = strategy.analyze(&candles, *closes.last().unwrap());
        prop_assert!((0.0..=1.0).contains(&signal.strength));
    }
}

#[test]
fn grid_levels_evenly_spaced_for_any_band() {
    for (lower, upper, count) in [(10.0, 20.0, 2), (1.0, 2.0, 10), (55.5, 250.0, 37)] {
        let mut config = presets::grid();
        config.grid_levels = count;
        config.lower_bound = Some(lower);
        config.upper_bound = Some(upper);
        let mut grid = GridStrategy::new("grid", config).unwrap();

        let candles = candles_from(&vec![lower; 25]);
        grid.analyze(&candles, (lower + upper) / 2.0);

        let levels = grid.levels();
        assert_eq!(levels.len(), count);
        let step = (upper - lower) / (count - 1) as f64;
        for (i, pair) in levels.windows(2).enumerate() {
            assert!(pair[1].price > pair[0].price);
            let gap = pair[1].price - pair[0].price;
            assert!(
                (gap - step).abs() < 1e-9 * upper,
                "level {} gap {} differs from step {}",
                i,
                gap,
                step
            );
        }
    }
}
