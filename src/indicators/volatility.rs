//! Close-to-close volatility
//!
//! Standard deviation of fractional close-to-close returns over the trailing
//! window. Windows under 20 candles fall back to a 2% default so early grid
//! initialization still has a usable spread.

use crate::data::Candle;
use crate::indicators::stddev;

/// Fallback volatility for short windows
pub const DEFAULT_VOLATILITY: f64 = 0.02;

/// Volatility of the trailing `window` returns, as a fraction (0.02 = 2%).
pub fn volatility(candles: &[Candle], window: usize) -> f64 {
    if candles.len() < 20 || window < 2 {
        return DEFAULT_VOLATILITY;
    }

    let start = candles.len().saturating_sub(window + 1);
    let returns: Vec<f64> = candles[start..]
        .windows(2)
        .filter(|pair| pair[0].close != 0.0)
        .map(|pair| (pair[1].close - pair[0].close) / pair[0].close)
        .collect();

    if returns.len() < 2 {
        return DEFAULT_VOLATILITY;
    }
    stddev(&returns)
}
