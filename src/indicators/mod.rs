//! Technical indicators module
//!
//! Pure, deterministic functions over candle windows. Every function copes
//! with short windows by returning a sentinel (`None` / empty vec / default)
//! rather than erroring; strategies translate that into `hold`.

pub mod divergence;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod volatility;
pub mod vwap;

pub use divergence::*;
pub use ema::*;
pub use macd::*;
pub use rsi::*;
pub use volatility::*;
pub use vwap::*;

/// Arithmetic mean of a slice (0.0 when empty)
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation of a slice (0.0 when fewer than 2 values)
pub(crate) fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
