//! OHLCV candle data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle data
///
/// Candles are produced outside the engine and consumed ascending by time.
/// The engine never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    /// Opening price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Volume
    pub volume: f64,
    /// Timestamp (open time, UTC)
    pub timestamp: DateTime<Utc>,
}

impl Candle {
    /// Create a new candle
    pub fn new(
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
            timestamp,
        }
    }

    /// Get typical price (HLC/3)
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Check if candle is bullish
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Get total range (high - low)
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Extract close prices from a candle window
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Highest high over the trailing `lookback` candles (0.0 on an empty window)
pub fn recent_high(candles: &[Candle], lookback: usize) -> f64 {
    let start = candles.len().saturating_sub(lookback);
    candles[start..]
        .iter()
        .fold(0.0_f64, |acc, c| acc.max(c.high).max(c.close))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Utc;

    #[test]
    fn candle_helpers() {
        let candle = Candle::new(100.0, 110.0, 95.0, 105.0, 1_000.0, Utc::now());
        assert_relative_eq!(candle.typical_price(), (110.0 + 95.0 + 105.0) / 3.0);
        assert_relative_eq!(candle.range(), 15.0);
        assert!(candle.is_bullish());
        assert!(!Candle::new(105.0, 110.0, 95.0, 100.0, 1_000.0, Utc::now()).is_bullish());
    }

    #[test]
    fn recent_high_respects_lookback() {
        let start = Utc::now();
        let candles: Vec<Candle> = [120.0, 100.0, 101.0, 102.0]
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                Candle::new(p, p, p, p, 1_000.0, start + chrono::Duration::minutes(i as i64))
            })
            .collect();

        // the 120 print falls outside a 3-candle lookback
        assert_relative_eq!(recent_high(&candles, 3), 102.0);
        assert_relative_eq!(recent_high(&candles, 10), 120.0);
        assert_eq!(recent_high(&[], 5), 0.0);
    }
}
