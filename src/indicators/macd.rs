//! MACD (Moving Average Convergence Divergence) indicator
//!
//! macd_line = EMA(close, fast) - EMA(close, slow), tail-aligned;
//! signal_line = EMA(macd_line, signal_period).

use crate::data::{closes, Candle};
use crate::indicators::ema;

/// MACD output series, both aligned to the end of the candle window
#[derive(Debug, Clone)]
pub struct MacdOutput {
    /// EMA(fast) - EMA(slow)
    pub macd_line: Vec<f64>,
    /// EMA of the MACD line
    pub signal_line: Vec<f64>,
}

impl MacdOutput {
    /// Latest MACD line value
    pub fn latest(&self) -> Option<f64> {
        self.macd_line.last().copied()
    }

    /// Latest signal line value
    pub fn latest_signal(&self) -> Option<f64> {
        self.signal_line.last().copied()
    }

    /// Absolute gap between the latest MACD and signal values
    pub fn gap(&self) -> Option<f64> {
        Some((self.latest()? - self.latest_signal()?).abs())
    }

    /// MACD line crossed above the signal line on the latest step
    pub fn crossed_above(&self) -> bool {
        self.crossing().is_some_and(|(prev, curr)| prev <= 0.0 && curr > 0.0)
    }

    /// MACD line crossed below the signal line on the latest step
    pub fn crossed_below(&self) -> bool {
        self.crossing().is_some_and(|(prev, curr)| prev >= 0.0 && curr < 0.0)
    }

    /// (previous, current) MACD-minus-signal differences, when two steps exist
    fn crossing(&self) -> Option<(f64, f64)> {
        let n = self.signal_line.len();
        if n < 2 {
            return None;
        }
        // signal_line is tail-aligned with macd_line
        let m = self.macd_line.len();
        let curr = self.macd_line[m - 1] - self.signal_line[n - 1];
        let prev = self.macd_line[m - 2] - self.signal_line[n - 2];
        Some((prev, curr))
    }
}

/// MACD over the candle window.
///
/// `macd_line.len() == min(ema_fast.len(), ema_slow.len())`; both output
/// series are empty when the window cannot seed the slow EMA.
pub fn macd(candles: &[Candle], fast: usize, slow: usize, signal: usize) -> MacdOutput {
    let close_prices = closes(candles);
    let ema_fast = ema(&close_prices, fast);
    let ema_slow = ema(&close_prices, slow);

    let len = ema_fast.len().min(ema_slow.len());
    let macd_line: Vec<f64> = ema_fast[ema_fast.len() - len..]
        .iter()
        .zip(&ema_slow[ema_slow.len() - len..])
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&macd_line, signal);

    MacdOutput {
        macd_line,
        signal_line,
    }
}
