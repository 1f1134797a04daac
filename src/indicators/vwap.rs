//! VWAP (Volume-Weighted Average Price) with deviation bands
//!
//! VWAP = sum(typical_price * volume) / sum(volume) over the window, where
//! typical price is (high + low + close) / 3. Bands sit a configurable
//! number of typical-price standard deviations above and below.

use chrono::{DateTime, Timelike, Utc};

use crate::data::Candle;
use crate::indicators::stddev;

/// VWAP and its deviation bands
#[derive(Debug, Clone, Copy)]
pub struct VwapBands {
    pub vwap: f64,
    /// vwap + stddev * deviation_sell
    pub upper: f64,
    /// vwap - stddev * deviation_buy
    pub lower: f64,
}

/// VWAP bands over the trailing `period` candles, or since the latest UTC
/// midnight when `anchored`.
///
/// `None` when the window is empty or carries no volume.
pub fn vwap_bands(
    candles: &[Candle],
    period: usize,
    anchored: bool,
    deviation_buy: f64,
    deviation_sell: f64,
) -> Option<VwapBands> {
    let window = if anchored {
        anchored_window(candles)?
    } else {
        if period == 0 || candles.is_empty() {
            return None;
        }
        &candles[candles.len().saturating_sub(period)..]
    };

    let total_volume: f64 = window.iter().map(|c| c.volume).sum();
    if total_volume <= 0.0 {
        return None;
    }

    let weighted: f64 = window.iter().map(|c| c.typical_price() * c.volume).sum();
    let vwap = weighted / total_volume;

    let typicals: Vec<f64> = window.iter().map(|c| c.typical_price()).collect();
    let sd = stddev(&typicals);

    Some(VwapBands {
        vwap,
        upper: vwap + sd * deviation_sell,
        lower: vwap - sd * deviation_buy,
    })
}

/// Candles at or after the latest UTC midnight of the final candle
fn anchored_window(candles: &[Candle]) -> Option<&[Candle]> {
    let last = candles.last()?;
    let midnight = midnight_utc(last.timestamp);
    let start = candles.partition_point(|c| c.timestamp < midnight);
    if start == candles.len() {
        return None;
    }
    Some(&candles[start..])
}

fn midnight_utc(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_hour(0)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn candle_at(hour: u32, price: f64, volume: f64) -> Candle {
        let ts = Utc.with_ymd_and_hms(2024, 3, 5, hour, 0, 0).unwrap();
        Candle::new(price, price, price, price, volume, ts)
    }

    #[test]
    fn empty_window_is_none() {
        assert!(vwap_bands(&[], 20, false, 2.0, 2.0).is_none());
    }

    #[test]
    fn zero_volume_is_none() {
        let candles = vec![candle_at(1, 100.0, 0.0), candle_at(2, 101.0, 0.0)];
        assert!(vwap_bands(&candles, 20, false, 2.0, 2.0).is_none());
    }

    #[test]
    fn volume_weighting() {
        // 100 @ vol 1 and 200 @ vol 3 -> vwap 175
        let candles = vec![candle_at(1, 100.0, 1.0), candle_at(2, 200.0, 3.0)];
        let bands = vwap_bands(&candles, 20, false, 2.0, 2.0).unwrap();
        assert_relative_eq!(bands.vwap, 175.0);
    }

    #[test]
    fn bands_straddle_vwap() {
        let candles: Vec<Candle> = (1..=10)
            .map(|h| candle_at(h, 100.0 + h as f64, 5.0))
            .collect();
        let bands = vwap_bands(&candles, 10, false, 1.5, 2.5).unwrap();
        assert!(bands.lower < bands.vwap);
        assert!(bands.upper > bands.vwap);
        // asymmetric deviations produce asymmetric bands
        assert!(bands.upper - bands.vwap > bands.vwap - bands.lower);
    }

    #[test]
    fn anchored_ignores_prior_day() {
        let mut candles = vec![Candle::new(
            10.0,
            10.0,
            10.0,
            10.0,
            1000.0,
            Utc.with_ymd_and_hms(2024, 3, 4, 23, 0, 0).unwrap(),
        )];
        candles.push(candle_at(1, 100.0, 1.0));
        candles.push(candle_at(2, 102.0, 1.0));

        let bands = vwap_bands(&candles, 50, true, 2.0, 2.0).unwrap();
        // the 10.0 candle from the prior day must not drag the anchor down
        assert_relative_eq!(bands.vwap, 101.0);
    }
}
