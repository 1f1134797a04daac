//! Scalping strategies: multi-indicator confidence scoring
//!
//! A buy wants three things at once: MACD crossing above its signal line,
//! RSI in oversold territory, and (unless the trend filter is off) the fast
//! EMA above the slow one. Sells mirror it. Confidence starts at 50 and
//! earns tiered bonuses for RSI extremity and MACD-gap magnitude; position
//! size scales with the final score.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::{closes, Candle};
use crate::error::Error;
use crate::indicators::{divergence, ema, macd, rsi, vwap_bands, Divergence};
use crate::portfolio::Position;
use crate::strategy::events::{ObserverSlot, StrategyEvent, StrategyObserver};
use crate::strategy::{Signal, SignalKind, Strategy};
use crate::Result;

/// Rolling indicator history kept for confirmation/divergence checks
const HISTORY_LIMIT: usize = 100;

/// Divergence lookback, in ticks
const DIVERGENCE_LOOKBACK: usize = 10;

/// Scalping strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalpingConfig {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
    /// Require the fast EMA above/below the slow one for buys/sells
    pub use_trend_filter: bool,
    /// Reject signals when candle volume * price is below this (quote units)
    pub min_volume: f64,
    /// Base position size, % of balance; scaled by confidence
    pub position_percent: f64,
    pub max_open_positions: usize,
    /// Cumulative committed value cap, % of balance
    pub max_position_percent: f64,
    pub stop_loss_percent: f64,
    pub profit_target_percent: f64,
    /// Trail this % below the position's highest price once in profit
    #[serde(default)]
    pub trailing_stop_percent: Option<f64>,
    /// Require price outside the VWAP bands for entries/exits
    #[serde(default)]
    pub use_vwap_filter: bool,
    pub vwap_period: usize,
    #[serde(default)]
    pub vwap_anchored: bool,
    pub vwap_deviation_buy: f64,
    pub vwap_deviation_sell: f64,
    /// Grant a confidence bonus on confirming RSI/price divergence
    #[serde(default)]
    pub use_divergence: bool,
    /// Share of realized profit routed to the vault downstream
    #[serde(default = "default_vault_allocation")]
    pub vault_allocation: f64,
    /// Share of realized profit kept compounding downstream
    #[serde(default = "default_btc_growth_allocation")]
    pub btc_growth_allocation: f64,
}

fn default_vault_allocation() -> f64 {
    10.0
}

fn default_btc_growth_allocation() -> f64 {
    5.0
}

impl ScalpingConfig {
    /// Fail-fast validation; called at construction, never mid-tick.
    pub fn validate(&self) -> Result<()> {
        if self.rsi_period == 0 {
            return Err(Error::config("rsi_period must be positive"));
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(Error::config("rsi_oversold must be below rsi_overbought"));
        }
        if self.macd_fast == 0 || self.macd_signal == 0 || self.macd_fast >= self.macd_slow {
            return Err(Error::config("macd periods must satisfy 0 < fast < slow"));
        }
        if self.ema_fast == 0 || self.ema_fast >= self.ema_slow {
            return Err(Error::config("ema periods must satisfy 0 < fast < slow"));
        }
        if self.position_percent <= 0.0 {
            return Err(Error::config("position_percent must be positive"));
        }
        if self.max_open_positions == 0 {
            return Err(Error::config("max_open_positions must be at least 1"));
        }
        if self.max_position_percent <= 0.0 || self.max_position_percent > 100.0 {
            return Err(Error::config("max_position_percent must be in (0, 100]"));
        }
        if self.stop_loss_percent <= 0.0 {
            return Err(Error::config("stop_loss_percent must be positive"));
        }
        if self.profit_target_percent <= 0.0 {
            return Err(Error::config("profit_target_percent must be positive"));
        }
        if let Some(t) = self.trailing_stop_percent {
            if t <= 0.0 {
                return Err(Error::config("trailing_stop_percent must be positive"));
            }
        }
        if self.use_vwap_filter && self.vwap_period == 0 {
            return Err(Error::config("vwap_period must be positive"));
        }
        Ok(())
    }

    /// Merge caller parameters over this config; absent keys keep their values.
    pub fn merge_params(&mut self, params: &Value) -> Result<()> {
        let obj = params
            .as_object()
            .ok_or_else(|| Error::InvalidParams("expected a JSON object".into()))?;
        if let Some(v) = obj.get("rsi_period").and_then(Value::as_u64) {
            self.rsi_period = v as usize;
        }
        if let Some(v) = obj.get("rsi_oversold").and_then(Value::as_f64) {
            self.rsi_oversold = v;
        }
        if let Some(v) = obj.get("rsi_overbought").and_then(Value::as_f64) {
            self.rsi_overbought = v;
        }
        if let Some(v) = obj.get("macd_fast").and_then(Value::as_u64) {
            self.macd_fast = v as usize;
        }
        if let Some(v) = obj.get("macd_slow").and_then(Value::as_u64) {
            self.macd_slow = v as usize;
        }
        if let Some(v) = obj.get("macd_signal").and_then(Value::as_u64) {
            self.macd_signal = v as usize;
        }
        if let Some(v) = obj.get("ema_fast").and_then(Value::as_u64) {
            self.ema_fast = v as usize;
        }
        if let Some(v) = obj.get("ema_slow").and_then(Value::as_u64) {
            self.ema_slow = v as usize;
        }
        if let Some(v) = obj.get("use_trend_filter").and_then(Value::as_bool) {
            self.use_trend_filter = v;
        }
        if let Some(v) = obj.get("min_volume").and_then(Value::as_f64) {
            self.min_volume = v;
        }
        if let Some(v) = obj.get("position_percent").and_then(Value::as_f64) {
            self.position_percent = v;
        }
        if let Some(v) = obj.get("max_open_positions").and_then(Value::as_u64) {
            self.max_open_positions = v as usize;
        }
        if let Some(v) = obj.get("max_position_percent").and_then(Value::as_f64) {
            self.max_position_percent = v;
        }
        if let Some(v) = obj.get("stop_loss_percent").and_then(Value::as_f64) {
            self.stop_loss_percent = v;
        }
        if let Some(v) = obj.get("profit_target_percent").and_then(Value::as_f64) {
            self.profit_target_percent = v;
        }
        if let Some(v) = obj.get("trailing_stop_percent").and_then(Value::as_f64) {
            self.trailing_stop_percent = Some(v);
        }
        if let Some(v) = obj.get("use_vwap_filter").and_then(Value::as_bool) {
            self.use_vwap_filter = v;
        }
        if let Some(v) = obj.get("use_divergence").and_then(Value::as_bool) {
            self.use_divergence = v;
        }
        if let Some(v) = obj.get("vault_allocation").and_then(Value::as_f64) {
            self.vault_allocation = v;
        }
        if let Some(v) = obj.get("btc_growth_allocation").and_then(Value::as_f64) {
            self.btc_growth_allocation = v;
        }
        Ok(())
    }
}

/// Bounded push
fn push_bounded(buffer: &mut VecDeque<f64>, value: f64) {
    if buffer.len() == HISTORY_LIMIT {
        buffer.pop_front();
    }
    buffer.push_back(value);
}

/// Rolling indicator history, most recent last
///
/// Fed once per tick and read by the divergence check and by metadata
/// consumers via [`ScalpingStrategy::history`].
#[derive(Debug, Default)]
pub struct IndicatorHistory {
    pub rsi: VecDeque<f64>,
    pub price: VecDeque<f64>,
    pub macd_line: VecDeque<f64>,
    pub ema_fast: VecDeque<f64>,
    pub vwap: VecDeque<f64>,
}

/// Multi-indicator scalping strategy
#[derive(Debug)]
pub struct ScalpingStrategy {
    name: String,
    config: ScalpingConfig,
    history: IndicatorHistory,
    /// Latest computed RSI, read by the exit predicates
    last_rsi: Option<f64>,
    open_position_count: usize,
    committed_value: f64,
    observer: ObserverSlot,
}

impl ScalpingStrategy {
    /// Create a scalping strategy; rejects invalid configuration.
    pub fn new(name: impl Into<String>, config: ScalpingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            config,
            history: IndicatorHistory::default(),
            last_rsi: None,
            open_position_count: 0,
            committed_value: 0.0,
            observer: ObserverSlot::tracing(),
        })
    }

    /// Replace the default tracing observer
    pub fn set_observer(&mut self, observer: Box<dyn StrategyObserver + Send + Sync>) {
        self.observer.set(observer);
    }

    pub fn config(&self) -> &ScalpingConfig {
        &self.config
    }

    /// Rolling indicator history, bounded to the last 100 ticks
    pub fn history(&self) -> &IndicatorHistory {
        &self.history
    }

    /// Confidence score in [50, 100].
    ///
    /// Base 50, +20/+10 for RSI clearing its threshold by 10/5 points,
    /// +20/+10 for a MACD-signal gap of 0.1/0.05, +10 on a confirming
    /// divergence, capped at 100.
    fn confidence(&self, rsi_value: f64, macd_gap: f64, bullish: bool, diverging: bool) -> f64 {
        let mut score: f64 = 50.0;

        let extremity = if bullish {
            self.config.rsi_oversold - rsi_value
        } else {
            rsi_value - self.config.rsi_overbought
        };
        if extremity >= 10.0 {
            score += 20.0;
        } else if extremity >= 5.0 {
            score += 10.0;
        }

        if macd_gap >= 0.1 {
            score += 20.0;
        } else if macd_gap >= 0.05 {
            score += 10.0;
        }

        if diverging {
            score += 10.0;
        }

        score.min(100.0)
    }

    fn evaluate(&mut self, candles: &[Candle], price: f64) -> Signal {
        if candles.len() < self.required_candles() {
            return Signal::hold(
                price,
                format!(
                    "insufficient data: {} candles, need {}",
                    candles.len(),
                    self.required_candles()
                ),
            );
        }
        if price <= 0.0 {
            return Signal::hold(price, "non-positive price");
        }

        let rsi_value = match rsi(candles, self.config.rsi_period) {
            Some(v) => v,
            None => return Signal::hold(price, "RSI unavailable"),
        };
        let macd_out = macd(
            candles,
            self.config.macd_fast,
            self.config.macd_slow,
            self.config.macd_signal,
        );
        let close_prices = closes(candles);
        let ema_fast = ema(&close_prices, self.config.ema_fast);
        let ema_slow = ema(&close_prices, self.config.ema_slow);

        let (Some(macd_value), Some(fast), Some(slow)) =
            (macd_out.latest(), ema_fast.last(), ema_slow.last())
        else {
            return Signal::hold(price, "indicators not ready");
        };

        let bands = vwap_bands(
            candles,
            self.config.vwap_period,
            self.config.vwap_anchored,
            self.config.vwap_deviation_buy,
            self.config.vwap_deviation_sell,
        );

        self.last_rsi = Some(rsi_value);
        push_bounded(&mut self.history.rsi, rsi_value);
        push_bounded(&mut self.history.price, price);
        push_bounded(&mut self.history.macd_line, macd_value);
        push_bounded(&mut self.history.ema_fast, *fast);
        if let Some(b) = bands {
            push_bounded(&mut self.history.vwap, b.vwap);
        }

        // thin-volume candles produce junk crossings
        let last_candle = &candles[candles.len() - 1];
        if last_candle.volume * price < self.config.min_volume {
            return Signal::hold(
                price,
                format!(
                    "volume too thin: {:.2} quote units",
                    last_candle.volume * price
                ),
            );
        }

        let trend_up = !self.config.use_trend_filter || fast > slow;
        let trend_down = !self.config.use_trend_filter || fast < slow;
        let gap = macd_out.gap().unwrap_or(0.0);

        let bullish =
            macd_out.crossed_above() && rsi_value < self.config.rsi_oversold && trend_up;
        if bullish {
            if self.config.use_vwap_filter {
                match bands {
                    Some(b) if price <= b.lower => {}
                    _ => return Signal::hold(price, "buy setup without VWAP band touch"),
                }
            }
            let diverging = self.config.use_divergence
                && self.diverges(Divergence::Bullish);
            let confidence = self.confidence(rsi_value, gap, true, diverging);
            return Signal::buy(
                price,
                confidence / 100.0,
                format!(
                    "MACD crossed up, RSI {:.1} oversold, confidence {:.0}",
                    rsi_value, confidence
                ),
            )
            .with_metadata("confidence", confidence)
            .with_metadata("rsi", rsi_value)
            .with_metadata("macd_gap", gap);
        }

        let bearish =
            macd_out.crossed_below() && rsi_value > self.config.rsi_overbought && trend_down;
        if bearish {
            if self.config.use_vwap_filter {
                match bands {
                    Some(b) if price >= b.upper => {}
                    _ => return Signal::hold(price, "sell setup without VWAP band touch"),
                }
            }
            let diverging = self.config.use_divergence
                && self.diverges(Divergence::Bearish);
            let confidence = self.confidence(rsi_value, gap, false, diverging);
            return Signal::sell(
                price,
                confidence / 100.0,
                format!(
                    "MACD crossed down, RSI {:.1} overbought, confidence {:.0}",
                    rsi_value, confidence
                ),
            )
            .with_metadata("confidence", confidence)
            .with_metadata("rsi", rsi_value)
            .with_metadata("macd_gap", gap);
        }

        Signal::hold(price, format!("no setup: RSI {:.1}", rsi_value))
    }

    fn diverges(&self, wanted: Divergence) -> bool {
        let rsi_hist: Vec<f64> = self.history.rsi.iter().copied().collect();
        let price_hist: Vec<f64> = self.history.price.iter().copied().collect();
        divergence(&rsi_hist, &price_hist, DIVERGENCE_LOOKBACK) == wanted
    }
}

impl Strategy for ScalpingStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn analyze(&mut self, candles: &[Candle], current_price: f64) -> Signal {
        let signal = self.evaluate(candles, current_price);
        self.observer.emit(StrategyEvent::TickEvaluated {
            price: current_price,
            signal: &signal,
        });
        signal
    }

    fn calculate_position_size(&self, balance: f64, signal: &Signal, current_price: f64) -> f64 {
        if signal.kind != SignalKind::Buy || balance <= 0.0 || current_price <= 0.0 {
            return 0.0;
        }
        if self.open_position_count >= self.config.max_open_positions {
            return 0.0;
        }

        let confidence = signal
            .metadata
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(signal.strength * 100.0);

        // half size at zero confidence, full size at 100
        let scale = 0.5 + 0.5 * confidence / 100.0;
        let nominal_value = balance * self.config.position_percent / 100.0 * scale;

        let cap = self.config.max_position_percent / 100.0 * balance;
        let remaining = cap - self.committed_value;
        if remaining <= 0.0 {
            return 0.0;
        }

        let value = nominal_value.min(remaining).min(balance);
        (value / current_price).max(0.0)
    }

    fn should_take_profit(&self, position: &Position, current_price: f64) -> bool {
        if position.entry_price <= 0.0 {
            return false;
        }
        let in_profit = current_price > position.entry_price;

        if current_price
            >= position.entry_price * (1.0 + self.config.profit_target_percent / 100.0)
        {
            return true;
        }

        // trailing stop: lock gains once price backs off the high
        if let (Some(trail), Some(high)) = (self.config.trailing_stop_percent, position.highest_price)
        {
            if in_profit && current_price <= high * (1.0 - trail / 100.0) {
                return true;
            }
        }

        // overbought override: do not sit in an extended market
        if in_profit {
            if let Some(last_rsi) = self.last_rsi {
                if last_rsi > self.config.rsi_overbought {
                    return true;
                }
            }
        }

        false
    }

    fn should_stop_loss(&self, position: &Position, current_price: f64) -> bool {
        if position.entry_price <= 0.0 {
            return false;
        }
        current_price <= position.entry_price * (1.0 - self.config.stop_loss_percent / 100.0)
    }

    fn required_candles(&self) -> usize {
        let mut needed = (self.config.rsi_period + 1)
            .max(self.config.macd_slow + self.config.macd_signal)
            .max(self.config.ema_slow);
        if self.config.use_vwap_filter {
            needed = needed.max(self.config.vwap_period);
        }
        needed + 5
    }

    fn reset(&mut self) {
        self.history = IndicatorHistory::default();
        self.last_rsi = None;
        self.open_position_count = 0;
        self.committed_value = 0.0;
    }

    fn sync_positions(&mut self, open_positions: &[Position], _held_amount: f64) {
        self.open_position_count = open_positions.len();
        self.committed_value = open_positions.iter().map(|p| p.entry_value()).sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::presets;
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn strategy() -> ScalpingStrategy {
        ScalpingStrategy::new("momentum_scalp", presets::momentum_scalp()).unwrap()
    }

    fn make_candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                Candle::new(
                    close,
                    close,
                    close,
                    close,
                    1000.0,
                    Utc::now() + chrono::Duration::minutes(i as i64),
                )
            })
            .collect()
    }

    fn position(entry: f64, size: f64) -> Position {
        Position::new(entry, size, Utc::now())
    }

    #[test]
    fn rejects_bad_config() {
        let mut config = presets::momentum_scalp();
        config.macd_fast = 26;
        config.macd_slow = 12;
        assert!(ScalpingStrategy::new("bad", config).is_err());

        let mut config = presets::momentum_scalp();
        config.rsi_oversold = 80.0;
        config.rsi_overbought = 20.0;
        assert!(ScalpingStrategy::new("bad", config).is_err());
    }

    #[test]
    fn holds_on_insufficient_data() {
        let mut s = strategy();
        let candles = make_candles(&[100.0; 10]);
        let signal = s.analyze(&candles, 100.0);
        assert_eq!(signal.kind, SignalKind::Hold);
        assert!(signal.reason.contains("insufficient data"));
    }

    #[test]
    fn confidence_matches_worked_example() {
        // RSI 15 with oversold 30 clears by 15 (+20); gap 0.12 (+20) -> 90
        let s = strategy();
        assert_relative_eq!(s.confidence(15.0, 0.12, true, false), 90.0);
    }

    #[test]
    fn confidence_tiers() {
        let s = strategy();
        // oversold is 30: RSI 24 clears by 6 (+10), gap 0.06 (+10)
        assert_relative_eq!(s.confidence(24.0, 0.06, true, false), 70.0);
        // barely qualifying: no bonuses
        assert_relative_eq!(s.confidence(29.0, 0.01, true, false), 50.0);
        // everything maxed plus divergence still caps at 100
        assert_relative_eq!(s.confidence(5.0, 0.5, true, true), 100.0);
        // bearish mirror: overbought is 70, RSI 85 clears by 15
        assert_relative_eq!(s.confidence(85.0, 0.12, false, false), 90.0);
    }

    #[test]
    fn size_scales_with_confidence() {
        let s = strategy();
        let balance = 10_000.0;
        let price = 100.0;

        let weak = Signal::buy(price, 0.5, "x").with_metadata("confidence", 50.0);
        let strong = Signal::buy(price, 0.9, "x").with_metadata("confidence", 90.0);

        let weak_size = s.calculate_position_size(balance, &weak, price);
        let strong_size = s.calculate_position_size(balance, &strong, price);

        let base_value = balance * s.config().position_percent / 100.0;
        assert_relative_eq!(weak_size * price, base_value * 0.75, epsilon = 1e-9);
        assert_relative_eq!(strong_size * price, base_value * 0.95, epsilon = 1e-9);
    }

    #[test]
    fn max_open_positions_blocks_sizing() {
        let mut s = strategy();
        let signal = Signal::buy(100.0, 0.9, "x").with_metadata("confidence", 90.0);
        assert!(s.calculate_position_size(10_000.0, &signal, 100.0) > 0.0);

        let open: Vec<Position> = (0..s.config().max_open_positions)
            .map(|_| position(100.0, 0.01))
            .collect();
        s.sync_positions(&open, 0.05);
        assert_eq!(s.calculate_position_size(10_000.0, &signal, 100.0), 0.0);
    }

    #[test]
    fn stop_loss_predicate() {
        let s = strategy();
        let pos = position(100.0, 1.0);
        let stop = 100.0 * (1.0 - s.config().stop_loss_percent / 100.0);
        assert!(s.should_stop_loss(&pos, stop - 0.01));
        assert!(!s.should_stop_loss(&pos, stop + 0.01));
    }

    #[test]
    fn take_profit_at_target() {
        let s = strategy();
        let pos = position(100.0, 1.0);
        let target = 100.0 * (1.0 + s.config().profit_target_percent / 100.0);
        assert!(s.should_take_profit(&pos, target + 0.01));
        assert!(!s.should_take_profit(&pos, target - 0.5));
    }

    #[test]
    fn trailing_stop_locks_gains() {
        let mut config = presets::momentum_scalp();
        config.trailing_stop_percent = Some(1.0);
        config.profit_target_percent = 50.0; // keep the fixed target out of the way
        let s = ScalpingStrategy::new("momentum_scalp", config).unwrap();

        let mut pos = position(100.0, 1.0);
        pos.track_high(110.0);

        // above the trail: hold on
        assert!(!s.should_take_profit(&pos, 109.5));
        // backed off more than 1% from the high while still in profit
        assert!(s.should_take_profit(&pos, 108.8));
        // same backoff but underwater: not a profit-take
        let mut losing = position(120.0, 1.0);
        losing.track_high(120.0);
        assert!(!s.should_take_profit(&losing, 108.8));
    }

    #[test]
    fn overbought_override_exits_in_profit_only() {
        let mut s = strategy();
        s.last_rsi = Some(s.config().rsi_overbought + 5.0);
        let pos = position(100.0, 1.0);
        assert!(s.should_take_profit(&pos, 100.5));
        assert!(!s.should_take_profit(&pos, 99.5));

        s.last_rsi = Some(50.0);
        assert!(!s.should_take_profit(&pos, 100.5));
    }

    #[test]
    fn volume_filter_rejects_thin_candles() {
        let mut config = presets::momentum_scalp();
        config.min_volume = 1e12; // nothing passes
        let mut s = ScalpingStrategy::new("momentum_scalp", config).unwrap();

        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.1)).collect();
        let candles = make_candles(&closes);
        let signal = s.analyze(&candles, 106.0);
        assert_eq!(signal.kind, SignalKind::Hold);
        assert!(signal.reason.contains("volume"));
    }

    #[test]
    fn history_is_bounded() {
        let mut s = strategy();
        let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.1)).collect();
        for i in 0..130 {
            closes.push(106.0 + (i % 5) as f64 * 0.1);
            let candles = make_candles(&closes);
            s.analyze(&candles, *closes.last().unwrap());
        }
        assert_eq!(s.history().rsi.len(), 100);
        assert_eq!(s.history().price.len(), 100);
        assert_eq!(s.history().macd_line.len(), 100);
        assert_eq!(s.history().ema_fast.len(), 100);
    }

    #[test]
    fn reset_clears_history() {
        let mut s = strategy();
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.1)).collect();
        let candles = make_candles(&closes);
        s.analyze(&candles, 106.0);
        assert!(s.last_rsi.is_some());

        s.reset();
        s.reset();
        assert!(s.last_rsi.is_none());
        assert!(s.history.rsi.is_empty());
    }
}
