//! Ladder strategies: multi-level "buy the dip" entry ladders
//!
//! One parameterized state machine covers the whole martingale family —
//! conservative reverse-ratio buying, DCA, and the micro-scalping variants
//! differ only in their configuration records (see
//! [`presets`](crate::strategy::presets)).
//!
//! Machine: Idle -> Entered -> Adding(k) -> Exiting -> Idle. While idle the
//! strategy tracks the recent high; a configured percentage drop from it
//! opens the cycle, further drops from the last level price add levels, and
//! a recovery above the initial entry price closes the whole ladder in one
//! exit. Stop-loss is permanently disabled for this family: the ladder IS
//! the drawdown response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::{recent_high, Candle};
use crate::error::Error;
use crate::portfolio::Position;
use crate::strategy::events::{ObserverSlot, StrategyEvent, StrategyObserver};
use crate::strategy::{Signal, SignalKind, Strategy};
use crate::Result;

/// Held balance below this counts as "nothing actually held"
const DUST: f64 = 1e-8;

/// How each ladder level is denominated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    /// Level sizes are percentages of the caller's free balance
    PercentOfBalance,
    /// Level sizes are fixed quote-currency amounts
    FixedAmount,
}

/// How level sizes grow as the ladder deepens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progression {
    /// level * base
    Linear,
    /// base * ratio^(level-1)
    Geometric,
}

/// Ladder strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderConfig {
    /// % drop from the recent high that opens a cycle
    pub initial_drop_percent: f64,
    /// % drop from the last level price that adds a level
    pub level_drop_percent: f64,
    /// Maximum ladder depth
    pub max_levels: usize,
    /// % above the initial entry price that closes the cycle
    pub profit_target_percent: f64,
    /// Base size per level: percent of balance, or quote amount in fixed mode
    pub base_size: f64,
    /// Sizing denomination
    pub sizing: SizingMode,
    /// Level size growth
    pub progression: Progression,
    /// Geometric ratio (ignored for linear progression)
    pub ratio_multiplier: f64,
    /// Cumulative committed value cap, as % of balance
    pub max_position_percent: f64,
    /// Candles of lookback for recent-high tracking
    pub high_lookback: usize,
    /// Open a cycle every N candles regardless of drawdown (DCA)
    #[serde(default)]
    pub interval_candles: Option<usize>,
    /// Sell only this fraction of the position at target (DCA), in (0, 1]
    #[serde(default)]
    pub partial_exit_fraction: Option<f64>,
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

impl LadderConfig {
    /// Fail-fast validation; called at construction, never mid-tick.
    pub fn validate(&self) -> Result<()> {
        if self.initial_drop_percent <= 0.0 {
            return Err(Error::config("initial_drop_percent must be positive"));
        }
        if self.level_drop_percent <= 0.0 {
            return Err(Error::config("level_drop_percent must be positive"));
        }
        if self.max_levels == 0 {
            return Err(Error::config("max_levels must be at least 1"));
        }
        if self.profit_target_percent <= 0.0 {
            return Err(Error::config("profit_target_percent must be positive"));
        }
        if self.base_size <= 0.0 {
            return Err(Error::config("base_size must be positive"));
        }
        if self.progression == Progression::Geometric && self.ratio_multiplier <= 0.0 {
            return Err(Error::config("ratio_multiplier must be positive"));
        }
        if self.max_position_percent <= 0.0 || self.max_position_percent > 100.0 {
            return Err(Error::config("max_position_percent must be in (0, 100]"));
        }
        if self.high_lookback == 0 {
            return Err(Error::config("high_lookback must be at least 1"));
        }
        if let Some(n) = self.interval_candles {
            if n == 0 {
                return Err(Error::config("interval_candles must be at least 1"));
            }
        }
        if let Some(f) = self.partial_exit_fraction {
            if !(0.0..=1.0).contains(&f) || f == 0.0 {
                return Err(Error::config("partial_exit_fraction must be in (0, 1]"));
            }
        }
        Ok(())
    }

    /// Merge caller parameters over this config; absent keys keep their values.
    pub fn merge_params(&mut self, params: &Value) -> Result<()> {
        let obj = params
            .as_object()
            .ok_or_else(|| Error::InvalidParams("expected a JSON object".into()))?;
        if let Some(v) = obj.get("initial_drop_percent").and_then(Value::as_f64) {
            self.initial_drop_percent = v;
        }
        if let Some(v) = obj.get("level_drop_percent").and_then(Value::as_f64) {
            self.level_drop_percent = v;
        }
        if let Some(v) = obj.get("max_levels").and_then(Value::as_u64) {
            self.max_levels = v as usize;
        }
        if let Some(v) = obj.get("profit_target_percent").and_then(Value::as_f64) {
            self.profit_target_percent = v;
        }
        if let Some(v) = obj.get("base_size").and_then(Value::as_f64) {
            self.base_size = v;
        }
        if let Some(v) = obj.get("ratio_multiplier").and_then(Value::as_f64) {
            self.ratio_multiplier = v;
        }
        if let Some(v) = obj.get("max_position_percent").and_then(Value::as_f64) {
            self.max_position_percent = v;
        }
        if let Some(v) = obj.get("high_lookback").and_then(Value::as_u64) {
            self.high_lookback = v as usize;
        }
        if let Some(v) = obj.get("interval_candles").and_then(Value::as_u64) {
            self.interval_candles = Some(v as usize);
        }
        if let Some(v) = obj.get("partial_exit_fraction").and_then(Value::as_f64) {
            self.partial_exit_fraction = Some(v);
        }
        if let Some(v) = obj.get("vault_allocation").and_then(Value::as_f64) {
            self.vault_allocation = v;
        }
        if let Some(v) = obj.get("btc_growth_allocation").and_then(Value::as_f64) {
            self.btc_growth_allocation = v;
        }
        Ok(())
    }

    /// Profit target actually used for exits.
    ///
    /// Sub-1% targets are hit so rarely at their nominal level that fee drag
    /// eats the cycle; the micro-scalping family accepts a reduced target
    /// (50% of nominal at <=0.1%, 70% at <=0.5%).
    pub fn effective_target_percent(&self) -> f64 {
        let target = self.profit_target_percent;
        if target <= 0.1 {
            target * 0.5
        } else if target <= 0.5 {
            target * 0.7
        } else {
            target
        }
    }
}

/// Per-cycle mutable state
#[derive(Debug, Default)]
struct LadderState {
    /// Highest high/close over the lookback; zeroed at cycle start
    recent_high: f64,
    /// 0.0 = no active cycle
    initial_entry_price: f64,
    current_level: usize,
    level_prices: Vec<f64>,
    /// Planned size per level (percent of balance, or quote amount)
    level_sizes: Vec<f64>,
    /// Candles seen while idle, for the DCA interval trigger
    idle_ticks: usize,
    /// Caller-reported truth from `sync_positions`
    tracked_size: f64,
    committed_value: f64,
    held_amount: Option<f64>,
}

/// The parameterized ladder state machine
#[derive(Debug)]
pub struct LadderStrategy {
    name: String,
    config: LadderConfig,
    state: LadderState,
    observer: ObserverSlot,
}

impl LadderStrategy {
    /// Create a ladder strategy; rejects invalid configuration.
    pub fn new(name: impl Into<String>, config: LadderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            config,
            state: LadderState::default(),
            observer: ObserverSlot::tracing(),
        })
    }

    /// Replace the default tracing observer
    pub fn set_observer(&mut self, observer: Box<dyn StrategyObserver + Send + Sync>) {
        self.observer.set(observer);
    }

    pub fn config(&self) -> &LadderConfig {
        &self.config
    }

    /// Current ladder depth (0 while idle)
    pub fn current_level(&self) -> usize {
        self.state.current_level
    }

    /// Initial entry price of the active cycle (0.0 while idle)
    pub fn initial_entry_price(&self) -> f64 {
        self.state.initial_entry_price
    }

    /// Planned size for a 1-based level, in the configured denomination
    fn size_for_level(&self, level: usize) -> f64 {
        match self.config.progression {
            Progression::Linear => level as f64 * self.config.base_size,
            Progression::Geometric => {
                self.config.base_size * self.config.ratio_multiplier.powi(level as i32 - 1)
            }
        }
    }

    /// Entry/add strength in [0.7, 0.9], scaled by trigger overshoot
    fn buy_strength(drop_percent: f64, trigger_percent: f64) -> f64 {
        let overshoot = ((drop_percent - trigger_percent) / trigger_percent).clamp(0.0, 1.0);
        0.7 + 0.2 * overshoot
    }

    fn open_cycle(&mut self, price: f64, strength: f64, reason: String) -> Signal {
        self.state.initial_entry_price = price;
        self.state.current_level = 1;
        self.state.level_prices.push(price);
        let size = self.size_for_level(1);
        self.state.level_sizes.push(size);
        // zeroed so the next idle phase finds a fresh high
        self.state.recent_high = 0.0;
        self.state.idle_ticks = 0;

        self.observer.emit(StrategyEvent::LevelCrossed { level: 1, price });
        Signal::buy(price, strength, reason)
            .with_metadata("level", 1u64)
            .with_metadata("planned_size", size)
    }

    fn add_level(&mut self, price: f64, drop_percent: f64) -> Signal {
        let level = self.state.current_level + 1;
        self.state.current_level = level;
        self.state.level_prices.push(price);
        let size = self.size_for_level(level);
        self.state.level_sizes.push(size);

        self.observer.emit(StrategyEvent::LevelCrossed { level, price });
        Signal::buy(
            price,
            Self::buy_strength(drop_percent, self.config.level_drop_percent),
            format!(
                "level {} add: {:.3}% below level {} price",
                level,
                drop_percent,
                level - 1
            ),
        )
        .with_metadata("level", level as u64)
        .with_metadata("planned_size", size)
    }

    fn exit_signal(&mut self, price: f64) -> Signal {
        let gain = (price - self.state.initial_entry_price) / self.state.initial_entry_price * 100.0;
        let fraction = self.config.partial_exit_fraction.unwrap_or(1.0);

        // sell what we actually hold, never what we merely think we hold
        let nominal = self.state.tracked_size * fraction;
        let size = match self.state.held_amount {
            Some(held) => nominal.min(held),
            None => nominal,
        };
        let complete = fraction >= 1.0 || self.state.tracked_size - size <= DUST;

        let reason = format!(
            "profit target reached: +{:.3}% from initial entry {:.2}",
            gain, self.state.initial_entry_price
        );
        self.observer.emit(StrategyEvent::ExitFired {
            price,
            reason: &reason,
        });

        let mut signal = Signal::sell(price, 0.9, reason)
            .with_metadata("is_complete_exit", complete)
            .with_metadata("levels_closed", self.state.current_level as u64);
        if size > 0.0 {
            signal = signal.with_size(size);
        }
        signal
    }

    fn cycle_reset(&mut self) {
        self.state.initial_entry_price = 0.0;
        self.state.current_level = 0;
        self.state.level_prices.clear();
        self.state.level_sizes.clear();
        self.state.recent_high = 0.0;
        self.state.idle_ticks = 0;
        // stale balance reports belong to the finished cycle
        self.state.tracked_size = 0.0;
        self.state.held_amount = None;
        self.observer.emit(StrategyEvent::CycleReset);
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

        if self.state.initial_entry_price == 0.0 {
            // Idle: refresh the reference high, then look for a way in
            self.state.recent_high = recent_high(candles, self.config.high_lookback);
            self.state.idle_ticks += 1;

            if let Some(interval) = self.config.interval_candles {
                if self.state.idle_ticks >= interval {
                    return self.open_cycle(
                        price,
                        0.7,
                        format!("scheduled entry after {} candles", interval),
                    );
                }
            }

            if self.state.recent_high > 0.0 {
                let drop_percent =
                    (self.state.recent_high - price) / self.state.recent_high * 100.0;
                if drop_percent >= self.config.initial_drop_percent {
                    let reason = format!(
                        "initial entry: {:.3}% below recent high {:.2}",
                        drop_percent, self.state.recent_high
                    );
                    let strength =
                        Self::buy_strength(drop_percent, self.config.initial_drop_percent);
                    return self.open_cycle(price, strength, reason);
                }
            }

            return Signal::hold(price, "waiting for entry trigger");
        }

        // Active cycle: recovery closes it, deeper drops ladder in
        let target =
            self.state.initial_entry_price * (1.0 + self.config.effective_target_percent() / 100.0);
        if price >= target {
            if matches!(self.state.held_amount, Some(held) if held <= DUST) {
                return Signal::hold(price, "exit target reached but nothing held");
            }
            return self.exit_signal(price);
        }

        if self.state.current_level < self.config.max_levels {
            let last_level_price = *self
                .state
                .level_prices
                .last()
                .unwrap_or(&self.state.initial_entry_price);
            let drop_percent = (last_level_price - price) / last_level_price * 100.0;
            if drop_percent >= self.config.level_drop_percent {
                return self.add_level(price, drop_percent);
            }
        }

        Signal::hold(
            price,
            format!("cycle active at level {}", self.state.current_level),
        )
    }
}

impl Strategy for LadderStrategy {
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

        let planned = signal
            .metadata
            .get("planned_size")
            .and_then(Value::as_f64)
            .or_else(|| self.state.level_sizes.last().copied())
            .unwrap_or(self.config.base_size);

        let nominal_value = match self.config.sizing {
            SizingMode::PercentOfBalance => balance * planned / 100.0,
            SizingMode::FixedAmount => planned,
        };

        // never let the ladder commit past the configured allocation cap
        let cap = self.config.max_position_percent / 100.0 * balance;
        let remaining = cap - self.state.committed_value;
        if remaining <= 0.0 {
            return 0.0;
        }

        let value = nominal_value.min(remaining).min(balance);
        (value / current_price).max(0.0)
    }

    fn should_take_profit(&self, position: &Position, current_price: f64) -> bool {
        let reference = if self.state.initial_entry_price > 0.0 {
            self.state.initial_entry_price
        } else {
            position.entry_price
        };
        if reference <= 0.0 {
            return false;
        }
        current_price >= reference * (1.0 + self.config.effective_target_percent() / 100.0)
    }

    fn should_stop_loss(&self, _position: &Position, _current_price: f64) -> bool {
        // disabled for the whole ladder family: drawdown is answered with
        // deeper levels, never a stop
        false
    }

    fn required_candles(&self) -> usize {
        self.config.high_lookback + 1
    }

    fn reset(&mut self) {
        self.state = LadderState::default();
    }

    fn sync_positions(&mut self, open_positions: &[Position], held_amount: f64) {
        self.state.tracked_size = open_positions.iter().map(|p| p.size).sum();
        self.state.committed_value = open_positions.iter().map(|p| p.entry_value()).sum();
        self.state.held_amount = Some(held_amount);

        if !open_positions.is_empty() && held_amount <= DUST {
            // tracked positions with no actual balance behind them: drop
            // everything and re-arm
            self.observer.emit(StrategyEvent::DriftDetected {
                tracked: self.state.tracked_size,
                actual: held_amount,
            });
            self.state.tracked_size = 0.0;
            self.state.committed_value = 0.0;
            self.cycle_reset();
            return;
        }

        if open_positions.is_empty() && self.state.initial_entry_price > 0.0 {
            self.cycle_reset();
        }
    }
}
