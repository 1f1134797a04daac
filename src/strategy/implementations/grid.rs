//! Grid trading strategy
//!
//! A fixed set of evenly spaced price levels spanning a band. Falling
//! through an unheld level buys it; rising back through a held level sells
//! it. Levels live in an ordered vec and are matched by relative tolerance,
//! never by float equality.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::Candle;
use crate::error::Error;
use crate::indicators::volatility;
use crate::portfolio::Position;
use crate::strategy::events::{ObserverSlot, StrategyEvent, StrategyObserver};
use crate::strategy::{Signal, SignalKind, Strategy};
use crate::Result;

/// Grid strategy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of levels, at least 2
    pub grid_levels: usize,
    /// Explicit band; derived from volatility when unset
    #[serde(default)]
    pub lower_bound: Option<f64>,
    #[serde(default)]
    pub upper_bound: Option<f64>,
    /// Auto band half-width = price * volatility * range_multiplier
    pub range_multiplier: f64,
    /// Trailing window for the volatility estimate
    pub volatility_window: usize,
    /// Order size per level, % of balance
    pub order_size_percent: f64,
    /// Cumulative committed value cap, % of balance
    pub max_position_percent: f64,
    /// Re-derive the band when price escapes it (only while no level is held)
    #[serde(default)]
    pub auto_adjust_bounds: bool,
    /// Relative tolerance for level price matching, in %
    pub tolerance_percent: f64,
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

impl GridConfig {
    /// Fail-fast validation; called at construction, never mid-tick.
    pub fn validate(&self) -> Result<()> {
        if self.grid_levels < 2 {
            return Err(Error::config("grid_levels must be at least 2"));
        }
        if let (Some(lower), Some(upper)) = (self.lower_bound, self.upper_bound) {
            if lower <= 0.0 || lower >= upper {
                return Err(Error::config("bounds must satisfy 0 < lower < upper"));
            }
        }
        if self.range_multiplier <= 0.0 {
            return Err(Error::config("range_multiplier must be positive"));
        }
        if self.order_size_percent <= 0.0 {
            return Err(Error::config("order_size_percent must be positive"));
        }
        if self.max_position_percent <= 0.0 || self.max_position_percent > 100.0 {
            return Err(Error::config("max_position_percent must be in (0, 100]"));
        }
        if self.tolerance_percent <= 0.0 {
            return Err(Error::config("tolerance_percent must be positive"));
        }
        Ok(())
    }

    /// Merge caller parameters over this config; absent keys keep their values.
    pub fn merge_params(&mut self, params: &Value) -> Result<()> {
        let obj = params
            .as_object()
            .ok_or_else(|| Error::InvalidParams("expected a JSON object".into()))?;
        if let Some(v) = obj.get("grid_levels").and_then(Value::as_u64) {
            self.grid_levels = v as usize;
        }
        if let Some(v) = obj.get("lower_bound").and_then(Value::as_f64) {
            self.lower_bound = Some(v);
        }
        if let Some(v) = obj.get("upper_bound").and_then(Value::as_f64) {
            self.upper_bound = Some(v);
        }
        if let Some(v) = obj.get("range_multiplier").and_then(Value::as_f64) {
            self.range_multiplier = v;
        }
        if let Some(v) = obj.get("order_size_percent").and_then(Value::as_f64) {
            self.order_size_percent = v;
        }
        if let Some(v) = obj.get("max_position_percent").and_then(Value::as_f64) {
            self.max_position_percent = v;
        }
        if let Some(v) = obj.get("auto_adjust_bounds").and_then(Value::as_bool) {
            self.auto_adjust_bounds = v;
        }
        if let Some(v) = obj.get("tolerance_percent").and_then(Value::as_f64) {
            self.tolerance_percent = v;
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

/// One grid level
#[derive(Debug, Clone)]
pub struct GridLevel {
    pub price: f64,
    /// Whether this level currently holds inventory
    pub has_position: bool,
    /// Base units bought at this level, recorded on execution
    pub size: f64,
}

/// Grid trading strategy
#[derive(Debug)]
pub struct GridStrategy {
    name: String,
    config: GridConfig,
    /// Strictly increasing, evenly spaced
    levels: Vec<GridLevel>,
    last_processed_price: Option<f64>,
    committed_value: f64,
    observer: ObserverSlot,
}

impl GridStrategy {
    /// Create a grid strategy; rejects invalid configuration.
    pub fn new(name: impl Into<String>, config: GridConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            name: name.into(),
            config,
            levels: Vec::new(),
            last_processed_price: None,
            committed_value: 0.0,
            observer: ObserverSlot::tracing(),
        })
    }

    /// Replace the default tracing observer
    pub fn set_observer(&mut self, observer: Box<dyn StrategyObserver + Send + Sync>) {
        self.observer.set(observer);
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Current levels (empty until the first analyze call)
    pub fn levels(&self) -> &[GridLevel] {
        &self.levels
    }

    fn tolerance(&self) -> f64 {
        self.config.tolerance_percent / 100.0
    }

    /// Lay out `grid_levels` evenly spaced levels across the band; levels
    /// below the current price start as held inventory.
    fn init_levels(&mut self, candles: &[Candle], price: f64) {
        let (lower, upper) = match (self.config.lower_bound, self.config.upper_bound) {
            (Some(lower), Some(upper)) => (lower, upper),
            _ => {
                // floor the estimate so a flat series still spans a band
                let vol = volatility(candles, self.config.volatility_window)
                    .max(crate::indicators::DEFAULT_VOLATILITY);
                let half_width = price * vol * self.config.range_multiplier;
                (price - half_width, price + half_width)
            }
        };

        let step = (upper - lower) / (self.config.grid_levels - 1) as f64;
        self.levels = (0..self.config.grid_levels)
            .map(|i| {
                let level_price = lower + step * i as f64;
                GridLevel {
                    price: level_price,
                    has_position: level_price < price,
                    size: 0.0,
                }
            })
            .collect();
    }

    /// Locate a level by price within the relative tolerance
    fn find_level_mut(&mut self, price: f64) -> Option<&mut GridLevel> {
        let tolerance = self.tolerance();
        let idx = self.levels.partition_point(|l| l.price < price * (1.0 - tolerance));
        self.levels
            .get_mut(idx)
            .filter(|l| (l.price - price).abs() <= price * tolerance)
    }

    fn whole_band(&self) -> Option<(f64, f64)> {
        Some((self.levels.first()?.price, self.levels.last()?.price))
    }

    /// Highest level crossed downward this tick that holds no inventory
    fn buy_crossing(&self, last: f64, price: f64) -> Option<&GridLevel> {
        self.levels
            .iter()
            .rev()
            .find(|l| last >= l.price && price < l.price && !l.has_position)
    }

    /// Lowest level crossed upward this tick that holds inventory
    fn sell_crossing(&self, last: f64, price: f64) -> Option<&GridLevel> {
        self.levels
            .iter()
            .find(|l| last <= l.price && price > l.price && l.has_position)
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

        if self.levels.is_empty() {
            self.init_levels(candles, price);
            self.last_processed_price = Some(price);
            return Signal::hold(price, format!("grid initialized: {} levels", self.levels.len()));
        }

        // Re-center an escaped band, but never while bought inventory is
        // held: recorded level sizes are the only record of what each level
        // owns. Seeded has_position tags are assumptions and are re-derived
        // with the new band.
        if self.config.auto_adjust_bounds {
            if let Some((lower, upper)) = self.whole_band() {
                let escaped = price < lower * (1.0 - self.tolerance())
                    || price > upper * (1.0 + self.tolerance());
                if escaped && self.levels.iter().all(|l| !(l.has_position && l.size > 0.0)) {
                    self.init_levels(candles, price);
                    self.last_processed_price = Some(price);
                    return Signal::hold(price, "grid re-centered around price");
                }
            }
        }

        let last = self.last_processed_price.unwrap_or(price);
        self.last_processed_price = Some(price);

        // first matching crossing wins; buys take priority on gap moves
        if let Some(level) = self.buy_crossing(last, price) {
            let level_price = level.price;
            self.observer.emit(StrategyEvent::GridLevelCrossed {
                level_price,
                buy: true,
            });
            return Signal::buy(
                price,
                0.75,
                format!("price fell through grid level {:.2}", level_price),
            )
            .with_metadata("level_price", level_price);
        }

        if let Some(level) = self.sell_crossing(last, price) {
            let level_price = level.price;
            let size = level.size;
            self.observer.emit(StrategyEvent::GridLevelCrossed {
                level_price,
                buy: false,
            });
            let mut signal = Signal::sell(
                price,
                0.75,
                format!("price rose through grid level {:.2}", level_price),
            )
            .with_metadata("level_price", level_price);
            if size > 0.0 {
                signal = signal.with_size(size);
            }
            return signal;
        }

        Signal::hold(price, "no grid level crossed")
    }
}

impl Strategy for GridStrategy {
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

        let nominal_value = balance * self.config.order_size_percent / 100.0;
        let cap = self.config.max_position_percent / 100.0 * balance;
        let remaining = cap - self.committed_value;
        if remaining <= 0.0 {
            return 0.0;
        }

        let value = nominal_value.min(remaining).min(balance);
        (value / current_price).max(0.0)
    }

    fn should_take_profit(&self, _position: &Position, _current_price: f64) -> bool {
        // exits flow through sell-level crossings, not per-position targets
        false
    }

    fn should_stop_loss(&self, _position: &Position, _current_price: f64) -> bool {
        false
    }

    fn required_candles(&self) -> usize {
        // an explicit band needs no history; an auto band wants enough
        // candles for a real volatility estimate
        if self.config.lower_bound.is_some() && self.config.upper_bound.is_some() {
            1
        } else {
            20
        }
    }

    fn reset(&mut self) {
        self.levels.clear();
        self.last_processed_price = None;
        self.committed_value = 0.0;
    }

    fn sync_positions(&mut self, open_positions: &[Position], _held_amount: f64) {
        self.committed_value = open_positions.iter().map(|p| p.entry_value()).sum();
    }

    fn on_trade_executed(&mut self, signal: &Signal) {
        let Some(level_price) = signal.metadata.get("level_price").and_then(Value::as_f64) else {
            return;
        };
        let kind = signal.kind;
        let size = signal.size;
        if let Some(level) = self.find_level_mut(level_price) {
            match kind {
                SignalKind::Buy => {
                    level.has_position = true;
                    level.size = size.unwrap_or(0.0);
                }
                SignalKind::Sell => {
                    level.has_position = false;
                    level.size = 0.0;
                }
                SignalKind::Hold => {}
            }
        }
    }
}
