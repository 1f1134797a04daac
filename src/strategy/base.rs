//! Base strategy trait

use crate::data::Candle;
use crate::portfolio::Position;
use crate::strategy::Signal;

/// The universal interface for a trading strategy.
///
/// A strategy is a stateful entity: `analyze` may mutate the instance's own
/// ladder/grid/indicator state, so it must be called strictly in time order,
/// once per new candle. It never throws — insufficient data and portfolio
/// drift both resolve to a `hold` signal.
pub trait Strategy: std::fmt::Debug {
    /// Strategy name
    fn name(&self) -> &str;

    /// Analyze the candle window and produce a signal.
    ///
    /// `candles` is the full window, ascending by time; `current_price` is
    /// the latest tick price (usually the last close).
    fn analyze(&mut self, candles: &[Candle], current_price: f64) -> Signal;

    /// Size a buy signal in base units.
    ///
    /// Returns 0 for non-buy signals and whenever a cap (max open positions,
    /// max allocation) is already hit.
    fn calculate_position_size(&self, balance: f64, signal: &Signal, current_price: f64) -> f64;

    /// Whether an open position should take profit at the current price.
    ///
    /// Pure predicate: reads strategy state, never mutates it.
    fn should_take_profit(&self, position: &Position, current_price: f64) -> bool;

    /// Whether an open position should stop out at the current price.
    ///
    /// Pure predicate: reads strategy state, never mutates it.
    fn should_stop_loss(&self, position: &Position, current_price: f64) -> bool;

    /// Minimum candle count `analyze` needs to produce non-hold signals
    fn required_candles(&self) -> usize;

    /// Zero all per-instance state. Idempotent.
    fn reset(&mut self);

    /// Caller-reported portfolio truth: the open positions this strategy is
    /// responsible for and the actually-held base balance.
    ///
    /// Ladder variants use this to detect a completed cycle (positions back
    /// to empty) and to guard against state drift (positions reported but
    /// nothing actually held). Default is a no-op.
    fn sync_positions(&mut self, _open_positions: &[Position], _held_amount: f64) {}

    /// Notification that a previously returned signal was executed.
    ///
    /// The grid engine uses this to tag the crossed level. Default is a
    /// no-op.
    fn on_trade_executed(&mut self, _signal: &Signal) {}
}
