//! Structured strategy events
//!
//! The decision core stays pure: instead of interleaving log statements with
//! entry/exit logic, strategies emit typed events through an optional
//! observer. The default observer forwards them to `tracing`.

use tracing::{debug, info, warn};

use crate::strategy::Signal;

/// A structured decision event
#[derive(Debug)]
pub enum StrategyEvent<'a> {
    /// A tick was evaluated and produced this signal
    TickEvaluated { price: f64, signal: &'a Signal },
    /// A ladder level was entered (1-based)
    LevelCrossed { level: usize, price: f64 },
    /// A grid level fired
    GridLevelCrossed { level_price: f64, buy: bool },
    /// An exit signal fired
    ExitFired { price: f64, reason: &'a str },
    /// Ladder cycle state was cleared
    CycleReset,
    /// Tracked state disagreed with the caller's portfolio
    DriftDetected { tracked: f64, actual: f64 },
}

/// Observer callback for structured strategy events
pub trait StrategyObserver {
    fn on_event(&self, event: &StrategyEvent<'_>);
}

/// Default observer: forwards events to `tracing`
#[derive(Debug, Default)]
pub struct TracingObserver;

impl StrategyObserver for TracingObserver {
    fn on_event(&self, event: &StrategyEvent<'_>) {
        match event {
            StrategyEvent::TickEvaluated { price, signal } => {
                debug!(
                    price,
                    kind = ?signal.kind,
                    strength = signal.strength,
                    reason = %signal.reason,
                    "tick evaluated"
                );
            }
            StrategyEvent::LevelCrossed { level, price } => {
                info!(level, price, "ladder level entered");
            }
            StrategyEvent::GridLevelCrossed { level_price, buy } => {
                info!(level_price, buy, "grid level crossed");
            }
            StrategyEvent::ExitFired { price, reason } => {
                info!(price, reason, "exit fired");
            }
            StrategyEvent::CycleReset => {
                debug!("cycle reset");
            }
            StrategyEvent::DriftDetected { tracked, actual } => {
                warn!(tracked, actual, "tracked positions disagree with portfolio");
            }
        }
    }
}

/// Shared observer slot for strategy implementations
pub(crate) struct ObserverSlot {
    observer: Box<dyn StrategyObserver + Send + Sync>,
}

impl ObserverSlot {
    pub(crate) fn tracing() -> Self {
        Self {
            observer: Box::new(TracingObserver),
        }
    }

    pub(crate) fn set(&mut self, observer: Box<dyn StrategyObserver + Send + Sync>) {
        self.observer = observer;
    }

    pub(crate) fn emit(&self, event: StrategyEvent<'_>) {
        self.observer.on_event(&event);
    }
}

impl std::fmt::Debug for ObserverSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ObserverSlot")
    }
}
