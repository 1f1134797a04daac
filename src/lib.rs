//! Stratagem: a trading-strategy signal engine
//!
//! Pluggable decision algorithms that turn a rolling window of OHLCV candles
//! into buy/sell/hold signals, size positions, and decide exits.
//!
//! # Features
//!
//! - **Technical Indicators**: RSI, EMA, MACD, VWAP+bands, volatility, divergence
//! - **Ladder Strategies**: multi-level "buy the dip" entry ladders with
//!   linear or geometric sizing (reverse-ratio, DCA, micro-scalping)
//! - **Grid Trading**: fixed-spacing buy/sell level crossing
//! - **Scalping**: multi-indicator confidence scoring (RSI + MACD + EMA)
//! - **Strategy Registry**: create strategies by identifier from JSON parameters
//!
//! The engine owns no I/O: the caller feeds candles (ascending by time) and
//! the current price into [`Strategy::analyze`], applies the returned
//! [`Signal`] against its own portfolio, and reports fills back through
//! [`Strategy::sync_positions`].
//!
//! # Example
//!
//! ```no_run
//! use stratagem::prelude::*;
//!
//! fn main() -> stratagem::Result<()> {
//!     let registry = StrategyRegistry::new();
//!     let mut strategy = registry.create("reverse_ratio", None)?;
//!     let candles: Vec<Candle> = Vec::new(); // supplied by the caller's feed
//!     let price = 100.0;
//!     let signal = strategy.analyze(&candles, price);
//!     let size = strategy.calculate_position_size(10_000.0, &signal, price);
//!     println!("{:?} size={}", signal.kind, size);
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod error;
pub mod indicators;
pub mod portfolio;
pub mod strategy;

// Re-export commonly used types
pub mod prelude {
    pub use crate::data::Candle;
    pub use crate::error::Error;
    pub use crate::indicators::{Divergence, MacdOutput, VwapBands};
    pub use crate::portfolio::{PortfolioBalance, Position};
    pub use crate::strategy::implementations::{
        GridConfig, GridStrategy, LadderConfig, LadderStrategy, ScalpingConfig, ScalpingStrategy,
    };
    pub use crate::strategy::{
        Signal, SignalKind, Strategy, StrategyEvent, StrategyObserver, StrategyRegistry,
    };
}

pub use error::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
