//! Strategy engine module
//!
//! Every strategy is a trait implementation selected by identifier from the
//! [`StrategyRegistry`]. The caller drives the same loop for all of them:
//! feed a candle window and the current price into [`Strategy::analyze`],
//! size the returned signal, apply it, then report fills back through
//! [`Strategy::sync_positions`].

pub mod base;
pub mod events;
pub mod implementations;
pub mod presets;
pub mod registry;
pub mod signal;

pub use base::Strategy;
pub use events::{StrategyEvent, StrategyObserver, TracingObserver};
pub use registry::{StrategyFactory, StrategyRegistry};
pub use signal::{Signal, SignalKind};
