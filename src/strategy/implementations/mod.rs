//! Strategy implementations

pub mod grid;
pub mod ladder;
pub mod scalping;

pub use grid::{GridConfig, GridLevel, GridStrategy};
pub use ladder::{LadderConfig, LadderStrategy, Progression, SizingMode};
pub use scalping::{IndicatorHistory, ScalpingConfig, ScalpingStrategy};
