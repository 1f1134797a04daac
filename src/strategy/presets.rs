//! Preset strategy configurations
//!
//! The ladder variants are one state machine instantiated with different
//! constant records; these are those records, plus grid and scalping
//! defaults. The registry merges caller parameters over them.

use crate::strategy::implementations::{
    GridConfig, LadderConfig, Progression, ScalpingConfig, SizingMode,
};

/// Conservative reverse-ratio buying: 5% drop arms, 5% steps ladder in,
/// 7% recovery closes the cycle.
pub fn reverse_ratio() -> LadderConfig {
    LadderConfig {
        initial_drop_percent: 5.0,
        level_drop_percent: 5.0,
        max_levels: 5,
        profit_target_percent: 7.0,
        base_size: 10.0,
        sizing: SizingMode::PercentOfBalance,
        progression: Progression::Linear,
        ratio_multiplier: 1.0,
        max_position_percent: 30.0,
        high_lookback: 10,
        interval_candles: None,
        partial_exit_fraction: None,
        vault_allocation: 10.0,
        btc_growth_allocation: 5.0,
    }
}

/// Deeper, geometrically sized ladder for faster markets
pub fn reverse_ratio_aggressive() -> LadderConfig {
    LadderConfig {
        initial_drop_percent: 3.0,
        level_drop_percent: 4.0,
        max_levels: 7,
        profit_target_percent: 5.0,
        base_size: 5.0,
        sizing: SizingMode::PercentOfBalance,
        progression: Progression::Geometric,
        ratio_multiplier: 1.5,
        max_position_percent: 50.0,
        high_lookback: 10,
        interval_candles: None,
        partial_exit_fraction: None,
        vault_allocation: 10.0,
        btc_growth_allocation: 5.0,
    }
}

/// Dollar-cost averaging: a scheduled entry every 24 candles, a 2% dip as
/// overlay, and half the position taken off at each 3% recovery.
pub fn dca() -> LadderConfig {
    LadderConfig {
        initial_drop_percent: 2.0,
        level_drop_percent: 3.0,
        max_levels: 10,
        profit_target_percent: 3.0,
        base_size: 5.0,
        sizing: SizingMode::PercentOfBalance,
        progression: Progression::Linear,
        ratio_multiplier: 1.0,
        max_position_percent: 60.0,
        high_lookback: 20,
        interval_candles: Some(24),
        partial_exit_fraction: Some(0.5),
        vault_allocation: 10.0,
        btc_growth_allocation: 5.0,
    }
}

/// Ultra-micro scalping: 0.15%/0.1% triggers, a 0.45% nominal target the
/// fee-drag discount brings to ~0.32%.
pub fn micro_scalp() -> LadderConfig {
    LadderConfig {
        initial_drop_percent: 0.15,
        level_drop_percent: 0.1,
        max_levels: 15,
        profit_target_percent: 0.45,
        base_size: 2.0,
        sizing: SizingMode::PercentOfBalance,
        progression: Progression::Geometric,
        ratio_multiplier: 1.3,
        max_position_percent: 40.0,
        high_lookback: 30,
        interval_candles: None,
        partial_exit_fraction: None,
        vault_allocation: 10.0,
        btc_growth_allocation: 5.0,
    }
}

/// The shallowest ladder: two levels, 0.05% triggers, 0.1% nominal target
pub fn nano_scalp() -> LadderConfig {
    LadderConfig {
        initial_drop_percent: 0.05,
        level_drop_percent: 0.05,
        max_levels: 2,
        profit_target_percent: 0.1,
        base_size: 1.5,
        sizing: SizingMode::PercentOfBalance,
        progression: Progression::Geometric,
        ratio_multiplier: 2.0,
        max_position_percent: 20.0,
        high_lookback: 5,
        interval_candles: None,
        partial_exit_fraction: None,
        vault_allocation: 10.0,
        btc_growth_allocation: 5.0,
    }
}

/// Ten-level grid, band auto-derived from volatility
pub fn grid() -> GridConfig {
    GridConfig {
        grid_levels: 10,
        lower_bound: None,
        upper_bound: None,
        range_multiplier: 5.0,
        volatility_window: 20,
        order_size_percent: 5.0,
        max_position_percent: 50.0,
        auto_adjust_bounds: false,
        tolerance_percent: 0.1,
        vault_allocation: 10.0,
        btc_growth_allocation: 5.0,
    }
}

/// RSI + MACD + EMA momentum scalping
pub fn momentum_scalp() -> ScalpingConfig {
    ScalpingConfig {
        rsi_period: 14,
        rsi_oversold: 30.0,
        rsi_overbought: 70.0,
        macd_fast: 12,
        macd_slow: 26,
        macd_signal: 9,
        ema_fast: 9,
        ema_slow: 21,
        use_trend_filter: true,
        min_volume: 1_000.0,
        position_percent: 10.0,
        max_open_positions: 3,
        max_position_percent: 40.0,
        stop_loss_percent: 1.0,
        profit_target_percent: 1.5,
        trailing_stop_percent: None,
        use_vwap_filter: false,
        vwap_period: 20,
        vwap_anchored: false,
        vwap_deviation_buy: 2.0,
        vwap_deviation_sell: 2.0,
        use_divergence: false,
        vault_allocation: 10.0,
        btc_growth_allocation: 5.0,
    }
}

/// Scalping confirmed by anchored-VWAP band touches and divergence
pub fn vwap_scalp() -> ScalpingConfig {
    ScalpingConfig {
        use_vwap_filter: true,
        vwap_anchored: true,
        use_divergence: true,
        trailing_stop_percent: Some(0.5),
        profit_target_percent: 1.0,
        ..momentum_scalp()
    }
}
