//! Trading signals

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Signal type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// Buy/Long signal
    Buy,
    /// Sell signal
    Sell,
    /// Hold/No action
    Hold,
}

/// Trading signal
///
/// Produced fresh on every [`analyze`](crate::strategy::Strategy::analyze)
/// call and never persisted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Signal type
    pub kind: SignalKind,
    /// Signal strength in [0, 1]
    pub strength: f64,
    /// Price the decision was made at
    pub price: f64,
    /// Suggested size in base units, when the strategy already knows it
    /// (ladder exits); entries are sized by `calculate_position_size`
    pub size: Option<f64>,
    /// Human-readable reason
    pub reason: String,
    /// Open metadata bag for UI/logging consumers
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Signal {
    /// Create a buy signal
    pub fn buy(price: f64, strength: f64, reason: impl Into<String>) -> Self {
        Self {
            kind: SignalKind::Buy,
            strength: strength.clamp(0.0, 1.0),
            price,
            size: None,
            reason: reason.into(),
            metadata: Map::new(),
        }
    }

    /// Create a sell signal
    pub fn sell(price: f64, strength: f64, reason: impl Into<String>) -> Self {
        Self {
            kind: SignalKind::Sell,
            strength: strength.clamp(0.0, 1.0),
            price,
            size: None,
            reason: reason.into(),
            metadata: Map::new(),
        }
    }

    /// Create a hold signal
    pub fn hold(price: f64, reason: impl Into<String>) -> Self {
        Self {
            kind: SignalKind::Hold,
            strength: 0.0,
            price,
            size: None,
            reason: reason.into(),
            metadata: Map::new(),
        }
    }

    /// Set the suggested size
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size.max(0.0));
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Whether this signal closes out a full ladder cycle
    pub fn is_complete_exit(&self) -> bool {
        self.metadata
            .get("is_complete_exit")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strength_is_clamped() {
        assert_eq!(Signal::buy(100.0, 1.7, "x").strength, 1.0);
        assert_eq!(Signal::sell(100.0, -0.3, "x").strength, 0.0);
    }

    #[test]
    fn complete_exit_flag() {
        let plain = Signal::sell(100.0, 0.9, "target");
        assert!(!plain.is_complete_exit());

        let full = Signal::sell(100.0, 0.9, "target").with_metadata("is_complete_exit", true);
        assert!(full.is_complete_exit());
    }

    #[test]
    fn negative_size_is_floored() {
        let signal = Signal::sell(100.0, 0.9, "x").with_size(-1.0);
        assert_eq!(signal.size, Some(0.0));
    }
}
