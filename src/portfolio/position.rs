//! Position tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An open long position, owned by the caller's portfolio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Entry price
    pub entry_price: f64,
    /// Quantity held (base units, > 0)
    pub size: f64,
    /// Highest price seen since entry, for trailing-stop tracking
    pub highest_price: Option<f64>,
    /// Entry time
    pub entry_time: DateTime<Utc>,
    /// Open metadata bag (ladder level, originating strategy, ...)
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Position {
    /// Create a new long position
    pub fn new(entry_price: f64, size: f64, entry_time: DateTime<Utc>) -> Self {
        Self {
            entry_price,
            size,
            highest_price: None,
            entry_time,
            metadata: Map::new(),
        }
    }

    /// Position value at the given price
    pub fn value(&self, price: f64) -> f64 {
        self.size * price
    }

    /// Value committed at entry
    pub fn entry_value(&self) -> f64 {
        self.size * self.entry_price
    }

    /// Unrealized P&L as a percentage of the entry price
    pub fn unrealized_pnl_percent(&self, price: f64) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        (price - self.entry_price) / self.entry_price * 100.0
    }

    /// Record a new price, ratcheting `highest_price` upward.
    ///
    /// Callers drive this per tick; trailing-stop predicates only read it.
    pub fn track_high(&mut self, price: f64) {
        match self.highest_price {
            Some(high) if high >= price => {}
            _ => self.highest_price = Some(price),
        }
    }
}
