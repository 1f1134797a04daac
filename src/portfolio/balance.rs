//! Balance snapshot

use serde::{Deserialize, Serialize};

/// Caller-reported account balances
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PortfolioBalance {
    /// Free quote currency available for entries
    pub usd: f64,
    /// Quote currency parked in the profit vault
    pub vault: f64,
    /// Base units held across open positions
    pub btc_positions: f64,
}

impl PortfolioBalance {
    pub fn new(usd: f64) -> Self {
        Self {
            usd,
            vault: 0.0,
            btc_positions: 0.0,
        }
    }

    /// Whether the free balance covers an order of `amount`
    pub fn can_afford(&self, amount: f64) -> bool {
        self.usd >= amount
    }
}
