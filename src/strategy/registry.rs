//! Strategy registry: identifier -> factory map
//!
//! Thin construction layer over the strategy implementations. Factories
//! start from the preset configuration for their identifier and merge any
//! caller-supplied JSON parameters over it before validation.

use std::collections::HashMap;

use serde_json::Value;

use crate::strategy::implementations::{GridStrategy, LadderStrategy, ScalpingStrategy};
use crate::strategy::{presets, Strategy};
use crate::{Error, Result};

/// Factory closure stored per identifier
pub type StrategyFactory = Box<dyn Fn(Option<&Value>) -> Result<Box<dyn Strategy>> + Send + Sync>;

/// Strategy registry
pub struct StrategyRegistry {
    factories: HashMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    /// Registry with every built-in strategy registered
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };

        registry.register("reverse_ratio", |params| {
            let mut config = presets::reverse_ratio();
            if let Some(value) = params {
                config.merge_params(value)?;
            }
            Ok(Box::new(LadderStrategy::new("reverse_ratio", config)?))
        });

        registry.register("reverse_ratio_aggressive", |params| {
            let mut config = presets::reverse_ratio_aggressive();
            if let Some(value) = params {
                config.merge_params(value)?;
            }
            Ok(Box::new(LadderStrategy::new(
                "reverse_ratio_aggressive",
                config,
            )?))
        });

        registry.register("dca", |params| {
            let mut config = presets::dca();
            if let Some(value) = params {
                config.merge_params(value)?;
            }
            Ok(Box::new(LadderStrategy::new("dca", config)?))
        });

        registry.register("micro_scalp", |params| {
            let mut config = presets::micro_scalp();
            if let Some(value) = params {
                config.merge_params(value)?;
            }
            Ok(Box::new(LadderStrategy::new("micro_scalp", config)?))
        });

        registry.register("nano_scalp", |params| {
            let mut config = presets::nano_scalp();
            if let Some(value) = params {
                config.merge_params(value)?;
            }
            Ok(Box::new(LadderStrategy::new("nano_scalp", config)?))
        });

        registry.register("grid", |params| {
            let mut config = presets::grid();
            if let Some(value) = params {
                config.merge_params(value)?;
            }
            Ok(Box::new(GridStrategy::new("grid", config)?))
        });

        registry.register("momentum_scalp", |params| {
            let mut config = presets::momentum_scalp();
            if let Some(value) = params {
                config.merge_params(value)?;
            }
            Ok(Box::new(ScalpingStrategy::new("momentum_scalp", config)?))
        });

        registry.register("vwap_scalp", |params| {
            let mut config = presets::vwap_scalp();
            if let Some(value) = params {
                config.merge_params(value)?;
            }
            Ok(Box::new(ScalpingStrategy::new("vwap_scalp", config)?))
        });

        registry
    }

    /// Register a strategy factory under an identifier
    pub fn register<F>(&mut self, identifier: &str, factory: F)
    where
        F: Fn(Option<&Value>) -> Result<Box<dyn Strategy>> + Send + Sync + 'static,
    {
        self.factories
            .insert(identifier.to_string(), Box::new(factory));
    }

    /// Create a strategy instance by identifier
    pub fn create(&self, identifier: &str, params: Option<&Value>) -> Result<Box<dyn Strategy>> {
        let factory = self
            .factories
            .get(identifier)
            .ok_or_else(|| Error::UnknownStrategy(identifier.to_string()))?;
        factory(params)
    }

    /// Identifiers of every registered strategy
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether an identifier is registered
    pub fn contains(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
