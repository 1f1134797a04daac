//! Crate error types
//!
//! Only construction can fail: a strategy with a bad configuration must be
//! rejected before the first tick. Everything that goes wrong mid-tick
//! (missing data, portfolio drift) resolves to a `hold` signal instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected at construction: the configuration cannot produce a
    /// well-formed strategy (non-positive period, inverted grid bounds, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The registry has no factory under this identifier.
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    /// Strategy parameters could not be parsed.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}
