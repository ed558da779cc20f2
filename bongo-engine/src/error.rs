//! Engine configuration error types

use thiserror::Error;

/// Errors from validating animation engine configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A split boundary of zero would put every key on the right half
    #[error("Invalid split threshold: {0} (left half needs at least one key)")]
    InvalidThreshold(u32),

    /// A timing value was zero
    #[error("Invalid {name}: must be greater than zero")]
    ZeroDuration { name: &'static str },

    /// A required setting was not supplied
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}
