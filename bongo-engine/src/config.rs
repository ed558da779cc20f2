//! Validated engine configuration

use std::time::Duration;

use crate::classifier::SplitBoundary;
use crate::error::ConfigError;

/// Everything the engine and timer need, checked once at startup.
///
/// The engine carries no timing defaults; cooldown and tick period always come
/// from the caller's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    boundary: SplitBoundary,
    cooldown: Duration,
    tick_period: Duration,
}

impl EngineConfig {
    pub fn new(
        boundary: SplitBoundary,
        cooldown: Duration,
        tick_period: Duration,
    ) -> Result<Self, ConfigError> {
        if cooldown.is_zero() {
            return Err(ConfigError::ZeroDuration { name: "cooldown" });
        }
        if tick_period.is_zero() {
            return Err(ConfigError::ZeroDuration {
                name: "tick period",
            });
        }
        if tick_period > cooldown {
            tracing::warn!(
                "Tick period {:?} exceeds cooldown {:?}; idle decay will lag by up to one tick",
                tick_period,
                cooldown
            );
        }
        Ok(Self {
            boundary,
            cooldown,
            tick_period,
        })
    }

    pub fn boundary(&self) -> SplitBoundary {
        self.boundary
    }

    /// Inactivity after the last release before the idle pose returns
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// How often the timer re-evaluates decay
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }
}
