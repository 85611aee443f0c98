//! Operating parameters of a manager instance.
//!
//! Parameters are fixed for the lifetime of a manager: they are read once,
//! validated, and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

const BPS_DENOMINATOR: u32 = 10_000;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("{var} has invalid value {value:?}")]
    Parse {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
    /// A parsed configuration violates a constraint.
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Operating parameters of the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Window of the time-weighted reference tick, in seconds.
    pub twap_window_secs: u32,
    /// Largest tolerated distance between spot and time-weighted tick.
    pub max_tick_deviation: i32,
    /// Tolerated liquidity loss on a reposition, in basis points.
    pub slippage_tolerance_bps: u32,
    /// Most positions visited by one distribution pass.
    pub distribution_batch_cap: usize,
    /// Minimum time between two compoundings of a position, in seconds.
    pub min_compound_interval_secs: u64,
    /// Distance from a range edge, in tick spacings, that triggers a reposition.
    pub rebalance_buffer_spacings: i32,
    /// Half width of a repositioned range, in tick spacings.
    pub rebalance_half_width_spacings: i32,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            twap_window_secs: 1_800,          // 30 minutes
            max_tick_deviation: 100,          // ~1% price move
            slippage_tolerance_bps: 100,      // 1%
            distribution_batch_cap: 50,
            min_compound_interval_secs: 3_600, // 1 hour
            rebalance_buffer_spacings: 2,
            rebalance_half_width_spacings: 20,
        }
    }
}

impl ManagerConfig {
    pub const ENV_TWAP_WINDOW_SECS: &'static str = "LP_AUTOPILOT_TWAP_WINDOW_SECS";
    pub const ENV_MAX_TICK_DEVIATION: &'static str = "LP_AUTOPILOT_MAX_TICK_DEVIATION";
    pub const ENV_SLIPPAGE_BPS: &'static str = "LP_AUTOPILOT_SLIPPAGE_BPS";
    pub const ENV_BATCH_CAP: &'static str = "LP_AUTOPILOT_BATCH_CAP";
    pub const ENV_MIN_COMPOUND_INTERVAL_SECS: &'static str =
        "LP_AUTOPILOT_MIN_COMPOUND_INTERVAL_SECS";
    pub const ENV_REBALANCE_BUFFER_SPACINGS: &'static str =
        "LP_AUTOPILOT_REBALANCE_BUFFER_SPACINGS";
    pub const ENV_REBALANCE_HALF_WIDTH_SPACINGS: &'static str =
        "LP_AUTOPILOT_REBALANCE_HALF_WIDTH_SPACINGS";

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        override_with(&lookup, Self::ENV_TWAP_WINDOW_SECS, &mut config.twap_window_secs)?;
        override_with(&lookup, Self::ENV_MAX_TICK_DEVIATION, &mut config.max_tick_deviation)?;
        override_with(&lookup, Self::ENV_SLIPPAGE_BPS, &mut config.slippage_tolerance_bps)?;
        override_with(&lookup, Self::ENV_BATCH_CAP, &mut config.distribution_batch_cap)?;
        override_with(
            &lookup,
            Self::ENV_MIN_COMPOUND_INTERVAL_SECS,
            &mut config.min_compound_interval_secs,
        )?;
        override_with(
            &lookup,
            Self::ENV_REBALANCE_BUFFER_SPACINGS,
            &mut config.rebalance_buffer_spacings,
        )?;
        override_with(
            &lookup,
            Self::ENV_REBALANCE_HALF_WIDTH_SPACINGS,
            &mut config.rebalance_half_width_spacings,
        )?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.distribution_batch_cap == 0 {
            return Err(ConfigError::Invalid("distribution batch cap must be positive"));
        }
        if self.slippage_tolerance_bps >= BPS_DENOMINATOR {
            return Err(ConfigError::Invalid("slippage tolerance must be below 100%"));
        }
        if self.twap_window_secs == 0 {
            return Err(ConfigError::Invalid("twap window must be positive"));
        }
        if self.max_tick_deviation < 0 {
            return Err(ConfigError::Invalid("max tick deviation must not be negative"));
        }
        if self.rebalance_half_width_spacings <= 0 {
            return Err(ConfigError::Invalid("rebalance half width must be positive"));
        }
        if self.rebalance_buffer_spacings < 0
            || self.rebalance_buffer_spacings >= self.rebalance_half_width_spacings
        {
            return Err(ConfigError::Invalid(
                "rebalance buffer must be non-negative and narrower than the half width",
            ));
        }
        Ok(())
    }
}

fn override_with<F, T>(lookup: &F, var: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(raw) = lookup(var) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Parse { var, value: raw })?;
    }
    Ok(())
}
