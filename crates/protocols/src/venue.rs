//! Venue interface consumed by the manager.

use crate::hooks::HookError;
use lp_autopilot_domain::entities::{VenueId, VenueKey};
use lp_autopilot_domain::error::MathError;
use lp_autopilot_domain::value_objects::Address;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a venue.
#[derive(Debug, Error)]
pub enum VenueError {
    /// No venue is registered under this id.
    #[error("unknown venue {0}")]
    UnknownVenue(VenueId),
    /// The venue was initialized twice.
    #[error("venue {0} is already initialized")]
    AlreadyInitialized(VenueId),
    /// Malformed venue key.
    #[error("malformed venue key")]
    InvalidVenueKey,
    /// Range bounds unordered, off-grid or outside the usable ticks.
    #[error("invalid range [{lower}, {upper}]")]
    InvalidRange {
        /// Lower tick.
        lower: i32,
        /// Upper tick.
        upper: i32,
    },
    /// Swap target on the wrong side of the current tick.
    #[error("swap target tick {target} moves against direction from {current}")]
    InvalidSwap {
        /// Current tick.
        current: i32,
        /// Requested target tick.
        target: i32,
    },
    /// The oracle does not reach back far enough.
    #[error("oracle history does not cover a {window_secs}s window")]
    InsufficientHistory {
        /// Requested window.
        window_secs: u32,
    },
    /// Removing more liquidity than the caller holds on the range.
    #[error("liquidity underflow on [{lower}, {upper}]")]
    LiquidityUnderflow {
        /// Lower tick.
        lower: i32,
        /// Upper tick.
        upper: i32,
    },
    /// A caller whose changes are reported to hooks submitted more than one change.
    #[error("batch of {changes} changes from a hooked caller; submit changes one at a time")]
    HookedBatch {
        /// Number of changes submitted.
        changes: usize,
    },
    /// A registered hook rejected the operation; the operation was reverted.
    #[error("operation reverted by hook: {0}")]
    HookRejected(#[from] HookError),
    /// Failure injected by a test harness.
    #[error("injected venue failure")]
    Injected,
    /// The venue's internal lock is poisoned.
    #[error("venue state unavailable")]
    Unavailable,
    /// Numeric failure inside the venue.
    #[error(transparent)]
    Math(#[from] MathError),
}

/// Current price of a venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot0 {
    /// Q64.96 square root of the price.
    pub sqrt_price_x96: U256,
    /// Tick of the current price.
    pub tick: i32,
}

/// Signed token movements from the caller's point of view.
///
/// Negative amounts are paid to the venue, positive amounts received.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    pub amount0: i128,
    pub amount1: i128,
}

impl BalanceDelta {
    pub const ZERO: Self = Self {
        amount0: 0,
        amount1: 0,
    };

    pub fn new(amount0: i128, amount1: i128) -> Self {
        Self { amount0, amount1 }
    }
}

/// A trade request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapParams {
    /// `true` sells asset 0 for asset 1.
    pub zero_for_one: bool,
    /// Exact input, fee included.
    pub amount_in: u128,
}

/// One liquidity modification on a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityChange {
    pub tick_lower: i32,
    pub tick_upper: i32,
    /// Positive adds, negative removes, zero only pokes.
    pub liquidity_delta: i128,
}

impl LiquidityChange {
    pub fn add(tick_lower: i32, tick_upper: i32, liquidity: u128) -> Result<Self, MathError> {
        Ok(Self {
            tick_lower,
            tick_upper,
            liquidity_delta: i128::try_from(liquidity)
                .map_err(|_| MathError::Overflow("liquidity delta"))?,
        })
    }

    pub fn remove(tick_lower: i32, tick_upper: i32, liquidity: u128) -> Result<Self, MathError> {
        let magnitude =
            i128::try_from(liquidity).map_err(|_| MathError::Overflow("liquidity delta"))?;
        Ok(Self {
            tick_lower,
            tick_upper,
            liquidity_delta: -magnitude,
        })
    }

    pub fn poke(tick_lower: i32, tick_upper: i32) -> Self {
        Self {
            tick_lower,
            tick_upper,
            liquidity_delta: 0,
        }
    }
}

/// What the manager needs from a concentrated-liquidity venue.
pub trait LiquidityVenue: Send + Sync {
    /// Current price and tick.
    fn slot0(&self, venue: &VenueKey) -> Result<Slot0, VenueError>;

    /// Arithmetic mean tick over the trailing `window_secs`.
    fn time_weighted_tick(&self, venue: &VenueKey, window_secs: u32) -> Result<i32, VenueError>;

    /// Applies every change in `changes` or none of them.
    ///
    /// Callers whose changes are reported to hooks submit one change per
    /// call; anything else fails with [`VenueError::HookedBatch`].
    /// Returns one delta per change, in order.
    fn modify_liquidity(
        &self,
        caller: Address,
        venue: &VenueKey,
        changes: &[LiquidityChange],
    ) -> Result<Vec<BalanceDelta>, VenueError>;

    /// Logical time in seconds.
    fn timestamp(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liquidity_change_constructors() {
        let add = LiquidityChange::add(-60, 60, 1_000).unwrap();
        assert_eq!(add.liquidity_delta, 1_000);
        let remove = LiquidityChange::remove(-60, 60, 1_000).unwrap();
        assert_eq!(remove.liquidity_delta, -1_000);
        assert_eq!(LiquidityChange::poke(-60, 60).liquidity_delta, 0);
        assert!(LiquidityChange::add(-60, 60, u128::MAX).is_err());
    }
}
