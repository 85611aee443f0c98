//! Callbacks the venue invokes after it has applied an operation.
//!
//! The venue holds a weak reference to the implementor and calls it once the
//! operation's effects are in place. Returning an error makes the venue
//! revert the operation that triggered the callback.

use crate::venue::{BalanceDelta, LiquidityChange, SwapParams};
use lp_autopilot_domain::entities::VenueKey;
use lp_autopilot_domain::value_objects::Address;
use std::error::Error;
use thiserror::Error;

/// Acknowledgement returned by a successful callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAck {
    AfterSwap,
    AfterModifyLiquidity,
}

/// A callback failure, carrying the implementor's own error.
#[derive(Debug, Error)]
#[error("hook failed: {0}")]
pub struct HookError(#[source] Box<dyn Error + Send + Sync>);

impl HookError {
    pub fn new(source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self(source.into())
    }

    /// The implementor's error, for downcasting.
    pub fn inner(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

/// Implemented by whatever the venue notifies.
pub trait VenueHooks: Send + Sync {
    /// Called after a trade settled. `delta` is the trader's.
    fn after_swap(
        &self,
        venue: &VenueKey,
        params: &SwapParams,
        delta: BalanceDelta,
    ) -> Result<HookAck, HookError>;

    /// Called after each liquidity change applied for `caller`.
    fn after_modify_liquidity(
        &self,
        venue: &VenueKey,
        caller: Address,
        change: &LiquidityChange,
        delta: BalanceDelta,
        fees_released: BalanceDelta,
    ) -> Result<HookAck, HookError>;
}
