//! Prelude module for convenient imports.
//!
//! ```rust
//! use lp_autopilot_protocols::prelude::*;
//! ```

pub use crate::hooks::{HookAck, HookError, VenueHooks};
pub use crate::simulated::{Observation, SimulatedVenue};
pub use crate::venue::{
    BalanceDelta, LiquidityChange, LiquidityVenue, Slot0, SwapParams, VenueError,
};
