//! Boundary between the manager and the trading venue it is attached to.
//!
//! This crate provides:
//! - The [`LiquidityVenue`] trait the manager consumes (prices, oracle, liquidity batches)
//! - The [`VenueHooks`] trait the venue calls back into after swaps and liquidity changes
//! - Wire types shared by both directions
//! - An in-memory [`SimulatedVenue`] for tests, simulations and the CLI

/// Prelude module for convenient imports.
pub mod prelude;

/// Callback interface implemented by the manager.
pub mod hooks;
/// In-memory venue.
pub mod simulated;
/// Venue interface and wire types.
pub mod venue;

pub use hooks::{HookAck, HookError, VenueHooks};
pub use simulated::{Observation, SimulatedVenue};
pub use venue::{
    BalanceDelta, LiquidityChange, LiquidityVenue, Slot0, SwapParams, VenueError,
};
