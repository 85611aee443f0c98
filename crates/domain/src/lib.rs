//! Core domain types for the liquidity autopilot.
//!
//! This crate holds the pure parts of the system:
//! - Q64.96 fixed-point price and liquidity math
//! - Venue and position entities with their deterministic keys
//! - Fee arithmetic shared by the venue and the manager
//!
//! Nothing here performs I/O or holds shared state.

/// Position and venue entities.
pub mod entities;
/// Numeric error types.
pub mod error;
/// Fee arithmetic.
pub mod fees;
/// Fixed-point math.
pub mod math;
/// Prelude module for convenient imports.
pub mod prelude;
/// Small value types.
pub mod value_objects;

pub use error::MathError;
