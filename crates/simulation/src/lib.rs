//! # LP Autopilot Simulation
//!
//! Drives a liquidity manager against the in-memory venue.
//!
//! - [`price_path`]: seeded GBM and scripted tick paths
//! - [`runner`]: multi-position runs along a path
//! - [`scenario`]: a scripted single-position walkthrough

/// Prelude module for convenient imports.
pub mod prelude;

/// Simulation errors.
pub mod error;
/// Price path generators.
pub mod price_path;
/// Path-driven runs.
pub mod runner;
/// Scripted walkthrough.
pub mod scenario;

pub use error::SimulationError;
