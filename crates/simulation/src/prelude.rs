//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use lp_autopilot_simulation::prelude::*;
//! ```

// Errors
pub use crate::error::SimulationError;

// Price path generators
pub use crate::price_path::{DeterministicPricePath, GeometricBrownianMotion, PricePathGenerator};

// Runs
pub use crate::runner::{PositionReport, SimulationConfig, SimulationRunner, SimulationSummary};

// Walkthrough
pub use crate::scenario::{ScenarioConfig, ScenarioReport, run_scenario};
