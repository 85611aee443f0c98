//! Decision and update engine for managed liquidity positions.
//!
//! This crate provides the manager the venue calls back into:
//! - Position ledger and per-venue index with transactional staging
//! - Round-robin fee distribution under a per-call work bound
//! - Interval-gated fee compounding
//! - Manipulation-resistant, slippage-bounded range repositioning
//! - Reentrancy guard and whole-call atomicity
//! - Position lifecycle tracking

/// Prelude module for convenient imports.
pub mod prelude;

/// Operating parameters.
pub mod config;
/// Error types.
pub mod error;
/// Reentrancy guard.
pub mod guard;
/// Ledger, venue index and staging.
pub mod ledger;
/// Position lifecycle tracking.
pub mod lifecycle;
/// Orchestrator.
pub mod manager;
/// Distribution, compounding and rebalancing engines.
pub mod strategy;

pub use config::{ConfigError, ManagerConfig};
pub use error::ManagerError;
pub use manager::{CreatedPosition, LiquidityManager};
