//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use lp_autopilot_execution::prelude::*;
//! ```

// Config
pub use crate::config::{ConfigError, ManagerConfig};

// Errors
pub use crate::error::ManagerError;

// Guard
pub use crate::guard::{GuardToken, ReentrancyGuard};

// Ledger
pub use crate::ledger::{Effects, ManagerState, StateTransaction};

// Lifecycle
pub use crate::lifecycle::{
    AggregateStats, CompoundData, EventData, LifecycleEvent, LifecycleEventType,
    LifecycleTracker, PositionCreatedData, PositionSummary, RebalanceData, RebalanceReason,
};

// Manager
pub use crate::manager::{CreatedPosition, LiquidityManager};

// Strategy
pub use crate::strategy::{
    CompoundOutcome, Compounder, DistributionOutcome, FeeDistributor, RebalanceConfig,
    RebalanceDecision, RebalanceOutcome, Rebalancer, ReferenceTick, trade_fees,
};
