//! Maintenance engines run by the manager.
//!
//! Every engine works on a [`StateTransaction`](crate::ledger::StateTransaction):
//! it reads and stages state there and queues venue liquidity changes instead
//! of submitting them.

mod compound;
mod distribution;
mod rebalance;

pub use compound::{CompoundOutcome, Compounder};
pub use distribution::{DistributionOutcome, FeeDistributor, trade_fees};
pub use rebalance::{
    RebalanceConfig, RebalanceDecision, RebalanceOutcome, Rebalancer, ReferenceTick,
};
