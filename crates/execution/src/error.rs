//! Errors returned by the manager's entry points.

use crate::config::ConfigError;
use lp_autopilot_domain::entities::PositionKey;
use lp_autopilot_domain::error::MathError;
use lp_autopilot_protocols::VenueError;
use thiserror::Error;

/// Why a call was aborted. Whatever the variant, no state was changed.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// A call arrived while another one was still in flight.
    #[error("reentrant call rejected")]
    Reentrancy,
    /// A previous call panicked while holding the state lock.
    #[error("manager state is poisoned")]
    StatePoisoned,
    /// A position already exists for the derived key.
    #[error("position {0} already exists")]
    DuplicatePosition(PositionKey),
    /// The zero address cannot own a position.
    #[error("owner must not be the zero address")]
    InvalidOwner,
    /// Unordered assets, zero spacing or fee out of bounds.
    #[error("malformed venue key")]
    InvalidVenue,
    /// Range bounds that the venue grid cannot represent.
    #[error("invalid range [{lower}, {upper}]: {reason}")]
    InvalidRange {
        /// Lower tick.
        lower: i32,
        /// Upper tick.
        upper: i32,
        /// Which check failed.
        reason: &'static str,
    },
    /// Creation with zero liquidity.
    #[error("liquidity must be positive")]
    ZeroLiquidity,
    /// Redeploying would lose more liquidity than tolerated.
    #[error("slippage exceeded: new liquidity {new_liquidity} below floor {min_liquidity}")]
    SlippageExceeded {
        /// Liquidity the new range would receive.
        new_liquidity: u128,
        /// Smallest acceptable liquidity.
        min_liquidity: u128,
    },
    /// Fixed-point failure.
    #[error(transparent)]
    Math(#[from] MathError),
    /// The venue rejected a read or the liquidity batch.
    #[error("venue call failed: {0}")]
    Venue(#[from] VenueError),
    /// Invalid configuration at construction.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
