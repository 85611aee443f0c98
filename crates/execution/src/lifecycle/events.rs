//! Lifecycle events for position tracking.

use lp_autopilot_domain::entities::{PositionKey, VenueId};
use lp_autopilot_domain::value_objects::Address;
use serde::{Deserialize, Serialize};

/// Type of lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEventType {
    /// Position was created.
    PositionCreated,
    /// Accrued fees were converted into liquidity.
    Compounded,
    /// Position was moved to a new range.
    Rebalanced,
}

/// A lifecycle event for a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Event ID.
    pub id: String,
    /// Event type.
    pub event_type: LifecycleEventType,
    /// Position key.
    pub position: PositionKey,
    /// Venue id.
    pub venue: VenueId,
    /// Venue time of the call that produced the event.
    pub timestamp: u64,
    /// Wall-clock time the event was built.
    pub recorded_at: chrono::DateTime<chrono::Utc>,
    /// Event-specific data.
    pub data: EventData,
}

impl LifecycleEvent {
    /// Creates a new lifecycle event; the type follows from `data`.
    pub fn new(position: PositionKey, venue: VenueId, timestamp: u64, data: EventData) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: data.event_type(),
            position,
            venue,
            timestamp,
            recorded_at: chrono::Utc::now(),
            data,
        }
    }
}

/// Event-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventData {
    /// Position created data.
    PositionCreated(PositionCreatedData),
    /// Compounding data.
    Compounded(CompoundData),
    /// Rebalance data.
    Rebalanced(RebalanceData),
}

impl EventData {
    pub fn event_type(&self) -> LifecycleEventType {
        match self {
            Self::PositionCreated(_) => LifecycleEventType::PositionCreated,
            Self::Compounded(_) => LifecycleEventType::Compounded,
            Self::Rebalanced(_) => LifecycleEventType::Rebalanced,
        }
    }
}

/// Data for position created event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCreatedData {
    /// Owner of the position.
    pub owner: Address,
    /// Lower tick.
    pub tick_lower: i32,
    /// Upper tick.
    pub tick_upper: i32,
    /// Initial liquidity.
    pub liquidity: u128,
    /// Asset 0 owed by the owner.
    pub amount0: u128,
    /// Asset 1 owed by the owner.
    pub amount1: u128,
}

/// Data for compounding event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundData {
    /// Asset 0 fees taken from the position.
    pub fee0: u128,
    /// Asset 1 fees taken from the position.
    pub fee1: u128,
    /// Liquidity the fees converted into. Zero means the fees were dust.
    pub liquidity_added: u128,
    /// Liquidity after compounding.
    pub new_liquidity: u128,
}

/// Data for rebalance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceData {
    /// Old lower tick.
    pub old_tick_lower: i32,
    /// Old upper tick.
    pub old_tick_upper: i32,
    /// New lower tick.
    pub new_tick_lower: i32,
    /// New upper tick.
    pub new_tick_upper: i32,
    /// Liquidity before rebalance.
    pub old_liquidity: u128,
    /// Liquidity after rebalance.
    pub new_liquidity: u128,
    /// Tick the new range was centered on.
    pub reference_tick: i32,
    /// Spot tick at the time of the call.
    pub spot_tick: i32,
    /// Whether the time-weighted tick replaced the spot tick.
    pub used_time_weighted: bool,
    /// Asset 0 released from the old range.
    pub released0: u128,
    /// Asset 1 released from the old range.
    pub released1: u128,
    /// Asset 0 released but not redeployed.
    pub leftover0: u128,
    /// Asset 1 released but not redeployed.
    pub leftover1: u128,
    /// Reason for rebalance.
    pub reason: RebalanceReason,
}

/// Reason for rebalancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceReason {
    /// Reference tick within the buffer of the lower edge, or below it.
    NearLowerEdge,
    /// Reference tick within the buffer of the upper edge, or above it.
    NearUpperEdge,
}
