//! Lifecycle tracker for position history.

use super::{EventData, LifecycleEvent};
use lp_autopilot_domain::entities::{PositionKey, VenueId};
use lp_autopilot_domain::value_objects::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Summary of a position's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSummary {
    /// Position key.
    pub position: PositionKey,
    /// Venue id.
    pub venue: VenueId,
    /// Owner.
    pub owner: Address,
    /// Venue time of creation.
    pub created_at: u64,
    /// Venue time of the latest event.
    pub last_activity: u64,
    /// Current lower tick.
    pub tick_lower: i32,
    /// Current upper tick.
    pub tick_upper: i32,
    /// Current liquidity.
    pub liquidity: u128,
    /// Number of compoundings, dust ones included.
    pub compound_count: u32,
    /// Number of rebalances.
    pub rebalance_count: u32,
    /// Asset 0 fees compounded or dropped as dust.
    pub total_fees0: u128,
    /// Asset 1 fees compounded or dropped as dust.
    pub total_fees1: u128,
    /// Liquidity added by compounding.
    pub total_liquidity_compounded: u128,
}

/// Tracks lifecycle events for all positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LifecycleTracker {
    /// Events in the order they were recorded.
    events: Vec<LifecycleEvent>,
    /// Indices into `events` by position.
    by_position: HashMap<PositionKey, Vec<usize>>,
    /// Position summaries.
    summaries: HashMap<PositionKey, PositionSummary>,
}

impl LifecycleTracker {
    /// Creates a new lifecycle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event and folds it into the position's summary.
    pub fn record(&mut self, event: LifecycleEvent) {
        match &event.data {
            EventData::PositionCreated(data) => {
                self.summaries.insert(
                    event.position,
                    PositionSummary {
                        position: event.position,
                        venue: event.venue,
                        owner: data.owner,
                        created_at: event.timestamp,
                        last_activity: event.timestamp,
                        tick_lower: data.tick_lower,
                        tick_upper: data.tick_upper,
                        liquidity: data.liquidity,
                        compound_count: 0,
                        rebalance_count: 0,
                        total_fees0: 0,
                        total_fees1: 0,
                        total_liquidity_compounded: 0,
                    },
                );

                info!(
                    position = %event.position,
                    owner = %data.owner,
                    range = format!("[{}, {}]", data.tick_lower, data.tick_upper),
                    liquidity = data.liquidity,
                    "Position created"
                );
            }
            EventData::Compounded(data) => {
                if let Some(summary) = self.summaries.get_mut(&event.position) {
                    summary.compound_count += 1;
                    summary.total_fees0 = summary.total_fees0.saturating_add(data.fee0);
                    summary.total_fees1 = summary.total_fees1.saturating_add(data.fee1);
                    summary.total_liquidity_compounded = summary
                        .total_liquidity_compounded
                        .saturating_add(data.liquidity_added);
                    summary.liquidity = data.new_liquidity;
                    summary.last_activity = event.timestamp;
                }

                info!(
                    position = %event.position,
                    fee0 = data.fee0,
                    fee1 = data.fee1,
                    liquidity_added = data.liquidity_added,
                    "Fees compounded"
                );
            }
            EventData::Rebalanced(data) => {
                if let Some(summary) = self.summaries.get_mut(&event.position) {
                    summary.rebalance_count += 1;
                    summary.tick_lower = data.new_tick_lower;
                    summary.tick_upper = data.new_tick_upper;
                    summary.liquidity = data.new_liquidity;
                    summary.last_activity = event.timestamp;
                }

                info!(
                    position = %event.position,
                    old_range = format!("[{}, {}]", data.old_tick_lower, data.old_tick_upper),
                    new_range = format!("[{}, {}]", data.new_tick_lower, data.new_tick_upper),
                    old_liquidity = data.old_liquidity,
                    new_liquidity = data.new_liquidity,
                    reason = ?data.reason,
                    "Position rebalanced"
                );
            }
        }

        self.by_position
            .entry(event.position)
            .or_default()
            .push(self.events.len());
        self.events.push(event);
    }

    /// All events, oldest first.
    pub fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    /// Events of one position, oldest first.
    pub fn events_for(&self, position: &PositionKey) -> Vec<&LifecycleEvent> {
        self.by_position
            .get(position)
            .map(|indices| indices.iter().filter_map(|i| self.events.get(*i)).collect())
            .unwrap_or_default()
    }

    /// Gets the summary for a position.
    pub fn summary(&self, position: &PositionKey) -> Option<&PositionSummary> {
        self.summaries.get(position)
    }

    /// Gets all position summaries.
    pub fn summaries(&self) -> Vec<&PositionSummary> {
        self.summaries.values().collect()
    }

    /// Gets aggregate statistics.
    pub fn aggregate_stats(&self) -> AggregateStats {
        let mut stats = AggregateStats {
            total_events: self.events.len(),
            ..AggregateStats::default()
        };

        for summary in self.summaries.values() {
            stats.total_positions += 1;
            stats.total_compounds += summary.compound_count;
            stats.total_rebalances += summary.rebalance_count;
            stats.total_fees0 = stats.total_fees0.saturating_add(summary.total_fees0);
            stats.total_fees1 = stats.total_fees1.saturating_add(summary.total_fees1);
            stats.total_liquidity_compounded = stats
                .total_liquidity_compounded
                .saturating_add(summary.total_liquidity_compounded);
        }

        stats
    }
}

/// Aggregate statistics across all positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Total positions tracked.
    pub total_positions: u32,
    /// Total events recorded.
    pub total_events: usize,
    /// Total compoundings.
    pub total_compounds: u32,
    /// Total rebalances performed.
    pub total_rebalances: u32,
    /// Total asset 0 fees compounded.
    pub total_fees0: u128,
    /// Total asset 1 fees compounded.
    pub total_fees1: u128,
    /// Total liquidity added by compounding.
    pub total_liquidity_compounded: u128,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{CompoundData, PositionCreatedData, RebalanceData, RebalanceReason};

    fn created(position: PositionKey) -> LifecycleEvent {
        LifecycleEvent::new(
            position,
            VenueId([9u8; 32]),
            100,
            EventData::PositionCreated(PositionCreatedData {
                owner: Address::from_low_u64(1),
                tick_lower: -1200,
                tick_upper: 1200,
                liquidity: 1_000_000,
                amount0: 56_000,
                amount1: 56_000,
            }),
        )
    }

    #[test]
    fn test_lifecycle_tracker() {
        let mut tracker = LifecycleTracker::new();
        let position = PositionKey([1u8; 32]);

        tracker.record(created(position));
        tracker.record(LifecycleEvent::new(
            position,
            VenueId([9u8; 32]),
            4_000,
            EventData::Compounded(CompoundData {
                fee0: 300,
                fee1: 200,
                liquidity_added: 4_000,
                new_liquidity: 1_004_000,
            }),
        ));
        tracker.record(LifecycleEvent::new(
            position,
            VenueId([9u8; 32]),
            5_000,
            EventData::Rebalanced(RebalanceData {
                old_tick_lower: -1200,
                old_tick_upper: 1200,
                new_tick_lower: -120,
                new_tick_upper: 2280,
                old_liquidity: 1_004_000,
                new_liquidity: 600_000,
                reference_tick: 1100,
                spot_tick: 1100,
                used_time_weighted: false,
                released0: 4_000,
                released1: 100_000,
                leftover0: 0,
                leftover1: 30_000,
                reason: RebalanceReason::NearUpperEdge,
            }),
        ));

        assert_eq!(tracker.events().len(), 3);
        assert_eq!(tracker.events_for(&position).len(), 3);
        assert!(tracker.events_for(&PositionKey([2u8; 32])).is_empty());

        let summary = tracker.summary(&position).unwrap();
        assert_eq!(summary.compound_count, 1);
        assert_eq!(summary.rebalance_count, 1);
        assert_eq!((summary.tick_lower, summary.tick_upper), (-120, 2280));
        assert_eq!(summary.liquidity, 600_000);
        assert_eq!(summary.last_activity, 5_000);

        let stats = tracker.aggregate_stats();
        assert_eq!(stats.total_positions, 1);
        assert_eq!(stats.total_events, 3);
        assert_eq!(stats.total_fees0, 300);
        assert_eq!(stats.total_liquidity_compounded, 4_000);
    }
}
