//! Position ledger and venue index.
//!
//! [`ManagerState`] is the committed state. Entry points never mutate it
//! directly: they stage writes on a [`StateTransaction`] and apply the
//! resulting [`Effects`] only once the venue has accepted the call's
//! liquidity batch.

mod transaction;

pub use transaction::{Effects, StateTransaction};

use crate::lifecycle::LifecycleTracker;
use lp_autopilot_domain::entities::{Position, PositionKey, VenueId, VenueState};
use std::collections::HashMap;

/// Committed ledger, venue index and audit trail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerState {
    positions: HashMap<PositionKey, Position>,
    venues: HashMap<VenueId, VenueState>,
    /// Key derived from a position's current range, mapped to its original key.
    aliases: HashMap<PositionKey, PositionKey>,
    tracker: LifecycleTracker,
}

impl ManagerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    pub fn venue(&self, id: &VenueId) -> Option<&VenueState> {
        self.venues.get(id)
    }

    /// Positions in venue registration order.
    pub fn positions_of(&self, id: &VenueId) -> Vec<&Position> {
        self.venues
            .get(id)
            .map(|venue| {
                venue
                    .position_keys
                    .iter()
                    .filter_map(|key| self.positions.get(key))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Maps a key derived from `(owner, venue, range)` to the position that
    /// currently sits on that range.
    ///
    /// A position created on the range wins over one moved onto it. A range
    /// a position has moved away from resolves to nothing.
    pub fn resolve(&self, derived: &PositionKey) -> Option<PositionKey> {
        [Some(*derived), self.aliases.get(derived).copied()]
            .into_iter()
            .flatten()
            .find(|key| occupies(self.positions.get(key), derived))
    }

    pub(crate) fn alias_target(&self, derived: &PositionKey) -> Option<PositionKey> {
        self.aliases.get(derived).copied()
    }

    pub fn tracker(&self) -> &LifecycleTracker {
        &self.tracker
    }

    /// Applies a committed transaction.
    pub fn apply(&mut self, effects: Effects) {
        for (id, key) in effects.new_venues {
            self.venues
                .entry(id)
                .or_insert_with(|| VenueState::new(key));
        }
        for (id, keys) in effects.appended {
            if let Some(venue) = self.venues.get_mut(&id) {
                venue.position_keys.extend(keys);
            }
        }
        for (id, totals) in effects.totals {
            if let Some(venue) = self.venues.get_mut(&id) {
                venue.totals = totals;
            }
        }
        self.positions.extend(effects.positions);
        self.aliases.extend(effects.aliases);
        for record in effects.records {
            self.tracker.record(record);
        }
    }
}

/// Whether `position` currently sits on the range `derived` was derived from.
fn occupies(position: Option<&Position>, derived: &PositionKey) -> bool {
    position.is_some_and(|position| position.current_range_key() == *derived)
}
