//! Copy-on-write overlay over the committed state.

use super::{ManagerState, occupies};
use crate::lifecycle::LifecycleEvent;
use lp_autopilot_domain::entities::{Position, PositionKey, VenueId, VenueKey, VenueTotals};
use lp_autopilot_protocols::LiquidityChange;
use std::collections::HashMap;

/// Staged writes of one entry-point call.
///
/// Reads fall through to the committed state. Dropping the transaction
/// discards everything it staged.
#[derive(Debug)]
pub struct StateTransaction<'a> {
    base: &'a ManagerState,
    positions: HashMap<PositionKey, Position>,
    totals: HashMap<VenueId, VenueTotals>,
    new_venues: Vec<(VenueId, VenueKey)>,
    appended: HashMap<VenueId, Vec<PositionKey>>,
    aliases: HashMap<PositionKey, PositionKey>,
    records: Vec<LifecycleEvent>,
    changes: Vec<LiquidityChange>,
}

/// Everything a transaction staged, detached from the committed state.
#[derive(Debug, Default)]
pub struct Effects {
    pub positions: HashMap<PositionKey, Position>,
    pub totals: HashMap<VenueId, VenueTotals>,
    pub new_venues: Vec<(VenueId, VenueKey)>,
    pub appended: HashMap<VenueId, Vec<PositionKey>>,
    pub aliases: HashMap<PositionKey, PositionKey>,
    pub records: Vec<LifecycleEvent>,
    /// Liquidity batch to submit to the venue before applying the rest.
    pub changes: Vec<LiquidityChange>,
}

impl<'a> StateTransaction<'a> {
    pub fn new(base: &'a ManagerState) -> Self {
        Self {
            base,
            positions: HashMap::new(),
            totals: HashMap::new(),
            new_venues: Vec::new(),
            appended: HashMap::new(),
            aliases: HashMap::new(),
            records: Vec::new(),
            changes: Vec::new(),
        }
    }

    pub fn position(&self, key: &PositionKey) -> Option<&Position> {
        self.positions
            .get(key)
            .or_else(|| self.base.position(key))
    }

    pub fn contains_position(&self, key: &PositionKey) -> bool {
        self.position(key).is_some()
    }

    /// Overwrites a position that is already registered.
    pub fn put_position(&mut self, position: Position) {
        self.positions.insert(position.key, position);
    }

    pub fn is_registered_venue(&self, id: &VenueId) -> bool {
        self.base.venue(id).is_some() || self.new_venues.iter().any(|(new, _)| new == id)
    }

    /// Registers the venue unless it is known already.
    pub fn register_venue(&mut self, key: VenueKey) -> VenueId {
        let id = key.id();
        if !self.is_registered_venue(&id) {
            self.new_venues.push((id, key));
        }
        id
    }

    pub fn totals(&self, id: &VenueId) -> Option<VenueTotals> {
        if let Some(totals) = self.totals.get(id) {
            return Some(*totals);
        }
        match self.base.venue(id) {
            Some(venue) => Some(venue.totals),
            None if self.is_registered_venue(id) => Some(VenueTotals::default()),
            None => None,
        }
    }

    pub fn put_totals(&mut self, id: VenueId, totals: VenueTotals) {
        self.totals.insert(id, totals);
    }

    /// Number of positions registered to the venue, staged appends included.
    pub fn registered_count(&self, id: &VenueId) -> usize {
        let committed = self
            .base
            .venue(id)
            .map_or(0, |venue| venue.position_keys.len());
        committed + self.appended.get(id).map_or(0, Vec::len)
    }

    /// Key at `index` in the venue's registration order.
    pub fn key_at(&self, id: &VenueId, index: usize) -> Option<PositionKey> {
        let committed = self
            .base
            .venue(id)
            .map_or(&[][..], |venue| venue.position_keys.as_slice());
        match committed.get(index) {
            Some(key) => Some(*key),
            None => self
                .appended
                .get(id)
                .and_then(|keys| keys.get(index - committed.len()))
                .copied(),
        }
    }

    /// Stores a new position and appends its key to the venue index.
    pub fn insert_position(&mut self, position: Position) {
        self.appended
            .entry(position.venue)
            .or_default()
            .push(position.key);
        self.positions.insert(position.key, position);
    }

    /// See [`ManagerState::resolve`].
    pub fn resolve(&self, derived: &PositionKey) -> Option<PositionKey> {
        let alias = self
            .aliases
            .get(derived)
            .copied()
            .or_else(|| self.base.alias_target(derived));
        [Some(*derived), alias]
            .into_iter()
            .flatten()
            .find(|key| occupies(self.position(key), derived))
    }

    /// Points `derived` at `original`, unless the position created on that
    /// range still sits there.
    pub fn alias(&mut self, derived: PositionKey, original: PositionKey) {
        if derived != original && !occupies(self.position(&derived), &derived) {
            self.aliases.insert(derived, original);
        }
    }

    pub fn record(&mut self, event: LifecycleEvent) {
        self.records.push(event);
    }

    pub fn enqueue(&mut self, change: LiquidityChange) {
        self.changes.push(change);
    }

    pub fn changes(&self) -> &[LiquidityChange] {
        &self.changes
    }

    pub fn records(&self) -> &[LifecycleEvent] {
        &self.records
    }

    pub fn into_effects(self) -> Effects {
        Effects {
            positions: self.positions,
            totals: self.totals,
            new_venues: self.new_venues,
            appended: self.appended,
            aliases: self.aliases,
            records: self.records,
            changes: self.changes,
        }
    }
}
