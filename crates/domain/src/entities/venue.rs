//! Venue identity and the per-venue position index.

use crate::entities::position::PositionKey;
use crate::value_objects::{Address, AmountPair};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::ops::Range;

/// Hundredths of a basis point; `1_000_000` pips is 100%.
pub const FEE_PIPS_DENOMINATOR: u32 = 1_000_000;

/// Everything that distinguishes one venue from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VenueKey {
    /// Asset 0; always sorts below `currency1`.
    pub currency0: Address,
    /// Asset 1.
    pub currency1: Address,
    /// Trading fee in pips (3000 = 0.30%).
    pub fee_pips: u32,
    /// Tick grid spacing.
    pub tick_spacing: i32,
}

impl VenueKey {
    pub fn new(currency0: Address, currency1: Address, fee_pips: u32, tick_spacing: i32) -> Self {
        Self {
            currency0,
            currency1,
            fee_pips,
            tick_spacing,
        }
    }

    /// Checks ordering, fee bounds and spacing.
    pub fn is_well_formed(&self) -> bool {
        self.currency0 < self.currency1
            && self.fee_pips < FEE_PIPS_DENOMINATOR
            && self.tick_spacing > 0
    }

    /// Stable 32-byte identifier of this venue.
    pub fn id(&self) -> VenueId {
        let mut hasher = Keccak256::new();
        hasher.update(self.currency0.as_bytes());
        hasher.update(self.currency1.as_bytes());
        hasher.update(self.fee_pips.to_be_bytes());
        hasher.update(self.tick_spacing.to_be_bytes());
        VenueId(hasher.finalize().into())
    }
}

/// Keccak-256 of a [`VenueKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VenueId(pub [u8; 32]);

impl VenueId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Mutable per-venue counters.
///
/// Kept apart from the key list so a call that only touches the counters
/// can stage them without copying the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueTotals {
    /// Sum of liquidity over every position registered to the venue.
    pub aggregate_liquidity: u128,
    /// Where the next distribution pass starts. Never exceeds the number of
    /// registered positions.
    pub cursor: usize,
    /// Fees credited to positions and not yet compounded.
    pub pending_fees: AmountPair,
}

impl VenueTotals {
    /// Index window `[cursor, min(cursor + batch_cap, registered))`.
    pub fn distribution_window(&self, registered: usize, batch_cap: usize) -> Range<usize> {
        let start = self.cursor.min(registered);
        let end = start.saturating_add(batch_cap).min(registered);
        start..end
    }

    /// Moves the cursor past a processed window, wrapping at the tail.
    pub fn advance_cursor(&mut self, end: usize, registered: usize) {
        self.cursor = if end < registered { end } else { 0 };
    }
}

/// Registry entry for one venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueState {
    pub key: VenueKey,
    /// Append-only, in creation order.
    pub position_keys: Vec<PositionKey>,
    pub totals: VenueTotals,
}

impl VenueState {
    pub fn new(key: VenueKey) -> Self {
        Self {
            key,
            position_keys: Vec::new(),
            totals: VenueTotals::default(),
        }
    }

    pub fn id(&self) -> VenueId {
        self.key.id()
    }
}
