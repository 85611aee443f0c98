use crate::entities::venue::VenueId;
use crate::error::MathError;
use crate::value_objects::{Address, AmountPair};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Deterministic identifier of a managed position.
///
/// Keccak-256 over `owner ‖ venue ‖ lower ‖ upper`, ticks big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionKey(pub [u8; 32]);

impl PositionKey {
    pub fn derive(owner: Address, venue: VenueId, range_lower: i32, range_upper: i32) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(owner.as_bytes());
        hasher.update(venue.as_bytes());
        hasher.update(range_lower.to_be_bytes());
        hasher.update(range_upper.to_be_bytes());
        Self(hasher.finalize().into())
    }

    /// First eight hex digits, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// One managed concentrated-liquidity allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Fixed at creation; survives range changes.
    pub key: PositionKey,
    pub owner: Address,
    pub venue: VenueId,
    pub range_lower: i32,
    pub range_upper: i32,
    pub liquidity: u128,
    pub accrued_fee0: u128,
    pub accrued_fee1: u128,
    pub last_compound_time: u64,
    pub created_at: u64,
}

impl Position {
    pub fn new(
        owner: Address,
        venue: VenueId,
        range_lower: i32,
        range_upper: i32,
        liquidity: u128,
        now: u64,
    ) -> Self {
        Self {
            key: PositionKey::derive(owner, venue, range_lower, range_upper),
            owner,
            venue,
            range_lower,
            range_upper,
            liquidity,
            accrued_fee0: 0,
            accrued_fee1: 0,
            last_compound_time: now,
            created_at: now,
        }
    }

    /// Whether the venue's current tick lies inside `[range_lower, range_upper]`.
    pub fn is_active(&self, current_tick: i32) -> bool {
        current_tick >= self.range_lower && current_tick <= self.range_upper
    }

    pub fn accrued_fees(&self) -> AmountPair {
        AmountPair::new(self.accrued_fee0, self.accrued_fee1)
    }

    pub fn has_accrued_fees(&self) -> bool {
        self.accrued_fee0 != 0 || self.accrued_fee1 != 0
    }

    pub fn credit_fees(&mut self, share: AmountPair) -> Result<(), MathError> {
        self.accrued_fee0 = self
            .accrued_fee0
            .checked_add(share.amount0)
            .ok_or(MathError::Overflow("accrued_fee0"))?;
        self.accrued_fee1 = self
            .accrued_fee1
            .checked_add(share.amount1)
            .ok_or(MathError::Overflow("accrued_fee1"))?;
        Ok(())
    }

    /// Snapshots and zeroes the accrued fees.
    pub fn take_accrued_fees(&mut self) -> AmountPair {
        let taken = self.accrued_fees();
        self.accrued_fee0 = 0;
        self.accrued_fee1 = 0;
        taken
    }

    pub fn compound_due(&self, now: u64, min_interval_secs: u64) -> bool {
        now >= self.last_compound_time.saturating_add(min_interval_secs)
    }

    /// Key the same owner would derive for the position's current range.
    pub fn current_range_key(&self) -> PositionKey {
        PositionKey::derive(self.owner, self.venue, self.range_lower, self.range_upper)
    }
}
