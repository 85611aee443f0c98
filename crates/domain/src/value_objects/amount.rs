use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantities of the two venue assets, in their smallest units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AmountPair {
    pub amount0: u128,
    pub amount1: u128,
}

impl AmountPair {
    pub const ZERO: Self = Self {
        amount0: 0,
        amount1: 0,
    };

    pub fn new(amount0: u128, amount1: u128) -> Self {
        Self { amount0, amount1 }
    }

    pub fn is_zero(&self) -> bool {
        self.amount0 == 0 && self.amount1 == 0
    }

    /// Component-wise `self - other`, floored at zero.
    pub fn saturating_sub(&self, other: &Self) -> Self {
        Self {
            amount0: self.amount0.saturating_sub(other.amount0),
            amount1: self.amount1.saturating_sub(other.amount1),
        }
    }

    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        Some(Self {
            amount0: self.amount0.checked_add(other.amount0)?,
            amount1: self.amount1.checked_add(other.amount1)?,
        })
    }
}

impl fmt::Display for AmountPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.amount0, self.amount1)
    }
}
