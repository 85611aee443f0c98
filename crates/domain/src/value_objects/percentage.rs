use crate::error::MathError;
use crate::math::full_math::{mul_div, to_u128};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

const BPS_DENOMINATOR: u32 = 10_000;

/// A fraction expressed in basis points (1 bps = 0.01%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BasisPoints(pub u32);

impl BasisPoints {
    pub fn new(bps: u32) -> Self {
        Self(bps)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn is_valid_fraction(&self) -> bool {
        self.0 <= BPS_DENOMINATOR
    }

    /// `floor(value * (1 - self))`, the floor left after tolerating this loss.
    pub fn floor_after_loss(&self, value: u128) -> Result<u128, MathError> {
        let kept = BPS_DENOMINATOR
            .checked_sub(self.0)
            .ok_or(MathError::Overflow("basis points above 100%"))?;
        let floor = mul_div(
            U256::from(value),
            U256::from(kept),
            U256::from(BPS_DENOMINATOR),
        )?;
        to_u128(floor, "floor_after_loss")
    }
}
