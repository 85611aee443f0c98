//! 512-bit intermediate multiplication and division.

use crate::error::MathError;
use primitive_types::{U256, U512};

/// `2^96`, the scale of Q64.96 square-root prices.
pub const Q96: U256 = U256([0, 1 << 32, 0, 0]);

/// Number of fractional bits in a Q64.96 value.
pub const RESOLUTION: u32 = 96;

/// Rounding direction for conversions that lose precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Toward zero. Used for anything paid out.
    Down,
    /// Away from zero. Used for anything charged.
    Up,
}

/// Computes `floor(a * b / denominator)` without losing the high bits of `a * b`.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero("mul_div"));
    }
    let quotient = a.full_mul(b) / U512::from(denominator);
    U256::try_from(quotient).map_err(|_| MathError::Overflow("mul_div"))
}

/// Computes `ceil(a * b / denominator)`.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero("mul_div_rounding_up"));
    }
    let product = a.full_mul(b);
    let denominator = U512::from(denominator);
    let mut quotient = product / denominator;
    if !(product % denominator).is_zero() {
        quotient = quotient + U512::one();
    }
    U256::try_from(quotient).map_err(|_| MathError::Overflow("mul_div_rounding_up"))
}

/// Computes `ceil(a / b)`.
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256, MathError> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero("div_rounding_up"));
    }
    let quotient = a / b;
    if (a % b).is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::one())
    }
}

/// Dispatches to [`mul_div`] or [`mul_div_rounding_up`].
pub fn mul_div_rounded(
    a: U256,
    b: U256,
    denominator: U256,
    rounding: Rounding,
) -> Result<U256, MathError> {
    match rounding {
        Rounding::Down => mul_div(a, b, denominator),
        Rounding::Up => mul_div_rounding_up(a, b, denominator),
    }
}

/// Narrows to `u128`, failing instead of truncating.
pub fn to_u128(value: U256, context: &'static str) -> Result<u128, MathError> {
    if value > U256::from(u128::MAX) {
        return Err(MathError::Overflow(context));
    }
    Ok(value.low_u128())
}
