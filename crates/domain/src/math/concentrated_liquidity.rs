use crate::error::MathError;
use crate::math::full_math::{
    Q96, RESOLUTION, Rounding, div_rounding_up, mul_div, mul_div_rounded, to_u128,
};
use crate::value_objects::amount::AmountPair;
use primitive_types::U256;

fn sorted(sqrt_price_a: U256, sqrt_price_b: U256) -> (U256, U256) {
    if sqrt_price_a < sqrt_price_b {
        (sqrt_price_a, sqrt_price_b)
    } else {
        (sqrt_price_b, sqrt_price_a)
    }
}

/// Calculates the amount of token0 (x) given liquidity and price range.
/// delta_x = L * (sqrt(P_b) - sqrt(P_a)) / (sqrt(P_a) * sqrt(P_b))
/// where P_a < P_b
pub fn get_amount0_delta(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: u128,
    rounding: Rounding,
) -> Result<U256, MathError> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    if lower.is_zero() {
        return Err(MathError::SqrtPriceOutOfBounds(lower.to_string()));
    }

    let numerator1 = U256::from(liquidity) << RESOLUTION;
    let numerator2 = upper - lower;

    match rounding {
        Rounding::Up => div_rounding_up(
            mul_div_rounded(numerator1, numerator2, upper, Rounding::Up)?,
            lower,
        ),
        Rounding::Down => Ok(mul_div(numerator1, numerator2, upper)? / lower),
    }
}

/// Calculates the amount of token1 (y) given liquidity and price range.
/// delta_y = L * (sqrt(P_b) - sqrt(P_a))
/// where P_a < P_b
pub fn get_amount1_delta(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    liquidity: u128,
    rounding: Rounding,
) -> Result<U256, MathError> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    mul_div_rounded(U256::from(liquidity), upper - lower, Q96, rounding)
}

/// Calculates liquidity for a given amount of token0 and price range
/// L = amount0 * (sqrt(P_a) * sqrt(P_b)) / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount0(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    amount0: u128,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    if upper == lower {
        return Err(MathError::DivisionByZero("liquidity_for_amount0"));
    }
    let intermediate = mul_div(lower, upper, Q96)?;
    let liquidity = mul_div(U256::from(amount0), intermediate, upper - lower)?;
    to_u128(liquidity, "liquidity_for_amount0")
}

/// Calculates liquidity for a given amount of token1 and price range
/// L = amount1 / (sqrt(P_b) - sqrt(P_a))
pub fn get_liquidity_for_amount1(
    sqrt_price_a: U256,
    sqrt_price_b: U256,
    amount1: u128,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    if upper == lower {
        return Err(MathError::DivisionByZero("liquidity_for_amount1"));
    }
    let liquidity = mul_div(U256::from(amount1), Q96, upper - lower)?;
    to_u128(liquidity, "liquidity_for_amount1")
}

/// Largest liquidity obtainable from `amount0`/`amount1` over `[lower, upper]`
/// at the current price, never requiring more of either asset than supplied.
///
/// Below the range only token0 counts, above it only token1, inside it the
/// scarcer side binds.
pub fn liquidity_for_amounts(
    sqrt_price_current: U256,
    sqrt_price_lower: U256,
    sqrt_price_upper: U256,
    amount0: u128,
    amount1: u128,
) -> Result<u128, MathError> {
    let (lower, upper) = sorted(sqrt_price_lower, sqrt_price_upper);

    if sqrt_price_current <= lower {
        get_liquidity_for_amount0(lower, upper, amount0)
    } else if sqrt_price_current < upper {
        let liquidity0 = get_liquidity_for_amount0(sqrt_price_current, upper, amount0)?;
        let liquidity1 = get_liquidity_for_amount1(lower, sqrt_price_current, amount1)?;
        Ok(liquidity0.min(liquidity1))
    } else {
        get_liquidity_for_amount1(lower, upper, amount1)
    }
}

/// Token amounts represented by `liquidity` over `[lower, upper]` at the
/// current price.
///
/// Use [`Rounding::Down`] for amounts released to the manager and
/// [`Rounding::Up`] for amounts a deposit costs.
pub fn amounts_for_liquidity(
    sqrt_price_current: U256,
    sqrt_price_lower: U256,
    sqrt_price_upper: U256,
    liquidity: u128,
    rounding: Rounding,
) -> Result<AmountPair, MathError> {
    let (lower, upper) = sorted(sqrt_price_lower, sqrt_price_upper);

    let (amount0, amount1) = if sqrt_price_current <= lower {
        (
            get_amount0_delta(lower, upper, liquidity, rounding)?,
            U256::zero(),
        )
    } else if sqrt_price_current < upper {
        (
            get_amount0_delta(sqrt_price_current, upper, liquidity, rounding)?,
            get_amount1_delta(lower, sqrt_price_current, liquidity, rounding)?,
        )
    } else {
        (
            U256::zero(),
            get_amount1_delta(lower, upper, liquidity, rounding)?,
        )
    };

    Ok(AmountPair::new(
        to_u128(amount0, "amounts_for_liquidity")?,
        to_u128(amount1, "amounts_for_liquidity")?,
    ))
}
