//! Tick <-> price conversions.
//!
//! The venue prices assets on a logarithmic grid: `price = 1.0001^tick`.
//! The core works with the Q64.96 square root of that price so that all
//! liquidity arithmetic stays in integers. The decimal helpers at the end of
//! this module exist for display and simulation only.

use crate::error::MathError;
use crate::math::full_math::Q96;
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Lowest tick whose sqrt price is representable in Q64.96.
pub const MIN_TICK: i32 = -887_272;
/// Highest tick whose sqrt price is representable in Q64.96.
pub const MAX_TICK: i32 = 887_272;

/// `sqrt_price_at_tick(MIN_TICK)`.
pub const MIN_SQRT_PRICE: U256 = U256([4_295_128_739, 0, 0, 0]);

/// `sqrt_price_at_tick(MAX_TICK)`.
pub const MAX_SQRT_PRICE: U256 = U256([
    0x5d95_1d52_6398_8d26,
    0xefd1_fc6a_5064_8849,
    0x0000_0000_fffd_8963,
    0,
]);

/// `1 / sqrt(1.0001)^(2^i)` in Q128, for `i` in `1..20`.
const TICK_FACTORS: [u128; 19] = [
    0xfff9_7272_373d_4132_59a4_6990_580e_213a,
    0xfff2_e50f_5f65_6932_ef12_357c_f3c7_fdcc,
    0xffe5_caca_7e10_e4e6_1c36_24ea_a094_1cd0,
    0xffcb_9843_d60f_6159_c9db_5883_5c92_6644,
    0xff97_3b41_fa98_c081_472e_6896_dfb2_54c0,
    0xff2e_a164_66c9_6a38_43ec_78b3_26b5_2861,
    0xfe5d_ee04_6a99_a2a8_11c4_61f1_969c_3053,
    0xfcbe_86c7_900a_88ae_dcff_c83b_479a_a3a4,
    0xf987_a725_3ac4_1317_6f2b_074c_f781_5e54,
    0xf339_2b08_22b7_0005_940c_7a39_8e4b_70f3,
    0xe715_9475_a2c2_9b74_43b2_9c7f_a6e8_89d9,
    0xd097_f3bd_fd20_22b8_845a_d8f7_92aa_5825,
    0xa9f7_4646_2d87_0fdf_8a65_dc1f_90e0_61e5,
    0x70d8_69a1_56d2_a1b8_90bb_3df6_2baf_32f7,
    0x31be_135f_97d0_8fd9_8123_1505_542f_cfa6,
    0x09aa_508b_5b7a_84e1_c677_de54_f3e9_9bc9,
    0x005d_6af8_dedb_8119_6699_c329_225e_e604,
    0x0000_2216_e584_f5fa_1ea9_2604_1bed_fe98,
    0x0000_0000_048a_1703_91f7_dc42_444e_8fa2,
];

/// Factor for bit 0 of `|tick|`.
const TICK_FACTOR_BIT0: u128 = 0xfffc_b933_bd6f_ad37_aa2d_162d_1a59_4001;

/// Returns `sqrt(1.0001^tick) * 2^96`, rounded up.
///
/// Strictly increasing in `tick` over `[MIN_TICK, MAX_TICK]`.
pub fn sqrt_price_at_tick(tick: i32) -> Result<U256, MathError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(MathError::TickOutOfBounds(tick));
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 1 != 0 {
        U256::from(TICK_FACTOR_BIT0)
    } else {
        U256::one() << 128
    };
    for (bit, factor) in TICK_FACTORS.iter().enumerate() {
        if abs_tick & (1u32 << (bit + 1)) != 0 {
            ratio = (ratio * U256::from(*factor)) >> 128;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128 -> Q96, rounding up so the result never undershoots the true price.
    let shifted = ratio >> 32;
    if (ratio & U256::from(u32::MAX)).is_zero() {
        Ok(shifted)
    } else {
        Ok(shifted + U256::one())
    }
}

/// Returns the greatest tick whose sqrt price is `<= sqrt_price`.
pub fn tick_at_sqrt_price(sqrt_price: U256) -> Result<i32, MathError> {
    if sqrt_price < MIN_SQRT_PRICE || sqrt_price >= MAX_SQRT_PRICE {
        return Err(MathError::SqrtPriceOutOfBounds(sqrt_price.to_string()));
    }

    let mut low = i64::from(MIN_TICK);
    let mut high = i64::from(MAX_TICK);
    while low < high {
        let mid = low + (high - low + 1) / 2;
        // mid is always inside [MIN_TICK, MAX_TICK]
        if sqrt_price_at_tick(mid as i32)? <= sqrt_price {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    Ok(low as i32)
}

/// Whether `tick` sits on the grid defined by `tick_spacing`.
pub fn is_aligned(tick: i32, tick_spacing: i32) -> bool {
    tick_spacing > 0 && tick.rem_euclid(tick_spacing) == 0
}

/// Rounds `tick` toward negative infinity onto the grid.
pub fn align_down(tick: i32, tick_spacing: i32) -> Result<i32, MathError> {
    if tick_spacing <= 0 {
        return Err(MathError::InvalidTickSpacing(tick_spacing));
    }
    Ok(tick - tick.rem_euclid(tick_spacing))
}

/// Lowest tick on the grid that is still inside `[MIN_TICK, MAX_TICK]`.
pub fn min_usable_tick(tick_spacing: i32) -> Result<i32, MathError> {
    if tick_spacing <= 0 {
        return Err(MathError::InvalidTickSpacing(tick_spacing));
    }
    Ok((MIN_TICK / tick_spacing) * tick_spacing)
}

/// Highest tick on the grid that is still inside `[MIN_TICK, MAX_TICK]`.
pub fn max_usable_tick(tick_spacing: i32) -> Result<i32, MathError> {
    if tick_spacing <= 0 {
        return Err(MathError::InvalidTickSpacing(tick_spacing));
    }
    Ok((MAX_TICK / tick_spacing) * tick_spacing)
}

/// Converts a Q64.96 sqrt price into a decimal price. Display only.
pub fn sqrt_price_to_price(sqrt_price: U256) -> Result<Decimal, MathError> {
    let sqrt = u256_to_f64(sqrt_price) / u256_to_f64(Q96);
    Decimal::from_f64(sqrt * sqrt).ok_or(MathError::InvalidPrice("price out of decimal range"))
}

fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64)
}

/// Returns the price corresponding to a given tick.
/// P = 1.0001 ^ tick
pub fn tick_to_price(tick: i32) -> Result<Decimal, MathError> {
    let base = 1.0001f64;
    let price_f64 = base.powi(tick);
    Decimal::from_f64(price_f64).ok_or(MathError::InvalidPrice("overflow converting price"))
}

/// Returns the tick corresponding to a given price.
/// tick = log_1.0001(P)
pub fn price_to_tick(price: Decimal) -> Result<i32, MathError> {
    if price <= Decimal::ZERO {
        return Err(MathError::InvalidPrice("price must be positive"));
    }
    let price_f64 = price
        .to_f64()
        .ok_or(MathError::InvalidPrice("overflow converting price"))?;
    let tick = price_f64.ln() / 1.0001f64.ln();
    let tick = tick.round();
    if tick < f64::from(MIN_TICK) || tick > f64::from(MAX_TICK) {
        return Err(MathError::InvalidPrice("price outside the tick range"));
    }
    Ok(tick as i32)
}
