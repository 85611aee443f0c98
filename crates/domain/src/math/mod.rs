//! Fixed-point price math.
//!
//! Pure conversions between ticks, Q64.96 square-root prices, liquidity and
//! token amounts. Nothing here holds state.

pub mod concentrated_liquidity;
pub mod full_math;
pub mod price_tick;

pub use concentrated_liquidity::{amounts_for_liquidity, liquidity_for_amounts};
pub use full_math::{Q96, Rounding, mul_div, mul_div_rounding_up};
pub use price_tick::{
    MAX_SQRT_PRICE, MAX_TICK, MIN_SQRT_PRICE, MIN_TICK, align_down, is_aligned, max_usable_tick,
    min_usable_tick, price_to_tick, sqrt_price_at_tick, sqrt_price_to_price, tick_at_sqrt_price,
    tick_to_price,
};
