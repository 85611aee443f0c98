//! Convenience re-exports of the commonly used domain types.

pub use crate::entities::{
    FEE_PIPS_DENOMINATOR, Position, PositionKey, VenueId, VenueKey, VenueState, VenueTotals,
};
pub use crate::error::MathError;
pub use crate::fees::{fee_from_input, fee_share, fee_share_pair};
pub use crate::math::{
    MAX_SQRT_PRICE, MAX_TICK, MIN_SQRT_PRICE, MIN_TICK, Q96, Rounding, align_down,
    amounts_for_liquidity, is_aligned, liquidity_for_amounts, max_usable_tick, min_usable_tick,
    sqrt_price_at_tick, tick_at_sqrt_price,
};
pub use crate::value_objects::{Address, AmountPair, BasisPoints};
