//! Trading-fee arithmetic.
//!
//! A fee is charged on the input side of a swap and split across the venue's
//! registered positions in proportion to their liquidity. Every division
//! rounds down, so the sum of the shares never exceeds the fee.

use crate::entities::venue::FEE_PIPS_DENOMINATOR;
use crate::error::MathError;
use crate::math::full_math::{mul_div, to_u128};
use crate::value_objects::AmountPair;
use primitive_types::U256;

/// `floor(amount_in * fee_pips / 1e6)`.
pub fn fee_from_input(amount_in: u128, fee_pips: u32) -> Result<u128, MathError> {
    let fee = mul_div(
        U256::from(amount_in),
        U256::from(fee_pips),
        U256::from(FEE_PIPS_DENOMINATOR),
    )?;
    to_u128(fee, "fee_from_input")
}

/// `floor(fee * liquidity / aggregate)`.
///
/// Returns zero when the venue has no aggregate liquidity.
pub fn fee_share(fee: u128, liquidity: u128, aggregate: u128) -> Result<u128, MathError> {
    if aggregate == 0 {
        return Ok(0);
    }
    let share = mul_div(U256::from(fee), U256::from(liquidity), U256::from(aggregate))?;
    to_u128(share, "fee_share")
}

/// Applies [`fee_share`] to both assets.
pub fn fee_share_pair(
    fees: AmountPair,
    liquidity: u128,
    aggregate: u128,
) -> Result<AmountPair, MathError> {
    Ok(AmountPair::new(
        fee_share(fees.amount0, liquidity, aggregate)?,
        fee_share(fees.amount1, liquidity, aggregate)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fee_from_input() {
        assert_eq!(fee_from_input(1_000_000, 3000).unwrap(), 3000);
        assert_eq!(fee_from_input(333, 3000).unwrap(), 0);
        assert_eq!(fee_from_input(1_000, 0).unwrap(), 0);
    }

    #[test]
    fn test_fee_share_proportional() {
        assert_eq!(fee_share(3000, 1_000_000, 1_000_000).unwrap(), 3000);
        assert_eq!(fee_share(3000, 250_000, 1_000_000).unwrap(), 750);
        assert_eq!(fee_share(10, 1, 3).unwrap(), 3);
        assert_eq!(fee_share(10, 5, 0).unwrap(), 0);
    }

    #[test]
    fn test_fee_share_survives_wide_products() {
        let share = fee_share(u128::MAX, u128::MAX, u128::MAX).unwrap();
        assert_eq!(share, u128::MAX);
    }

    proptest! {
        #[test]
        fn prop_shares_never_exceed_fee(
            fee in 0u128..u128::MAX / 2,
            liquidities in proptest::collection::vec(1u128..1_000_000_000_000, 1..20),
        ) {
            let aggregate: u128 = liquidities.iter().sum();
            let mut distributed = 0u128;
            for l in &liquidities {
                distributed += fee_share(fee, *l, aggregate).unwrap();
            }
            prop_assert!(distributed <= fee);
        }
    }
}
