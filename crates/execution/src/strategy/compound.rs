//! Conversion of accrued fees into liquidity.

use crate::error::ManagerError;
use crate::ledger::StateTransaction;
use crate::lifecycle::{CompoundData, EventData, LifecycleEvent};
use lp_autopilot_domain::entities::PositionKey;
use lp_autopilot_domain::error::MathError;
use lp_autopilot_domain::math::{liquidity_for_amounts, sqrt_price_at_tick};
use lp_autopilot_domain::value_objects::AmountPair;
use lp_autopilot_protocols::{LiquidityChange, Slot0};
use tracing::debug;

/// Result of compounding one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundOutcome {
    /// Fees taken from the position.
    pub fees: AmountPair,
    /// Liquidity they converted into; zero when they were dust.
    pub liquidity_added: u128,
    /// Position liquidity afterwards.
    pub new_liquidity: u128,
}

/// Folds a position's accrued fees back into its range.
///
/// The minimum-interval gate belongs to the caller.
#[derive(Debug, Clone, Default)]
pub struct Compounder;

impl Compounder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns `None` when the position has nothing to compound.
    pub fn compound(
        &self,
        tx: &mut StateTransaction<'_>,
        key: &PositionKey,
        slot0: &Slot0,
        now: u64,
    ) -> Result<Option<CompoundOutcome>, ManagerError> {
        let Some(position) = tx.position(key) else {
            return Ok(None);
        };
        if !position.has_accrued_fees() {
            return Ok(None);
        }

        let mut position = position.clone();
        let fees = position.take_accrued_fees();
        let mut totals = tx.totals(&position.venue).unwrap_or_default();
        totals.pending_fees = totals.pending_fees.saturating_sub(&fees);

        let liquidity_added = liquidity_for_amounts(
            slot0.sqrt_price_x96,
            sqrt_price_at_tick(position.range_lower)?,
            sqrt_price_at_tick(position.range_upper)?,
            fees.amount0,
            fees.amount1,
        )?;

        if liquidity_added > 0 {
            tx.enqueue(LiquidityChange::add(
                position.range_lower,
                position.range_upper,
                liquidity_added,
            )?);
            position.liquidity = position
                .liquidity
                .checked_add(liquidity_added)
                .ok_or(MathError::Overflow("position liquidity"))?;
            totals.aggregate_liquidity = totals
                .aggregate_liquidity
                .checked_add(liquidity_added)
                .ok_or(MathError::Overflow("aggregate liquidity"))?;
            position.last_compound_time = now;
        } else {
            debug!(position = %position.key, fees = %fees, "Fees below one unit of liquidity, dropped as dust");
        }

        let outcome = CompoundOutcome {
            fees,
            liquidity_added,
            new_liquidity: position.liquidity,
        };
        tx.record(LifecycleEvent::new(
            position.key,
            position.venue,
            now,
            EventData::Compounded(CompoundData {
                fee0: fees.amount0,
                fee1: fees.amount1,
                liquidity_added,
                new_liquidity: position.liquidity,
            }),
        ));
        tx.put_totals(position.venue, totals);
        tx.put_position(position);
        Ok(Some(outcome))
    }
}
