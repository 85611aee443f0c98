//! Round-robin fee distribution.
//!
//! Each trade's fee is split pro rata across a bounded window of the venue's
//! positions. The window starts at the venue cursor and the cursor moves past
//! it afterwards, wrapping at the tail, so with `M` positions and a cap of
//! `K` every position is visited once per `ceil(M / K)` trades.

use crate::error::ManagerError;
use crate::ledger::StateTransaction;
use lp_autopilot_domain::entities::VenueId;
use lp_autopilot_domain::error::MathError;
use lp_autopilot_domain::fees::{fee_from_input, fee_share_pair};
use lp_autopilot_domain::value_objects::AmountPair;
use lp_autopilot_protocols::{BalanceDelta, SwapParams};
use std::ops::Range;
use tracing::debug;

/// Fee owed to the manager for a trade: a cut of the input side only.
pub fn trade_fees(
    params: &SwapParams,
    delta: BalanceDelta,
    fee_pips: u32,
) -> Result<AmountPair, MathError> {
    let input = if params.zero_for_one {
        delta.amount0
    } else {
        delta.amount1
    };
    let paid = if input < 0 { input.unsigned_abs() } else { 0 };
    let fee = fee_from_input(paid, fee_pips)?;
    Ok(if params.zero_for_one {
        AmountPair::new(fee, 0)
    } else {
        AmountPair::new(0, fee)
    })
}

/// Result of one distribution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistributionOutcome {
    /// Index window of the venue's positions that was visited.
    pub window: Range<usize>,
    /// Positions that received a non-zero share.
    pub credited: usize,
    /// Sum of all shares. Never exceeds the fee.
    pub distributed: AmountPair,
}

/// Spreads trade fees over the venue's positions.
#[derive(Debug, Clone)]
pub struct FeeDistributor {
    batch_cap: usize,
}

impl FeeDistributor {
    /// Creates a distributor visiting at most `batch_cap` positions per pass.
    #[must_use]
    pub fn new(batch_cap: usize) -> Self {
        Self { batch_cap }
    }

    pub fn distribute(
        &self,
        tx: &mut StateTransaction<'_>,
        venue: VenueId,
        current_tick: i32,
        fees: AmountPair,
    ) -> Result<DistributionOutcome, ManagerError> {
        if fees.is_zero() {
            return Ok(DistributionOutcome::default());
        }
        let Some(mut totals) = tx.totals(&venue) else {
            return Ok(DistributionOutcome::default());
        };
        let registered = tx.registered_count(&venue);
        if totals.aggregate_liquidity == 0 || registered == 0 {
            return Ok(DistributionOutcome::default());
        }

        let window = totals.distribution_window(registered, self.batch_cap);
        let mut outcome = DistributionOutcome {
            window: window.clone(),
            ..DistributionOutcome::default()
        };

        for index in window.clone() {
            let Some(key) = tx.key_at(&venue, index) else {
                continue;
            };
            let Some(position) = tx.position(&key) else {
                continue;
            };
            if !position.is_active(current_tick) {
                continue;
            }
            let share = fee_share_pair(fees, position.liquidity, totals.aggregate_liquidity)?;
            if share.is_zero() {
                continue;
            }

            let mut position = position.clone();
            position.credit_fees(share)?;
            tx.put_position(position);

            totals.pending_fees = totals
                .pending_fees
                .checked_add(&share)
                .ok_or(MathError::Overflow("pending fees"))?;
            outcome.distributed = outcome
                .distributed
                .checked_add(&share)
                .ok_or(MathError::Overflow("distributed fees"))?;
            outcome.credited += 1;
        }

        totals.advance_cursor(window.end, registered);
        tx.put_totals(venue, totals);

        debug!(
            venue = %venue,
            window = format!("[{}, {})", window.start, window.end),
            credited = outcome.credited,
            distributed = %outcome.distributed,
            next_cursor = totals.cursor,
            "Fees distributed"
        );
        Ok(outcome)
    }
}
