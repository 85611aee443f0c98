//! Manipulation-resistant range repositioning.

use crate::config::ManagerConfig;
use crate::error::ManagerError;
use crate::ledger::StateTransaction;
use crate::lifecycle::{EventData, LifecycleEvent, RebalanceData, RebalanceReason};
use lp_autopilot_domain::entities::{PositionKey, VenueKey};
use lp_autopilot_domain::error::MathError;
use lp_autopilot_domain::math::{
    Rounding, align_down, amounts_for_liquidity, liquidity_for_amounts, max_usable_tick,
    min_usable_tick, sqrt_price_at_tick,
};
use lp_autopilot_domain::value_objects::{AmountPair, BasisPoints};
use lp_autopilot_protocols::{LiquidityChange, LiquidityVenue, Slot0, VenueError};
use tracing::{debug, warn};

/// Configuration for rebalancing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebalanceConfig {
    /// Window of the time-weighted tick, in seconds.
    pub twap_window_secs: u32,
    /// Spot/time-weighted distance above which the time-weighted tick is used.
    pub max_tick_deviation: i32,
    /// Trigger distance from a range edge, in tick spacings.
    pub buffer_spacings: i32,
    /// Half width of the new range, in tick spacings.
    pub half_width_spacings: i32,
    /// Tolerated liquidity loss.
    pub slippage: BasisPoints,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self::from(&ManagerConfig::default())
    }
}

impl From<&ManagerConfig> for RebalanceConfig {
    fn from(config: &ManagerConfig) -> Self {
        Self {
            twap_window_secs: config.twap_window_secs,
            max_tick_deviation: config.max_tick_deviation,
            buffer_spacings: config.rebalance_buffer_spacings,
            half_width_spacings: config.rebalance_half_width_spacings,
            slippage: BasisPoints::new(config.slippage_tolerance_bps),
        }
    }
}

/// The tick a reposition is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceTick {
    /// Tick used for the decision.
    pub tick: i32,
    /// Spot tick.
    pub spot: i32,
    /// Time-weighted tick over the configured window.
    pub time_weighted: i32,
}

impl ReferenceTick {
    pub fn used_time_weighted(&self) -> bool {
        self.tick != self.spot
    }
}

/// Outcome of evaluating a position against a reference tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceDecision {
    /// Reference is comfortably inside the range.
    Hold,
    /// Move the position to `[new_lower, new_upper]`.
    Reposition {
        /// Which edge triggered.
        reason: RebalanceReason,
        /// New lower tick.
        new_lower: i32,
        /// New upper tick.
        new_upper: i32,
    },
}

/// Result of a completed reposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebalanceOutcome {
    /// Range before.
    pub old_range: (i32, i32),
    /// Range after.
    pub new_range: (i32, i32),
    /// Liquidity before.
    pub old_liquidity: u128,
    /// Liquidity after.
    pub new_liquidity: u128,
    /// Amounts withdrawn from the old range.
    pub released: AmountPair,
    /// Released amounts the new range did not absorb.
    pub leftover: AmountPair,
    /// Reference used.
    pub reference: ReferenceTick,
    /// Which edge triggered.
    pub reason: RebalanceReason,
}

/// Decides on and stages range repositions.
#[derive(Debug, Clone, Default)]
pub struct Rebalancer {
    config: RebalanceConfig,
}

impl Rebalancer {
    /// Creates a new rebalancer.
    #[must_use]
    pub fn new(config: RebalanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    /// Spot, unless it strays from the time-weighted tick by more than the
    /// tolerated deviation.
    ///
    /// Returns `None` when the venue's oracle cannot cover the window yet.
    pub fn reference_tick<V: LiquidityVenue + ?Sized>(
        &self,
        venue: &V,
        venue_key: &VenueKey,
        spot: i32,
    ) -> Result<Option<ReferenceTick>, ManagerError> {
        let time_weighted = match venue.time_weighted_tick(venue_key, self.config.twap_window_secs) {
            Ok(tick) => tick,
            Err(VenueError::InsufficientHistory { window_secs }) => {
                warn!(
                    venue = %venue_key.id(),
                    window_secs,
                    "Oracle history too short, skipping rebalance"
                );
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let deviation = spot.abs_diff(time_weighted);
        let tick = if deviation > self.config.max_tick_deviation.unsigned_abs() {
            debug!(spot, time_weighted, deviation, "Spot deviates, using time-weighted tick");
            time_weighted
        } else {
            spot
        };
        Ok(Some(ReferenceTick {
            tick,
            spot,
            time_weighted,
        }))
    }

    /// Whether `[lower, upper]` needs to move, and where to.
    ///
    /// Reaching the buffer exactly counts as needing to move.
    pub fn evaluate(
        &self,
        lower: i32,
        upper: i32,
        reference: i32,
        tick_spacing: i32,
    ) -> Result<RebalanceDecision, MathError> {
        let buffer = spacings_to_ticks(self.config.buffer_spacings, tick_spacing)?;
        let half_width = spacings_to_ticks(self.config.half_width_spacings, tick_spacing)?;

        let reason = if i64::from(reference) - i64::from(lower) <= i64::from(buffer) {
            RebalanceReason::NearLowerEdge
        } else if i64::from(upper) - i64::from(reference) <= i64::from(buffer) {
            RebalanceReason::NearUpperEdge
        } else {
            return Ok(RebalanceDecision::Hold);
        };

        let center = align_down(reference, tick_spacing)?;
        let new_lower = center
            .saturating_sub(half_width)
            .max(min_usable_tick(tick_spacing)?);
        let new_upper = center
            .saturating_add(half_width)
            .min(max_usable_tick(tick_spacing)?);

        if new_lower >= new_upper || (new_lower, new_upper) == (lower, upper) {
            return Ok(RebalanceDecision::Hold);
        }
        Ok(RebalanceDecision::Reposition {
            reason,
            new_lower,
            new_upper,
        })
    }

    /// Stages a withdraw-and-redeposit for the position if its range has
    /// drifted to an edge.
    ///
    /// Fails with [`ManagerError::SlippageExceeded`] instead of staging a
    /// reposition that loses more liquidity than tolerated.
    pub fn rebalance<V: LiquidityVenue + ?Sized>(
        &self,
        tx: &mut StateTransaction<'_>,
        venue: &V,
        venue_key: &VenueKey,
        key: &PositionKey,
        slot0: &Slot0,
        now: u64,
    ) -> Result<Option<RebalanceOutcome>, ManagerError> {
        let Some(position) = tx.position(key) else {
            return Ok(None);
        };
        if position.liquidity == 0 {
            debug!(position = %key, "Position holds no liquidity, nothing to reposition");
            return Ok(None);
        }
        let (old_lower, old_upper) = (position.range_lower, position.range_upper);

        let Some(reference) = self.reference_tick(venue, venue_key, slot0.tick)? else {
            return Ok(None);
        };
        let RebalanceDecision::Reposition {
            reason,
            new_lower,
            new_upper,
        } = self.evaluate(old_lower, old_upper, reference.tick, venue_key.tick_spacing)?
        else {
            debug!(position = %key, reference = reference.tick, "Range still centered");
            return Ok(None);
        };

        let mut position = position.clone();
        let old_liquidity = position.liquidity;
        let released = amounts_for_liquidity(
            slot0.sqrt_price_x96,
            sqrt_price_at_tick(old_lower)?,
            sqrt_price_at_tick(old_upper)?,
            old_liquidity,
            Rounding::Down,
        )?;

        let new_sqrt_lower = sqrt_price_at_tick(new_lower)?;
        let new_sqrt_upper = sqrt_price_at_tick(new_upper)?;
        let new_liquidity = liquidity_for_amounts(
            slot0.sqrt_price_x96,
            new_sqrt_lower,
            new_sqrt_upper,
            released.amount0,
            released.amount1,
        )?;

        let min_liquidity = self.config.slippage.floor_after_loss(old_liquidity)?;
        if new_liquidity == 0 || new_liquidity < min_liquidity {
            warn!(
                position = %key,
                new_range = format!("[{}, {}]", new_lower, new_upper),
                new_liquidity,
                min_liquidity,
                "Reposition would exceed slippage tolerance"
            );
            return Err(ManagerError::SlippageExceeded {
                new_liquidity,
                min_liquidity,
            });
        }

        let deposited = amounts_for_liquidity(
            slot0.sqrt_price_x96,
            new_sqrt_lower,
            new_sqrt_upper,
            new_liquidity,
            Rounding::Up,
        )?;
        let leftover = released.saturating_sub(&deposited);

        tx.enqueue(LiquidityChange::remove(old_lower, old_upper, old_liquidity)?);
        tx.enqueue(LiquidityChange::add(new_lower, new_upper, new_liquidity)?);

        let mut totals = tx.totals(&position.venue).unwrap_or_default();
        totals.aggregate_liquidity = totals
            .aggregate_liquidity
            .checked_sub(old_liquidity)
            .and_then(|rest| rest.checked_add(new_liquidity))
            .ok_or(MathError::Overflow("aggregate liquidity"))?;
        tx.put_totals(position.venue, totals);

        position.range_lower = new_lower;
        position.range_upper = new_upper;
        position.liquidity = new_liquidity;
        tx.alias(position.current_range_key(), position.key);

        tx.record(LifecycleEvent::new(
            position.key,
            position.venue,
            now,
            EventData::Rebalanced(RebalanceData {
                old_tick_lower: old_lower,
                old_tick_upper: old_upper,
                new_tick_lower: new_lower,
                new_tick_upper: new_upper,
                old_liquidity,
                new_liquidity,
                reference_tick: reference.tick,
                spot_tick: reference.spot,
                used_time_weighted: reference.used_time_weighted(),
                released0: released.amount0,
                released1: released.amount1,
                leftover0: leftover.amount0,
                leftover1: leftover.amount1,
                reason,
            }),
        ));
        tx.put_position(position);

        Ok(Some(RebalanceOutcome {
            old_range: (old_lower, old_upper),
            new_range: (new_lower, new_upper),
            old_liquidity,
            new_liquidity,
            released,
            leftover,
            reference,
            reason,
        }))
    }
}

fn spacings_to_ticks(spacings: i32, tick_spacing: i32) -> Result<i32, MathError> {
    spacings
        .checked_mul(tick_spacing)
        .ok_or(MathError::Overflow("spacings to ticks"))
}
