//! The orchestrator the venue calls back into.
//!
//! Every entry point runs under the reentrancy guard and inside one
//! [`StateTransaction`]. Engines stage their writes and queue liquidity
//! changes; the queued changes go to the venue as a single batch at the end
//! of the call, and the staged writes are applied only if that batch is
//! accepted. A failure anywhere leaves the committed state untouched.

use crate::config::ManagerConfig;
use crate::error::ManagerError;
use crate::guard::ReentrancyGuard;
use crate::ledger::{ManagerState, StateTransaction};
use crate::lifecycle::{
    AggregateStats, EventData, LifecycleEvent, PositionCreatedData, PositionSummary,
};
use crate::strategy::{Compounder, FeeDistributor, RebalanceConfig, Rebalancer, trade_fees};
use lp_autopilot_domain::entities::{Position, PositionKey, VenueKey, VenueState};
use lp_autopilot_domain::error::MathError;
use lp_autopilot_domain::math::{
    Rounding, amounts_for_liquidity, is_aligned, max_usable_tick, min_usable_tick,
    sqrt_price_at_tick,
};
use lp_autopilot_domain::value_objects::{Address, AmountPair};
use lp_autopilot_protocols::{
    BalanceDelta, HookAck, HookError, LiquidityChange, LiquidityVenue, SwapParams, VenueHooks,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, warn};

/// What the owner owes for a newly created position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPosition {
    /// Key of the new position.
    pub key: PositionKey,
    /// Asset 0 deposited on the owner's behalf.
    pub amount0: u128,
    /// Asset 1 deposited on the owner's behalf.
    pub amount1: u128,
}

/// Autonomous manager of concentrated-liquidity positions on one venue
/// implementation.
pub struct LiquidityManager<V: LiquidityVenue> {
    /// Identity the manager uses towards the venue.
    identity: Address,
    /// Venue adapter.
    venue: Arc<V>,
    /// Fixed operating parameters.
    config: ManagerConfig,
    /// Committed ledger and index.
    state: Mutex<ManagerState>,
    /// In-flight flag.
    guard: ReentrancyGuard,
    distributor: FeeDistributor,
    compounder: Compounder,
    rebalancer: Rebalancer,
}

impl<V: LiquidityVenue> LiquidityManager<V> {
    /// Creates a manager with an empty ledger.
    pub fn new(identity: Address, venue: Arc<V>, config: ManagerConfig) -> Result<Self, ManagerError> {
        config.validate()?;
        Ok(Self {
            identity,
            venue,
            distributor: FeeDistributor::new(config.distribution_batch_cap),
            compounder: Compounder::new(),
            rebalancer: Rebalancer::new(RebalanceConfig::from(&config)),
            config,
            state: Mutex::new(ManagerState::new()),
            guard: ReentrancyGuard::new(),
        })
    }

    pub fn identity(&self) -> Address {
        self.identity
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn venue(&self) -> &Arc<V> {
        &self.venue
    }

    /// Distributes the fee of a settled trade.
    pub fn on_trade_completed(
        &self,
        venue_key: &VenueKey,
        params: &SwapParams,
        delta: BalanceDelta,
    ) -> Result<HookAck, ManagerError> {
        let venue_id = venue_key.id();
        self.run(venue_key, |tx| {
            if tx.totals(&venue_id).is_none() {
                debug!(venue = %venue_id, "Trade on unmanaged venue");
                return Ok(HookAck::AfterSwap);
            }
            let fees = trade_fees(params, delta, venue_key.fee_pips)?;
            if fees.is_zero() {
                return Ok(HookAck::AfterSwap);
            }
            let slot0 = self.venue.slot0(venue_key)?;
            self.distributor.distribute(tx, venue_id, slot0.tick, fees)?;
            Ok(HookAck::AfterSwap)
        })
    }

    /// Compounds, then rebalances, the position matching `caller` and the
    /// modified range.
    pub fn on_position_modified(
        &self,
        venue_key: &VenueKey,
        caller: Address,
        change: &LiquidityChange,
        delta: BalanceDelta,
        fees_released: BalanceDelta,
    ) -> Result<HookAck, ManagerError> {
        let venue_id = venue_key.id();
        self.run(venue_key, |tx| {
            let derived =
                PositionKey::derive(caller, venue_id, change.tick_lower, change.tick_upper);
            let Some(key) = tx.resolve(&derived) else {
                debug!(
                    caller = %caller,
                    range = format!("[{}, {}]", change.tick_lower, change.tick_upper),
                    "No managed position for modification"
                );
                return Ok(HookAck::AfterModifyLiquidity);
            };
            debug!(
                position = %key,
                liquidity_delta = change.liquidity_delta,
                delta0 = delta.amount0,
                delta1 = delta.amount1,
                fees_released0 = fees_released.amount0,
                fees_released1 = fees_released.amount1,
                "Managed position modified"
            );

            let now = self.venue.timestamp();
            let slot0 = self.venue.slot0(venue_key)?;

            let due = tx
                .position(&key)
                .is_some_and(|p| p.compound_due(now, self.config.min_compound_interval_secs));
            if due {
                self.compounder.compound(tx, &key, &slot0, now)?;
            } else {
                debug!(position = %key, "Compounding interval not elapsed");
            }

            self.rebalancer
                .rebalance(tx, self.venue.as_ref(), venue_key, &key, &slot0, now)?;
            Ok(HookAck::AfterModifyLiquidity)
        })
    }

    /// Registers a new position and deposits its liquidity.
    ///
    /// Custody of the returned amounts is settled outside the manager.
    pub fn create_position(
        &self,
        owner: Address,
        venue_key: VenueKey,
        range_lower: i32,
        range_upper: i32,
        liquidity: u128,
    ) -> Result<CreatedPosition, ManagerError> {
        validate_creation(owner, &venue_key, range_lower, range_upper, liquidity)?;

        self.run(&venue_key, |tx| {
            let venue_id = venue_key.id();
            let key = PositionKey::derive(owner, venue_id, range_lower, range_upper);
            if tx.contains_position(&key) {
                return Err(ManagerError::DuplicatePosition(key));
            }

            let now = self.venue.timestamp();
            let slot0 = self.venue.slot0(&venue_key)?;
            let owed = amounts_for_liquidity(
                slot0.sqrt_price_x96,
                sqrt_price_at_tick(range_lower)?,
                sqrt_price_at_tick(range_upper)?,
                liquidity,
                Rounding::Up,
            )?;

            tx.register_venue(venue_key);
            let mut totals = tx.totals(&venue_id).unwrap_or_default();
            totals.aggregate_liquidity = totals
                .aggregate_liquidity
                .checked_add(liquidity)
                .ok_or(MathError::Overflow("aggregate liquidity"))?;
            tx.put_totals(venue_id, totals);

            tx.insert_position(Position::new(
                owner,
                venue_id,
                range_lower,
                range_upper,
                liquidity,
                now,
            ));
            tx.enqueue(LiquidityChange::add(range_lower, range_upper, liquidity)?);
            tx.record(LifecycleEvent::new(
                key,
                venue_id,
                now,
                EventData::PositionCreated(PositionCreatedData {
                    owner,
                    tick_lower: range_lower,
                    tick_upper: range_upper,
                    liquidity,
                    amount0: owed.amount0,
                    amount1: owed.amount1,
                }),
            ));

            Ok(CreatedPosition {
                key,
                amount0: owed.amount0,
                amount1: owed.amount1,
            })
        })
    }

    /// Runs `body` as one all-or-nothing call.
    fn run<T, F>(&self, venue_key: &VenueKey, body: F) -> Result<T, ManagerError>
    where
        F: FnOnce(&mut StateTransaction<'_>) -> Result<T, ManagerError>,
    {
        let _entered = self.guard.enter().inspect_err(|err| {
            warn!(venue = %venue_key.id(), error = %err, "Call rejected");
        })?;
        let mut state = self.lock()?;

        let mut tx = StateTransaction::new(&state);
        let value = body(&mut tx).inspect_err(|err| {
            warn!(venue = %venue_key.id(), error = %err, "Call aborted, no state changed");
        })?;
        let effects = tx.into_effects();

        if !effects.changes.is_empty() {
            let deltas = self
                .venue
                .modify_liquidity(self.identity, venue_key, &effects.changes)
                .inspect_err(|err| {
                    error!(
                        venue = %venue_key.id(),
                        changes = effects.changes.len(),
                        error = %err,
                        "Venue rejected liquidity batch"
                    );
                })?;
            log_settlement(venue_key, &effects.changes, &deltas, &effects.records);
        }
        state.apply(effects);
        Ok(value)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ManagerState>, ManagerError> {
        self.state.lock().map_err(|_| ManagerError::StatePoisoned)
    }

    pub fn position(&self, key: &PositionKey) -> Result<Option<Position>, ManagerError> {
        Ok(self.lock()?.position(key).cloned())
    }

    /// Looks a position up by its owner and the range it currently sits on.
    pub fn find_position(
        &self,
        owner: Address,
        venue_key: &VenueKey,
        range_lower: i32,
        range_upper: i32,
    ) -> Result<Option<Position>, ManagerError> {
        let derived = PositionKey::derive(owner, venue_key.id(), range_lower, range_upper);
        let state = self.lock()?;
        Ok(state
            .resolve(&derived)
            .and_then(|key| state.position(&key).cloned()))
    }

    pub fn venue_state(&self, venue_key: &VenueKey) -> Result<Option<VenueState>, ManagerError> {
        Ok(self.lock()?.venue(&venue_key.id()).cloned())
    }

    /// Positions of a venue in creation order.
    pub fn positions(&self, venue_key: &VenueKey) -> Result<Vec<Position>, ManagerError> {
        Ok(self
            .lock()?
            .positions_of(&venue_key.id())
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn events(&self) -> Result<Vec<LifecycleEvent>, ManagerError> {
        Ok(self.lock()?.tracker().events().to_vec())
    }

    pub fn events_for(&self, key: &PositionKey) -> Result<Vec<LifecycleEvent>, ManagerError> {
        Ok(self
            .lock()?
            .tracker()
            .events_for(key)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn summary(&self, key: &PositionKey) -> Result<Option<PositionSummary>, ManagerError> {
        Ok(self.lock()?.tracker().summary(key).cloned())
    }

    pub fn aggregate_stats(&self) -> Result<AggregateStats, ManagerError> {
        Ok(self.lock()?.tracker().aggregate_stats())
    }

    /// Copy of the committed state.
    pub fn snapshot(&self) -> Result<ManagerState, ManagerError> {
        Ok(self.lock()?.clone())
    }
}

/// Amounts the venue paid out for removing liquidity on `[lower, upper]`.
fn paid_out(
    changes: &[LiquidityChange],
    deltas: &[BalanceDelta],
    lower: i32,
    upper: i32,
) -> Option<AmountPair> {
    changes
        .iter()
        .zip(deltas)
        .find(|(change, _)| {
            change.tick_lower == lower && change.tick_upper == upper && change.liquidity_delta < 0
        })
        .map(|(_, delta)| AmountPair::new(delta.amount0.unsigned_abs(), delta.amount1.unsigned_abs()))
}

/// Puts what the venue settled next to what the engines quoted.
fn log_settlement(
    venue_key: &VenueKey,
    changes: &[LiquidityChange],
    deltas: &[BalanceDelta],
    records: &[LifecycleEvent],
) {
    for (change, delta) in changes.iter().zip(deltas) {
        debug!(
            venue = %venue_key.id(),
            lower = change.tick_lower,
            upper = change.tick_upper,
            liquidity_delta = change.liquidity_delta,
            amount0 = delta.amount0,
            amount1 = delta.amount1,
            "Liquidity change settled"
        );
    }
    for record in records {
        let EventData::Rebalanced(data) = &record.data else {
            continue;
        };
        let quoted = AmountPair::new(data.released0, data.released1);
        let Some(paid) = paid_out(changes, deltas, data.old_tick_lower, data.old_tick_upper) else {
            continue;
        };
        if paid == quoted {
            debug!(position = %record.position, quoted = %quoted, paid = %paid, "Release matches quote");
        } else {
            warn!(position = %record.position, quoted = %quoted, paid = %paid, "Release differs from quote");
        }
    }
}

fn validate_creation(
    owner: Address,
    venue_key: &VenueKey,
    lower: i32,
    upper: i32,
    liquidity: u128,
) -> Result<(), ManagerError> {
    if owner.is_zero() {
        return Err(ManagerError::InvalidOwner);
    }
    if !venue_key.is_well_formed() {
        return Err(ManagerError::InvalidVenue);
    }
    let spacing = venue_key.tick_spacing;
    let invalid = |reason| ManagerError::InvalidRange {
        lower,
        upper,
        reason,
    };
    if lower >= upper {
        return Err(invalid("lower bound must be below upper bound"));
    }
    if !is_aligned(lower, spacing) || !is_aligned(upper, spacing) {
        return Err(invalid("bounds must sit on the tick grid"));
    }
    if lower < min_usable_tick(spacing)? || upper > max_usable_tick(spacing)? {
        return Err(invalid("bounds outside the usable tick range"));
    }
    if liquidity == 0 {
        return Err(ManagerError::ZeroLiquidity);
    }
    Ok(())
}

impl<V: LiquidityVenue> VenueHooks for LiquidityManager<V> {
    fn after_swap(
        &self,
        venue: &VenueKey,
        params: &SwapParams,
        delta: BalanceDelta,
    ) -> Result<HookAck, HookError> {
        self.on_trade_completed(venue, params, delta)
            .map_err(HookError::new)
    }

    fn after_modify_liquidity(
        &self,
        venue: &VenueKey,
        caller: Address,
        change: &LiquidityChange,
        delta: BalanceDelta,
        fees_released: BalanceDelta,
    ) -> Result<HookAck, HookError> {
        self.on_position_modified(venue, caller, change, delta, fees_released)
            .map_err(HookError::new)
    }
}
