//! In-memory concentrated-liquidity venue.
//!
//! Tracks prices, per-owner range liquidity and a tick oracle for any number
//! of venues behind one lock. Trades are simplified: a swap moves the price
//! straight to a requested tick and pays out at the post-trade price,
//! independent of depth. Good enough to drive the manager end to end.

use crate::hooks::VenueHooks;
use crate::venue::{BalanceDelta, LiquidityChange, LiquidityVenue, Slot0, SwapParams, VenueError};
use lp_autopilot_domain::entities::{VenueId, VenueKey};
use lp_autopilot_domain::error::MathError;
use lp_autopilot_domain::fees::fee_from_input;
use lp_autopilot_domain::math::full_math::to_u128;
use lp_autopilot_domain::math::{
    Q96, Rounding, amounts_for_liquidity, is_aligned, max_usable_tick, min_usable_tick, mul_div,
    sqrt_price_at_tick,
};
use lp_autopilot_domain::value_objects::Address;
use primitive_types::U256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, warn};

/// One oracle entry. `tick` is the tick in effect from `timestamp` onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub timestamp: u64,
    pub tick_cumulative: i64,
    pub tick: i32,
}

/// Owner and range of a liquidity holding.
type Slot = (Address, i32, i32);

#[derive(Debug, Clone)]
struct Pool {
    key: VenueKey,
    sqrt_price_x96: U256,
    tick: i32,
    liquidity: HashMap<Slot, u128>,
    observations: Vec<Observation>,
}

impl Pool {
    fn new(key: VenueKey, tick: i32, now: u64) -> Result<Self, MathError> {
        Ok(Self {
            key,
            sqrt_price_x96: sqrt_price_at_tick(tick)?,
            tick,
            liquidity: HashMap::new(),
            observations: vec![Observation {
                timestamp: now,
                tick_cumulative: 0,
                tick,
            }],
        })
    }

    fn slot0(&self) -> Slot0 {
        Slot0 {
            sqrt_price_x96: self.sqrt_price_x96,
            tick: self.tick,
        }
    }

    fn move_to(&mut self, tick: i32, now: u64) -> Result<(), MathError> {
        self.sqrt_price_x96 = sqrt_price_at_tick(tick)?;
        self.tick = tick;
        match self.observations.last_mut() {
            Some(last) if last.timestamp >= now => last.tick = tick,
            Some(last) => {
                let next = Observation {
                    timestamp: now,
                    tick_cumulative: accumulate(last, now),
                    tick,
                };
                self.observations.push(next);
            }
            None => self.observations.push(Observation {
                timestamp: now,
                tick_cumulative: 0,
                tick,
            }),
        }
        Ok(())
    }

    fn cumulative_at(&self, at: u64) -> Option<i64> {
        let idx = self.observations.partition_point(|o| o.timestamp <= at);
        let observation = self.observations.get(idx.checked_sub(1)?)?;
        Some(accumulate(observation, at))
    }

    fn time_weighted_tick(&self, now: u64, window_secs: u32) -> Result<i32, VenueError> {
        if window_secs == 0 {
            return Ok(self.tick);
        }
        let insufficient = VenueError::InsufficientHistory { window_secs };
        let Some(start) = now.checked_sub(u64::from(window_secs)) else {
            return Err(insufficient);
        };
        let (Some(end_cum), Some(start_cum)) = (self.cumulative_at(now), self.cumulative_at(start))
        else {
            return Err(insufficient);
        };
        // Floor toward negative infinity.
        let mean = (end_cum - start_cum).div_euclid(i64::from(window_secs));
        Ok(i32::try_from(mean).map_err(|_| MathError::Overflow("time weighted tick"))?)
    }

    fn validate_range(&self, lower: i32, upper: i32) -> Result<(), VenueError> {
        let spacing = self.key.tick_spacing;
        let valid = lower < upper
            && is_aligned(lower, spacing)
            && is_aligned(upper, spacing)
            && lower >= min_usable_tick(spacing)?
            && upper <= max_usable_tick(spacing)?;
        if valid {
            Ok(())
        } else {
            Err(VenueError::InvalidRange { lower, upper })
        }
    }

    fn apply(&mut self, caller: Address, change: &LiquidityChange) -> Result<BalanceDelta, VenueError> {
        let (lower, upper) = (change.tick_lower, change.tick_upper);
        self.validate_range(lower, upper)?;
        if change.liquidity_delta == 0 {
            return Ok(BalanceDelta::ZERO);
        }

        let sqrt_lower = sqrt_price_at_tick(lower)?;
        let sqrt_upper = sqrt_price_at_tick(upper)?;
        let slot = (caller, lower, upper);
        let held = self.liquidity.get(&slot).copied().unwrap_or(0);
        let magnitude = change.liquidity_delta.unsigned_abs();

        if change.liquidity_delta > 0 {
            let owed = amounts_for_liquidity(
                self.sqrt_price_x96,
                sqrt_lower,
                sqrt_upper,
                magnitude,
                Rounding::Up,
            )?;
            let total = held
                .checked_add(magnitude)
                .ok_or(MathError::Overflow("venue liquidity"))?;
            self.liquidity.insert(slot, total);
            Ok(BalanceDelta::new(
                -signed(owed.amount0)?,
                -signed(owed.amount1)?,
            ))
        } else {
            if magnitude > held {
                return Err(VenueError::LiquidityUnderflow { lower, upper });
            }
            let released = amounts_for_liquidity(
                self.sqrt_price_x96,
                sqrt_lower,
                sqrt_upper,
                magnitude,
                Rounding::Down,
            )?;
            let remaining = held - magnitude;
            if remaining == 0 {
                self.liquidity.remove(&slot);
            } else {
                self.liquidity.insert(slot, remaining);
            }
            Ok(BalanceDelta::new(
                signed(released.amount0)?,
                signed(released.amount1)?,
            ))
        }
    }
}

fn accumulate(observation: &Observation, at: u64) -> i64 {
    let elapsed = i64::try_from(at.saturating_sub(observation.timestamp)).unwrap_or(i64::MAX);
    observation
        .tick_cumulative
        .saturating_add(i64::from(observation.tick).saturating_mul(elapsed))
}

fn signed(amount: u128) -> Result<i128, MathError> {
    i128::try_from(amount).map_err(|_| MathError::Overflow("balance delta"))
}

struct Registration {
    identity: Address,
    hooks: Weak<dyn VenueHooks>,
}

struct Inner {
    now: u64,
    pools: HashMap<VenueId, Pool>,
    fail_next_modify: bool,
    registration: Option<Registration>,
}

impl Inner {
    fn pool(&self, id: VenueId) -> Result<&Pool, VenueError> {
        self.pools.get(&id).ok_or(VenueError::UnknownVenue(id))
    }

    fn pool_mut(&mut self, id: VenueId) -> Result<&mut Pool, VenueError> {
        self.pools.get_mut(&id).ok_or(VenueError::UnknownVenue(id))
    }

    /// Hooks to notify for an operation by `caller`; never the hook itself.
    fn hooks_for(&self, caller: Address) -> Option<Arc<dyn VenueHooks>> {
        let registration = self.registration.as_ref()?;
        if registration.identity == caller {
            return None;
        }
        registration.hooks.upgrade()
    }
}

/// Multi-venue in-memory venue with a settable clock.
pub struct SimulatedVenue {
    inner: Mutex<Inner>,
}

impl SimulatedVenue {
    /// Creates an empty venue whose clock starts at `start_time`.
    #[must_use]
    pub fn new(start_time: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                now: start_time,
                pools: HashMap::new(),
                fail_next_modify: false,
                registration: None,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, VenueError> {
        self.inner.lock().map_err(|_| VenueError::Unavailable)
    }

    /// Opens a venue at `tick`, seeding its oracle with one observation.
    pub fn initialize(&self, key: VenueKey, tick: i32) -> Result<Slot0, VenueError> {
        if !key.is_well_formed() {
            return Err(VenueError::InvalidVenueKey);
        }
        let id = key.id();
        let mut inner = self.lock()?;
        if inner.pools.contains_key(&id) {
            return Err(VenueError::AlreadyInitialized(id));
        }
        let pool = Pool::new(key, tick, inner.now)?;
        let slot0 = pool.slot0();
        inner.pools.insert(id, pool);
        debug!(venue = %id, tick, "Venue initialized");
        Ok(slot0)
    }

    /// Registers the callback target. Operations by `identity` itself are not reported.
    pub fn set_hooks(&self, identity: Address, hooks: Weak<dyn VenueHooks>) -> Result<(), VenueError> {
        self.lock()?.registration = Some(Registration { identity, hooks });
        Ok(())
    }

    /// Moves the clock forward to `timestamp`. The clock never moves backwards.
    pub fn set_time(&self, timestamp: u64) -> Result<u64, VenueError> {
        let mut inner = self.lock()?;
        inner.now = inner.now.max(timestamp);
        Ok(inner.now)
    }

    pub fn advance_time(&self, secs: u64) -> Result<u64, VenueError> {
        let mut inner = self.lock()?;
        inner.now = inner.now.saturating_add(secs);
        Ok(inner.now)
    }

    /// Makes the next `modify_liquidity` call fail without applying anything.
    pub fn fail_next_modify(&self) -> Result<(), VenueError> {
        self.lock()?.fail_next_modify = true;
        Ok(())
    }

    /// Liquidity `owner` holds on `[lower, upper]`.
    pub fn liquidity_of(
        &self,
        owner: Address,
        venue: &VenueKey,
        lower: i32,
        upper: i32,
    ) -> Result<u128, VenueError> {
        let inner = self.lock()?;
        let pool = inner.pool(venue.id())?;
        Ok(pool.liquidity.get(&(owner, lower, upper)).copied().unwrap_or(0))
    }

    pub fn observations(&self, venue: &VenueKey) -> Result<Vec<Observation>, VenueError> {
        let inner = self.lock()?;
        Ok(inner.pool(venue.id())?.observations.clone())
    }

    /// Moves the price without a trade and without notifying hooks.
    pub fn set_tick(&self, venue: &VenueKey, tick: i32) -> Result<Slot0, VenueError> {
        let mut inner = self.lock()?;
        let now = inner.now;
        let pool = inner.pool_mut(venue.id())?;
        pool.move_to(tick, now)?;
        Ok(pool.slot0())
    }

    /// Trades `params.amount_in` and moves the price to `target_tick`.
    ///
    /// The fee stays in the venue; the rest converts at the post-trade price.
    /// Returns the trader's delta.
    pub fn swap(
        &self,
        trader: Address,
        venue: &VenueKey,
        params: SwapParams,
        target_tick: i32,
    ) -> Result<BalanceDelta, VenueError> {
        let id = venue.id();
        let (delta, snapshot, hooks) = {
            let mut inner = self.lock()?;
            let now = inner.now;
            let hooks = inner.hooks_for(trader);
            let pool = inner.pool_mut(id)?;
            let moves_against = if params.zero_for_one {
                target_tick > pool.tick
            } else {
                target_tick < pool.tick
            };
            if moves_against {
                return Err(VenueError::InvalidSwap {
                    current: pool.tick,
                    target: target_tick,
                });
            }

            let snapshot = pool.clone();
            pool.move_to(target_tick, now)?;

            let fee = fee_from_input(params.amount_in, pool.key.fee_pips)?;
            let net = U256::from(params.amount_in - fee);
            let sqrt = pool.sqrt_price_x96;
            let amount_out = if params.zero_for_one {
                mul_div(mul_div(net, sqrt, Q96)?, sqrt, Q96)?
            } else {
                mul_div(mul_div(net, Q96, sqrt)?, Q96, sqrt)?
            };
            let amount_out = signed(to_u128(amount_out, "swap output")?)?;
            let amount_in = signed(params.amount_in)?;
            let delta = if params.zero_for_one {
                BalanceDelta::new(-amount_in, amount_out)
            } else {
                BalanceDelta::new(amount_out, -amount_in)
            };
            (delta, snapshot, hooks)
        };

        debug!(
            venue = %id,
            zero_for_one = params.zero_for_one,
            amount_in = params.amount_in,
            tick = target_tick,
            "Swap settled"
        );

        if let Some(hooks) = hooks {
            if let Err(err) = hooks.after_swap(venue, &params, delta) {
                warn!(venue = %id, error = %err, "Swap reverted by hook");
                self.restore_price(id, snapshot)?;
                return Err(err.into());
            }
        }
        Ok(delta)
    }

    // Hooks run with the lock released and may change the venue themselves.
    // Reverts therefore undo only what the reverted operation wrote: the
    // price and oracle for a swap, the caller's own slots for a liquidity
    // change. Whatever a hook committed in between stays.
    fn restore_price(&self, id: VenueId, snapshot: Pool) -> Result<(), VenueError> {
        let mut inner = self.lock()?;
        let pool = inner.pool_mut(id)?;
        pool.sqrt_price_x96 = snapshot.sqrt_price_x96;
        pool.tick = snapshot.tick;
        pool.observations = snapshot.observations;
        Ok(())
    }

    fn restore_slots(&self, id: VenueId, prior: &[(Slot, Option<u128>)]) -> Result<(), VenueError> {
        let mut inner = self.lock()?;
        let pool = inner.pool_mut(id)?;
        // Reverse order so the earliest recorded value of a slot wins.
        for (slot, held) in prior.iter().rev() {
            match held {
                Some(liquidity) => {
                    pool.liquidity.insert(*slot, *liquidity);
                }
                None => {
                    pool.liquidity.remove(slot);
                }
            }
        }
        Ok(())
    }
}

impl LiquidityVenue for SimulatedVenue {
    fn slot0(&self, venue: &VenueKey) -> Result<Slot0, VenueError> {
        Ok(self.lock()?.pool(venue.id())?.slot0())
    }

    fn time_weighted_tick(&self, venue: &VenueKey, window_secs: u32) -> Result<i32, VenueError> {
        let inner = self.lock()?;
        inner.pool(venue.id())?.time_weighted_tick(inner.now, window_secs)
    }

    fn modify_liquidity(
        &self,
        caller: Address,
        venue: &VenueKey,
        changes: &[LiquidityChange],
    ) -> Result<Vec<BalanceDelta>, VenueError> {
        let id = venue.id();
        let (deltas, prior, hooks) = {
            let mut inner = self.lock()?;
            if inner.fail_next_modify {
                inner.fail_next_modify = false;
                return Err(VenueError::Injected);
            }
            let hooks = inner.hooks_for(caller);
            // A hook that commits for change 1 could not be undone if change 2 were rejected.
            if hooks.is_some() && changes.len() > 1 {
                return Err(VenueError::HookedBatch {
                    changes: changes.len(),
                });
            }
            let pool = inner.pool_mut(id)?;
            let prior: Vec<(Slot, Option<u128>)> = changes
                .iter()
                .map(|change| {
                    let slot = (caller, change.tick_lower, change.tick_upper);
                    (slot, pool.liquidity.get(&slot).copied())
                })
                .collect();
            let snapshot = pool.clone();

            let mut deltas = Vec::with_capacity(changes.len());
            for change in changes {
                match pool.apply(caller, change) {
                    Ok(delta) => deltas.push(delta),
                    Err(err) => {
                        *pool = snapshot;
                        return Err(err);
                    }
                }
            }
            (deltas, prior, hooks)
        };

        debug!(venue = %id, caller = %caller, changes = changes.len(), "Liquidity modified");

        if let Some(hooks) = hooks {
            for (change, delta) in changes.iter().zip(&deltas) {
                if let Err(err) =
                    hooks.after_modify_liquidity(venue, caller, change, *delta, BalanceDelta::ZERO)
                {
                    warn!(venue = %id, caller = %caller, error = %err, "Liquidity change reverted by hook");
                    self.restore_slots(id, &prior)?;
                    return Err(err.into());
                }
            }
        }
        Ok(deltas)
    }

    fn timestamp(&self) -> u64 {
        match self.inner.lock() {
            Ok(inner) => inner.now,
            Err(poisoned) => poisoned.into_inner().now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{HookAck, HookError};

    fn key() -> VenueKey {
        VenueKey::new(Address::from_low_u64(1), Address::from_low_u64(2), 3000, 60)
    }

    fn venue_at(tick: i32) -> SimulatedVenue {
        let venue = SimulatedVenue::new(0);
        venue.initialize(key(), tick).unwrap();
        venue
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<&'static str>>,
        reject: bool,
    }

    impl VenueHooks for Recorder {
        fn after_swap(
            &self,
            _venue: &VenueKey,
            _params: &SwapParams,
            _delta: BalanceDelta,
        ) -> Result<HookAck, HookError> {
            self.calls.lock().unwrap().push("swap");
            if self.reject {
                return Err(HookError::new("rejected"));
            }
            Ok(HookAck::AfterSwap)
        }

        fn after_modify_liquidity(
            &self,
            _venue: &VenueKey,
            _caller: Address,
            _change: &LiquidityChange,
            _delta: BalanceDelta,
            _fees_released: BalanceDelta,
        ) -> Result<HookAck, HookError> {
            self.calls.lock().unwrap().push("modify");
            if self.reject {
                return Err(HookError::new("rejected"));
            }
            Ok(HookAck::AfterModifyLiquidity)
        }
    }

    #[test]
    fn test_initialize() {
        let venue = venue_at(0);
        let slot0 = venue.slot0(&key()).unwrap();
        assert_eq!(slot0.tick, 0);
        assert_eq!(slot0.sqrt_price_x96, Q96);
        assert!(matches!(
            venue.initialize(key(), 0),
            Err(VenueError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_add_and_remove_liquidity() {
        let venue = venue_at(0);
        let owner = Address::from_low_u64(9);
        let add = LiquidityChange::add(-1200, 1200, 1_000_000).unwrap();
        let deltas = venue.modify_liquidity(owner, &key(), &[add]).unwrap();
        assert!(deltas[0].amount0 < 0 && deltas[0].amount1 < 0);
        assert_eq!(venue.liquidity_of(owner, &key(), -1200, 1200).unwrap(), 1_000_000);

        let remove = LiquidityChange::remove(-1200, 1200, 1_000_000).unwrap();
        let deltas = venue.modify_liquidity(owner, &key(), &[remove]).unwrap();
        assert!(deltas[0].amount0 > 0 && deltas[0].amount1 > 0);
        assert_eq!(venue.liquidity_of(owner, &key(), -1200, 1200).unwrap(), 0);
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let venue = venue_at(0);
        let owner = Address::from_low_u64(9);
        let batch = [
            LiquidityChange::add(-60, 60, 100).unwrap(),
            LiquidityChange::remove(-60, 60, 200).unwrap(),
        ];
        assert!(matches!(
            venue.modify_liquidity(owner, &key(), &batch),
            Err(VenueError::LiquidityUnderflow { .. })
        ));
        assert_eq!(venue.liquidity_of(owner, &key(), -60, 60).unwrap(), 0);
    }

    #[test]
    fn test_rejects_off_grid_range() {
        let venue = venue_at(0);
        let change = LiquidityChange::add(-50, 60, 100).unwrap();
        assert!(matches!(
            venue.modify_liquidity(Address::from_low_u64(9), &key(), &[change]),
            Err(VenueError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_fail_next_modify_fires_once() {
        let venue = venue_at(0);
        let owner = Address::from_low_u64(9);
        let change = LiquidityChange::add(-60, 60, 100).unwrap();
        venue.fail_next_modify().unwrap();
        assert!(matches!(
            venue.modify_liquidity(owner, &key(), &[change]),
            Err(VenueError::Injected)
        ));
        assert!(venue.modify_liquidity(owner, &key(), &[change]).is_ok());
    }

    #[test]
    fn test_time_weighted_tick() {
        let venue = venue_at(0);
        venue.advance_time(1_000).unwrap();
        venue.set_tick(&key(), 100).unwrap();
        venue.advance_time(1_000).unwrap();

        assert_eq!(venue.time_weighted_tick(&key(), 2_000).unwrap(), 50);
        assert_eq!(venue.time_weighted_tick(&key(), 1_000).unwrap(), 100);
        assert_eq!(venue.time_weighted_tick(&key(), 0).unwrap(), 100);
        assert!(matches!(
            venue.time_weighted_tick(&key(), 3_000),
            Err(VenueError::InsufficientHistory { window_secs: 3_000 })
        ));
    }

    #[test]
    fn test_time_weighted_tick_rounds_toward_negative_infinity() {
        let venue = venue_at(0);
        venue.advance_time(1_000).unwrap();
        venue.set_tick(&key(), -1).unwrap();
        venue.advance_time(1_000).unwrap();
        assert_eq!(venue.time_weighted_tick(&key(), 2_000).unwrap(), -1);
    }

    #[test]
    fn test_swap_moves_price_and_charges_input() {
        let venue = venue_at(0);
        let trader = Address::from_low_u64(5);
        let params = SwapParams {
            zero_for_one: true,
            amount_in: 100_000,
        };
        let delta = venue.swap(trader, &key(), params, -60).unwrap();
        assert_eq!(delta.amount0, -100_000);
        assert!(delta.amount1 > 0 && delta.amount1 < 100_000);
        assert_eq!(venue.slot0(&key()).unwrap().tick, -60);

        assert!(matches!(
            venue.swap(trader, &key(), params, 60),
            Err(VenueError::InvalidSwap { .. })
        ));
    }

    #[test]
    fn test_hooks_are_notified_except_for_their_own_calls() {
        let venue = venue_at(0);
        let recorder = Arc::new(Recorder::default());
        let hooks: Arc<dyn VenueHooks> = recorder.clone();
        let manager = Address::from_low_u64(77);
        venue.set_hooks(manager, Arc::downgrade(&hooks)).unwrap();

        let change = LiquidityChange::add(-60, 60, 100).unwrap();
        venue.modify_liquidity(manager, &key(), &[change]).unwrap();
        assert!(recorder.calls.lock().unwrap().is_empty());

        venue
            .modify_liquidity(Address::from_low_u64(9), &key(), &[change])
            .unwrap();
        let params = SwapParams {
            zero_for_one: false,
            amount_in: 1_000,
        };
        venue.swap(Address::from_low_u64(5), &key(), params, 60).unwrap();
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["modify", "swap"]);
    }

    #[test]
    fn test_hook_error_reverts_operation() {
        let venue = venue_at(0);
        let recorder = Arc::new(Recorder {
            reject: true,
            ..Recorder::default()
        });
        let hooks: Arc<dyn VenueHooks> = recorder.clone();
        venue
            .set_hooks(Address::from_low_u64(77), Arc::downgrade(&hooks))
            .unwrap();

        let owner = Address::from_low_u64(9);
        let change = LiquidityChange::add(-60, 60, 100).unwrap();
        assert!(matches!(
            venue.modify_liquidity(owner, &key(), &[change]),
            Err(VenueError::HookRejected(_))
        ));
        assert_eq!(venue.liquidity_of(owner, &key(), -60, 60).unwrap(), 0);

        let params = SwapParams {
            zero_for_one: true,
            amount_in: 1_000,
        };
        assert!(venue.swap(Address::from_low_u64(5), &key(), params, -120).is_err());
        assert_eq!(venue.slot0(&key()).unwrap().tick, 0);
    }

    #[test]
    fn test_hooked_caller_cannot_batch() {
        let venue = venue_at(0);
        let recorder = Arc::new(Recorder::default());
        let hooks: Arc<dyn VenueHooks> = recorder.clone();
        let manager = Address::from_low_u64(77);
        venue.set_hooks(manager, Arc::downgrade(&hooks)).unwrap();

        let owner = Address::from_low_u64(9);
        let batch = [
            LiquidityChange::add(-60, 60, 100).unwrap(),
            LiquidityChange::add(-120, 120, 100).unwrap(),
        ];
        assert!(matches!(
            venue.modify_liquidity(owner, &key(), &batch),
            Err(VenueError::HookedBatch { changes: 2 })
        ));
        assert_eq!(venue.liquidity_of(owner, &key(), -60, 60).unwrap(), 0);
        assert!(recorder.calls.lock().unwrap().is_empty());

        // The hook's own identity is not reported, so it may batch.
        assert_eq!(venue.modify_liquidity(manager, &key(), &batch).unwrap().len(), 2);
        assert_eq!(venue.liquidity_of(manager, &key(), -120, 120).unwrap(), 100);
    }

    #[test]
    fn test_hook_rejection_keeps_other_holders() {
        let venue = venue_at(0);
        let recorder = Arc::new(Recorder {
            reject: true,
            ..Recorder::default()
        });
        let hooks: Arc<dyn VenueHooks> = recorder.clone();
        let manager = Address::from_low_u64(77);
        venue.set_hooks(manager, Arc::downgrade(&hooks)).unwrap();

        let add = LiquidityChange::add(-60, 60, 100).unwrap();
        venue.modify_liquidity(manager, &key(), &[add]).unwrap();
        let owner = Address::from_low_u64(9);
        venue.set_hooks(Address::from_low_u64(78), Arc::downgrade(&hooks)).unwrap();
        assert!(venue.modify_liquidity(manager, &key(), &[add]).is_err());
        assert!(venue.modify_liquidity(owner, &key(), &[add]).is_err());

        assert_eq!(venue.liquidity_of(manager, &key(), -60, 60).unwrap(), 100);
        assert_eq!(venue.liquidity_of(owner, &key(), -60, 60).unwrap(), 0);
    }
}
