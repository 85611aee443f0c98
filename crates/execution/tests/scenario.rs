//! End-to-end scenarios: a manager wired to an in-memory venue.

use lp_autopilot_domain::entities::VenueKey;
use lp_autopilot_domain::math::{Q96, liquidity_for_amounts, sqrt_price_at_tick};
use lp_autopilot_domain::value_objects::{Address, AmountPair};
use lp_autopilot_execution::prelude::*;
use lp_autopilot_protocols::prelude::*;
use std::sync::Arc;

const START: u64 = 1_700_000_000;
const HOUR: u64 = 3_600;

fn manager_id() -> Address {
    Address::from_low_u64(0xA11CE)
}

fn owner() -> Address {
    Address::from_low_u64(0xB0B)
}

fn trader() -> Address {
    Address::from_low_u64(0x7EAD)
}

fn venue_key() -> VenueKey {
    VenueKey::new(Address::from_low_u64(1), Address::from_low_u64(2), 3000, 60)
}

struct Harness {
    venue: Arc<SimulatedVenue>,
    manager: Arc<LiquidityManager<SimulatedVenue>>,
    key: VenueKey,
}

impl Harness {
    fn new(config: ManagerConfig) -> Self {
        Self::with_hook_identity(config, manager_id())
    }

    /// Registers the manager as hook under `hook_identity`; the venue skips
    /// callbacks only for operations by that identity.
    fn with_hook_identity(config: ManagerConfig, hook_identity: Address) -> Self {
        let venue = Arc::new(SimulatedVenue::new(START));
        venue.initialize(venue_key(), 0).unwrap();
        let manager =
            Arc::new(LiquidityManager::new(manager_id(), venue.clone(), config).unwrap());
        let hooks: Arc<dyn VenueHooks> = manager.clone();
        venue.set_hooks(hook_identity, Arc::downgrade(&hooks)).unwrap();
        Self {
            venue,
            manager,
            key: venue_key(),
        }
    }

    fn trade(&self, zero_for_one: bool, amount_in: u128, target_tick: i32) -> BalanceDelta {
        self.venue
            .swap(
                trader(),
                &self.key,
                SwapParams {
                    zero_for_one,
                    amount_in,
                },
                target_tick,
            )
            .unwrap()
    }

    fn poke(&self, owner: Address, lower: i32, upper: i32) -> Result<Vec<BalanceDelta>, VenueError> {
        self.venue
            .modify_liquidity(owner, &self.key, &[LiquidityChange::poke(lower, upper)])
    }
}

fn tolerant() -> ManagerConfig {
    ManagerConfig {
        slippage_tolerance_bps: 9_900,
        ..ManagerConfig::default()
    }
}

/// Moves spot to `tick` and lets it settle for a full oracle window.
fn settle_at(h: &Harness, tick: i32) {
    h.venue.set_tick(&h.key, tick).unwrap();
    h.venue
        .advance_time(u64::from(h.manager.config().twap_window_secs))
        .unwrap();
}

#[test]
fn test_end_to_end_distribution_then_compounding() {
    let h = Harness::new(ManagerConfig::default());
    let created = h
        .manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap();
    assert!(created.amount0 > 0 && created.amount1 > 0);

    h.trade(true, 100_000, 0);
    let position = h.manager.position(&created.key).unwrap().unwrap();
    assert_eq!(position.accrued_fee0, 300);
    assert_eq!(position.accrued_fee1, 0);
    let venue = h.manager.venue_state(&h.key).unwrap().unwrap();
    assert_eq!(venue.totals.aggregate_liquidity, 1_000_000);

    h.venue.advance_time(HOUR).unwrap();
    h.poke(owner(), -1200, 1200).unwrap();

    // One-sided fees inside the range are dust: they clear without adding liquidity.
    let converted = liquidity_for_amounts(
        Q96,
        sqrt_price_at_tick(-1200).unwrap(),
        sqrt_price_at_tick(1200).unwrap(),
        300,
        0,
    )
    .unwrap();
    assert_eq!(converted, 0);
    let position = h.manager.position(&created.key).unwrap().unwrap();
    assert_eq!(position.accrued_fee0, 0);
    assert_eq!(position.liquidity, 1_000_000);

    let events = h.manager.events_for(&created.key).unwrap();
    let types: Vec<_> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(
        types,
        vec![
            LifecycleEventType::PositionCreated,
            LifecycleEventType::Compounded
        ]
    );
    match &events[1].data {
        EventData::Compounded(data) => {
            assert_eq!((data.fee0, data.fee1), (300, 0));
            assert_eq!(data.liquidity_added, 0);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_two_sided_fees_compound_into_liquidity() {
    let h = Harness::new(ManagerConfig::default());
    let created = h
        .manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap();

    h.trade(true, 1_000_000, 0);
    h.trade(false, 1_000_000, 0);
    let position = h.manager.position(&created.key).unwrap().unwrap();
    assert_eq!(position.accrued_fees(), AmountPair::new(3_000, 3_000));

    let now = h.venue.advance_time(HOUR).unwrap();
    h.poke(owner(), -1200, 1200).unwrap();

    let position = h.manager.position(&created.key).unwrap().unwrap();
    assert!(position.liquidity > 1_000_000);
    assert_eq!(position.accrued_fees(), AmountPair::ZERO);
    assert_eq!(position.last_compound_time, now);
    assert_eq!(
        h.venue
            .liquidity_of(manager_id(), &h.key, -1200, 1200)
            .unwrap(),
        position.liquidity
    );

    let venue = h.manager.venue_state(&h.key).unwrap().unwrap();
    assert_eq!(venue.totals.aggregate_liquidity, position.liquidity);
    assert_eq!(venue.totals.pending_fees, AmountPair::ZERO);

    let summary = h.manager.summary(&created.key).unwrap().unwrap();
    assert_eq!(summary.compound_count, 1);
    assert_eq!(summary.total_fees0, 3_000);
}

#[test]
fn test_compounding_waits_for_interval() {
    let h = Harness::new(ManagerConfig::default());
    let created = h
        .manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap();
    h.trade(true, 1_000_000, 0);
    h.trade(false, 1_000_000, 0);

    h.venue.advance_time(HOUR - 1).unwrap();
    h.poke(owner(), -1200, 1200).unwrap();
    let position = h.manager.position(&created.key).unwrap().unwrap();
    assert_eq!(position.accrued_fees(), AmountPair::new(3_000, 3_000));
    assert_eq!(position.liquidity, 1_000_000);
}

#[test]
fn test_cursor_visits_every_position_once_per_round() {
    let config = ManagerConfig {
        distribution_batch_cap: 2,
        ..ManagerConfig::default()
    };
    let h = Harness::new(config);
    let keys: Vec<_> = (0..5)
        .map(|n| {
            h.manager
                .create_position(Address::from_low_u64(100 + n), h.key, -1200, 1200, 1_000)
                .unwrap()
                .key
        })
        .collect();

    let accrued = |h: &Harness| -> Vec<u128> {
        keys.iter()
            .map(|k| h.manager.position(k).unwrap().unwrap().accrued_fee0)
            .collect()
    };

    // Fee 3000 per trade, 600 per position visited.
    h.trade(true, 1_000_000, 0);
    assert_eq!(accrued(&h), vec![600, 600, 0, 0, 0]);
    h.trade(true, 1_000_000, 0);
    assert_eq!(accrued(&h), vec![600, 600, 600, 600, 0]);
    h.trade(true, 1_000_000, 0);
    assert_eq!(accrued(&h), vec![600; 5]);
    assert_eq!(h.manager.venue_state(&h.key).unwrap().unwrap().totals.cursor, 0);
    h.trade(true, 1_000_000, 0);
    assert_eq!(accrued(&h), vec![1_200, 1_200, 600, 600, 600]);
}

#[test]
fn test_distribution_never_exceeds_fee() {
    let h = Harness::new(ManagerConfig::default());
    let sizes = [333_333u128, 1_000_001, 7, 250_000, 99_999];
    for (n, size) in sizes.iter().enumerate() {
        h.manager
            .create_position(Address::from_low_u64(200 + n as u64), h.key, -600, 600, *size)
            .unwrap();
    }
    // A position out of range dilutes but earns nothing.
    h.manager
        .create_position(owner(), h.key, 1200, 2400, 500_000)
        .unwrap();

    h.trade(true, 1_234_567, 0);
    let fee0 = 1_234_567u128 * 3_000 / 1_000_000;

    let positions = h.manager.positions(&h.key).unwrap();
    let credited: u128 = positions.iter().map(|p| p.accrued_fee0).sum();
    assert!(credited <= fee0);
    assert_eq!(positions.last().unwrap().accrued_fee0, 0);

    let venue = h.manager.venue_state(&h.key).unwrap().unwrap();
    assert_eq!(venue.totals.pending_fees, AmountPair::new(credited, 0));
}

#[test]
fn test_rebalance_is_idempotent_while_centered() {
    let h = Harness::new(tolerant());
    h.manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap();
    settle_at(&h, 300);

    h.poke(owner(), -1200, 1200).unwrap();
    let first = h.manager.snapshot().unwrap();
    h.poke(owner(), -1200, 1200).unwrap();
    let second = h.manager.snapshot().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.tracker().aggregate_stats().total_rebalances, 0);
}

#[test]
fn test_rebalance_moves_range_near_edge() {
    let h = Harness::new(tolerant());
    let created = h
        .manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap();
    settle_at(&h, 1140);

    h.poke(owner(), -1200, 1200).unwrap();

    let position = h.manager.position(&created.key).unwrap().unwrap();
    assert_eq!(position.key, created.key);
    assert_eq!((position.range_lower, position.range_upper), (-60, 2340));
    assert!(position.liquidity > 10_000 && position.liquidity < 1_000_000);

    assert_eq!(
        h.venue
            .liquidity_of(manager_id(), &h.key, -1200, 1200)
            .unwrap(),
        0
    );
    assert_eq!(
        h.venue
            .liquidity_of(manager_id(), &h.key, -60, 2340)
            .unwrap(),
        position.liquidity
    );
    let venue = h.manager.venue_state(&h.key).unwrap().unwrap();
    assert_eq!(venue.totals.aggregate_liquidity, position.liquidity);

    let events = h.manager.events_for(&created.key).unwrap();
    match &events.last().unwrap().data {
        EventData::Rebalanced(data) => {
            assert_eq!(data.reason, RebalanceReason::NearUpperEdge);
            assert_eq!(data.reference_tick, 1140);
            assert!(!data.used_time_weighted);
            assert_eq!(data.old_liquidity, 1_000_000);
        }
        other => panic!("unexpected event {other:?}"),
    }

    // The new range resolves to the same position and is centered now.
    let found = h
        .manager
        .find_position(owner(), &h.key, -60, 2340)
        .unwrap()
        .unwrap();
    assert_eq!(found.key, created.key);
    let before = h.manager.snapshot().unwrap();
    h.poke(owner(), -60, 2340).unwrap();
    assert_eq!(h.manager.snapshot().unwrap(), before);

    // The range it was created on no longer matches it.
    assert!(
        h.manager
            .find_position(owner(), &h.key, -1200, 1200)
            .unwrap()
            .is_none()
    );
    h.poke(owner(), -1200, 1200).unwrap();
    assert_eq!(h.manager.snapshot().unwrap(), before);
}

#[test]
fn test_slippage_breach_aborts_whole_call() {
    let h = Harness::new(ManagerConfig::default());
    let created = h
        .manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap();
    h.trade(true, 1_000_000, 0);
    h.trade(false, 1_000_000, 0);
    h.venue.advance_time(HOUR).unwrap();
    settle_at(&h, 1140);

    let before = h.manager.snapshot().unwrap();
    let err = h.poke(owner(), -1200, 1200).unwrap_err();
    let VenueError::HookRejected(hook) = err else {
        panic!("expected a hook rejection, got {err:?}");
    };
    assert!(matches!(
        hook.inner().downcast_ref::<ManagerError>(),
        Some(ManagerError::SlippageExceeded { .. })
    ));

    // The compounding that ran earlier in the same call is gone too.
    assert_eq!(h.manager.snapshot().unwrap(), before);
    let position = h.manager.position(&created.key).unwrap().unwrap();
    assert_eq!(position.accrued_fees(), AmountPair::new(3_000, 3_000));
    assert_eq!((position.range_lower, position.range_upper), (-1200, 1200));
    assert_eq!(
        h.venue
            .liquidity_of(manager_id(), &h.key, -1200, 1200)
            .unwrap(),
        1_000_000
    );
}

#[test]
fn test_venue_and_ledger_agree_after_a_rejected_poke() {
    let h = Harness::new(ManagerConfig::default());
    let wide = h
        .manager
        .create_position(owner(), h.key, -2400, 2400, 1_000_000)
        .unwrap();
    let narrow = h
        .manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap();
    h.trade(true, 1_000_000, 0);
    h.trade(false, 1_000_000, 0);
    h.venue.advance_time(HOUR).unwrap();
    settle_at(&h, 1140);

    // Hooked callers cannot batch, so one change can never be undone after
    // the manager committed for another.
    let before = h.manager.snapshot().unwrap();
    let batch = [
        LiquidityChange::poke(-2400, 2400),
        LiquidityChange::poke(-1200, 1200),
    ];
    assert!(matches!(
        h.venue.modify_liquidity(owner(), &h.key, &batch),
        Err(VenueError::HookedBatch { changes: 2 })
    ));
    assert_eq!(h.manager.snapshot().unwrap(), before);

    // The wide range compounds and holds; the narrow one breaches slippage.
    h.poke(owner(), -2400, 2400).unwrap();
    assert!(matches!(
        h.poke(owner(), -1200, 1200),
        Err(VenueError::HookRejected(_))
    ));

    let wide = h.manager.position(&wide.key).unwrap().unwrap();
    assert!(wide.liquidity > 1_000_000);
    assert_eq!(wide.accrued_fees(), AmountPair::ZERO);
    assert_eq!(
        h.venue
            .liquidity_of(manager_id(), &h.key, -2400, 2400)
            .unwrap(),
        wide.liquidity
    );

    let narrow = h.manager.position(&narrow.key).unwrap().unwrap();
    assert_eq!(narrow.liquidity, 1_000_000);
    assert!(!narrow.accrued_fees().is_zero());
    assert_eq!(
        h.venue
            .liquidity_of(manager_id(), &h.key, -1200, 1200)
            .unwrap(),
        narrow.liquidity
    );

    let venue = h.manager.venue_state(&h.key).unwrap().unwrap();
    assert_eq!(
        venue.totals.aggregate_liquidity,
        wide.liquidity + narrow.liquidity
    );
}

#[test]
fn test_fresh_price_spike_uses_time_weighted_tick() {
    let h = Harness::new(tolerant());
    let created = h
        .manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap();
    h.venue.advance_time(HOUR).unwrap();

    // Spot jumps to the edge right before the call.
    h.venue.set_tick(&h.key, 1190).unwrap();
    h.poke(owner(), -1200, 1200).unwrap();

    let position = h.manager.position(&created.key).unwrap().unwrap();
    assert_eq!((position.range_lower, position.range_upper), (-1200, 1200));
    assert_eq!(position.liquidity, 1_000_000);
}

#[test]
fn test_short_oracle_history_skips_rebalance() {
    let h = Harness::new(tolerant());
    let created = h
        .manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap();
    h.venue.set_tick(&h.key, 1190).unwrap();

    assert!(h.poke(owner(), -1200, 1200).is_ok());
    let position = h.manager.position(&created.key).unwrap().unwrap();
    assert_eq!((position.range_lower, position.range_upper), (-1200, 1200));
}

#[test]
fn test_reentrant_callback_is_rejected() {
    // The venue reports the manager's own batch back to it.
    let h = Harness::with_hook_identity(ManagerConfig::default(), Address::from_low_u64(0xBAD));

    let err = h
        .manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap_err();
    match err {
        ManagerError::Venue(VenueError::HookRejected(hook)) => assert!(matches!(
            hook.inner().downcast_ref::<ManagerError>(),
            Some(ManagerError::Reentrancy)
        )),
        other => panic!("expected reentrancy rejection, got {other:?}"),
    }
    assert!(h.manager.venue_state(&h.key).unwrap().is_none());
    assert_eq!(
        h.venue
            .liquidity_of(manager_id(), &h.key, -1200, 1200)
            .unwrap(),
        0
    );

    // The guard was released on the abort path.
    let hooks: Arc<dyn VenueHooks> = h.manager.clone();
    h.venue.set_hooks(manager_id(), Arc::downgrade(&hooks)).unwrap();
    assert!(
        h.manager
            .create_position(owner(), h.key, -1200, 1200, 1_000_000)
            .is_ok()
    );
}

#[test]
fn test_venue_failure_leaves_state_untouched() {
    let h = Harness::new(ManagerConfig::default());
    h.venue.fail_next_modify().unwrap();

    let err = h
        .manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap_err();
    assert!(matches!(err, ManagerError::Venue(VenueError::Injected)));
    assert_eq!(h.manager.snapshot().unwrap(), ManagerState::new());

    let created = h
        .manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap();
    assert!(h.manager.position(&created.key).unwrap().is_some());
}

#[test]
fn test_creation_validation() {
    let h = Harness::new(ManagerConfig::default());
    let create = |owner, lower, upper, liquidity| {
        h.manager
            .create_position(owner, h.key, lower, upper, liquidity)
    };

    assert!(matches!(
        create(Address::ZERO, -60, 60, 1),
        Err(ManagerError::InvalidOwner)
    ));
    assert!(matches!(
        create(owner(), 60, -60, 1),
        Err(ManagerError::InvalidRange { .. })
    ));
    assert!(matches!(
        create(owner(), -50, 60, 1),
        Err(ManagerError::InvalidRange { .. })
    ));
    assert!(matches!(
        create(owner(), -887_280, 60, 1),
        Err(ManagerError::InvalidRange { .. })
    ));
    assert!(matches!(
        create(owner(), -60, 60, 0),
        Err(ManagerError::ZeroLiquidity)
    ));

    let created = create(owner(), -60, 60, 1_000).unwrap();
    assert!(matches!(
        create(owner(), -60, 60, 5_000),
        Err(ManagerError::DuplicatePosition(key)) if key == created.key
    ));

    let reversed = VenueKey::new(Address::from_low_u64(2), Address::from_low_u64(1), 3000, 60);
    assert!(matches!(
        h.manager.create_position(owner(), reversed, -60, 60, 1),
        Err(ManagerError::InvalidVenue)
    ));
}

#[test]
fn test_unmanaged_modification_is_acknowledged() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap();
    let before = h.manager.snapshot().unwrap();

    let ack = h
        .manager
        .on_position_modified(
            &h.key,
            Address::from_low_u64(0xCAFE),
            &LiquidityChange::poke(-1200, 1200),
            BalanceDelta::ZERO,
            BalanceDelta::ZERO,
        )
        .unwrap();
    assert_eq!(ack, HookAck::AfterModifyLiquidity);
    assert_eq!(h.manager.snapshot().unwrap(), before);
}

#[test]
fn test_lifecycle_records_export_as_json() {
    let h = Harness::new(ManagerConfig::default());
    h.manager
        .create_position(owner(), h.key, -1200, 1200, 1_000_000)
        .unwrap();
    let json = serde_json::to_string(&h.manager.events().unwrap()).unwrap();
    assert!(json.contains("PositionCreated"));

    let stats = h.manager.aggregate_stats().unwrap();
    assert_eq!(stats.total_positions, 1);
    assert_eq!(stats.total_events, 1);
}
