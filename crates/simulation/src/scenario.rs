//! Scripted walkthrough: one position, one trade, one compounding.

use crate::error::SimulationError;
use lp_autopilot_domain::entities::VenueKey;
use lp_autopilot_domain::value_objects::{Address, AmountPair};
use lp_autopilot_execution::prelude::*;
use lp_autopilot_protocols::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Inputs of the walkthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub range_lower: i32,
    pub range_upper: i32,
    pub liquidity: u128,
    pub trade_size: u128,
    /// Trade the other way too, so both assets accrue.
    pub two_sided: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            range_lower: -1_200,
            range_upper: 1_200,
            liquidity: 1_000_000,
            trade_size: 100_000,
            two_sided: false,
        }
    }
}

/// What the walkthrough observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub deposited: AmountPair,
    /// Fees credited to the position by the trades.
    pub accrued_after_trades: AmountPair,
    pub liquidity_before: u128,
    pub liquidity_after: u128,
    pub accrued_after_compound: AmountPair,
    pub last_compound_time: u64,
    pub events: Vec<LifecycleEvent>,
}

/// Creates a position at tick 0, trades against it, waits out the compound
/// interval and lets the owner poke it.
pub fn run_scenario(config: &ScenarioConfig) -> Result<ScenarioReport, SimulationError> {
    let key = VenueKey::new(Address::from_low_u64(1), Address::from_low_u64(2), 3_000, 60);
    let owner = Address::from_low_u64(0xB0B);
    let trader = Address::from_low_u64(0x7EAD);

    let venue = Arc::new(SimulatedVenue::new(0));
    venue.initialize(key, 0)?;
    let manager_config = ManagerConfig::default();
    let interval = manager_config.min_compound_interval_secs;
    let manager = Arc::new(LiquidityManager::new(
        Address::from_low_u64(0xA11CE),
        venue.clone(),
        manager_config,
    )?);
    let hooks: Arc<dyn VenueHooks> = manager.clone();
    venue.set_hooks(manager.identity(), Arc::downgrade(&hooks))?;

    let created = manager.create_position(
        owner,
        key,
        config.range_lower,
        config.range_upper,
        config.liquidity,
    )?;

    let mut sides = vec![true];
    if config.two_sided {
        sides.push(false);
    }
    for zero_for_one in sides {
        let params = SwapParams {
            zero_for_one,
            amount_in: config.trade_size,
        };
        venue.swap(trader, &key, params, 0)?;
    }

    let before = manager
        .position(&created.key)?
        .ok_or_else(|| SimulationError::InvalidParameter("position vanished".to_string()))?;

    venue.advance_time(interval)?;
    venue.modify_liquidity(
        owner,
        &key,
        &[LiquidityChange::poke(config.range_lower, config.range_upper)],
    )?;

    let after = manager
        .position(&created.key)?
        .ok_or_else(|| SimulationError::InvalidParameter("position vanished".to_string()))?;
    info!(
        position = %created.key,
        liquidity_before = before.liquidity,
        liquidity_after = after.liquidity,
        "Scenario finished"
    );

    Ok(ScenarioReport {
        deposited: AmountPair::new(created.amount0, created.amount1),
        accrued_after_trades: before.accrued_fees(),
        liquidity_before: before.liquidity,
        liquidity_after: after.liquidity,
        accrued_after_compound: after.accrued_fees(),
        last_compound_time: after.last_compound_time,
        events: manager.events_for(&created.key)?,
    })
}
