//! Drives a manager through a price path on the simulated venue.
//!
//! Every step advances the venue clock, trades the price to the next tick of
//! the path and lets each owner poke their position, which is when the
//! manager compounds and rebalances.

use crate::error::SimulationError;
use crate::price_path::{GeometricBrownianMotion, PricePathGenerator};
use lp_autopilot_domain::entities::{PositionKey, VenueKey};
use lp_autopilot_domain::error::MathError;
use lp_autopilot_domain::math::{align_down, max_usable_tick, min_usable_tick};
use lp_autopilot_domain::value_objects::{Address, AmountPair};
use lp_autopilot_execution::prelude::*;
use lp_autopilot_protocols::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const SECONDS_PER_YEAR: f64 = 31_536_000.0;
const START_TIME: u64 = 1_700_000_000;
const MANAGER: u64 = 0xA11CE;
const TRADER: u64 = 0x7EAD;
const FIRST_OWNER: u64 = 1_000;

/// Parameters of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed of the price path.
    pub seed: u64,
    /// Number of steps.
    pub steps: usize,
    /// Venue time per step, in seconds.
    pub step_secs: u64,
    /// Starting tick.
    pub initial_tick: i32,
    /// Venue fee in pips.
    pub fee_pips: u32,
    /// Venue tick spacing.
    pub tick_spacing: i32,
    /// Number of managed positions.
    pub positions: usize,
    /// Liquidity of each position at creation.
    pub position_liquidity: u128,
    /// Half width of the narrowest position, in tick spacings.
    pub half_width_spacings: i32,
    /// Input amount of each trade.
    pub trade_size: u128,
    /// Annualized drift.
    pub drift: f64,
    /// Annualized volatility.
    pub volatility: f64,
    /// Manager parameters.
    pub manager: ManagerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            steps: 500,
            step_secs: 900, // 15 minutes
            initial_tick: 0,
            fee_pips: 3_000,
            tick_spacing: 60,
            positions: 6,
            position_liquidity: 1_000_000_000,
            half_width_spacings: 10,
            trade_size: 10_000_000,
            drift: 0.0,
            volatility: 0.8,
            manager: ManagerConfig {
                slippage_tolerance_bps: 9_900,
                ..ManagerConfig::default()
            },
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |msg: &str| Err(SimulationError::InvalidParameter(msg.to_string()));
        if self.steps == 0 {
            return invalid("steps must be positive");
        }
        if self.step_secs == 0 {
            return invalid("step length must be positive");
        }
        if self.positions == 0 {
            return invalid("at least one position is required");
        }
        if self.position_liquidity == 0 || self.trade_size == 0 {
            return invalid("liquidity and trade size must be positive");
        }
        if self.half_width_spacings <= 0 {
            return invalid("half width must be positive");
        }
        self.manager.validate().map_err(ManagerError::from)?;
        Ok(())
    }

    pub fn venue_key(&self) -> VenueKey {
        VenueKey::new(
            Address::from_low_u64(1),
            Address::from_low_u64(2),
            self.fee_pips,
            self.tick_spacing,
        )
    }

    /// Seeded GBM path matching the step length.
    pub fn price_path(&self) -> Result<GeometricBrownianMotion, SimulationError> {
        Ok(GeometricBrownianMotion::from_tick(
            self.initial_tick,
            self.drift,
            self.volatility,
            self.step_secs as f64 / SECONDS_PER_YEAR,
        )?
        .with_seed(self.seed))
    }
}

/// Final state of one managed position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionReport {
    pub key: PositionKey,
    pub owner: Address,
    pub range_lower: i32,
    pub range_upper: i32,
    pub liquidity: u128,
    pub accrued: AmountPair,
    pub compounds: u32,
    pub rebalances: u32,
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub steps: usize,
    pub trades: usize,
    /// Fees charged on all trades.
    pub fees_charged: AmountPair,
    /// Fees credited to positions and not yet compounded.
    pub fees_pending: AmountPair,
    pub compounds: u32,
    pub rebalances: u32,
    /// Pokes the manager refused, e.g. on slippage.
    pub rejected_pokes: usize,
    pub final_tick: i32,
    pub final_time: u64,
    pub aggregate_liquidity: u128,
    pub positions: Vec<PositionReport>,
}

/// Runs a manager against the simulated venue.
pub struct SimulationRunner {
    config: SimulationConfig,
    venue: Arc<SimulatedVenue>,
    manager: Arc<LiquidityManager<SimulatedVenue>>,
    key: VenueKey,
    owners: Vec<(Address, PositionKey)>,
}

impl SimulationRunner {
    /// Sets up the venue, the manager and the initial positions.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let key = config.venue_key();

        let venue = Arc::new(SimulatedVenue::new(START_TIME));
        venue.initialize(key, config.initial_tick)?;
        let manager = Arc::new(LiquidityManager::new(
            Address::from_low_u64(MANAGER),
            venue.clone(),
            config.manager.clone(),
        )?);
        let hooks: Arc<dyn VenueHooks> = manager.clone();
        venue.set_hooks(manager.identity(), Arc::downgrade(&hooks))?;

        let spacing = config.tick_spacing;
        let center = align_down(config.initial_tick, spacing)?;
        let (min_tick, max_tick) = (min_usable_tick(spacing)?, max_usable_tick(spacing)?);
        let mut owners = Vec::with_capacity(config.positions);
        for i in 0..config.positions {
            let owner = Address::from_low_u64(FIRST_OWNER + i as u64);
            // Widths cycle through 1x, 2x and 3x the base half width.
            let half = config.half_width_spacings * (1 + (i % 3) as i32) * spacing;
            let lower = center.saturating_sub(half).max(min_tick);
            let upper = center.saturating_add(half).min(max_tick);
            let created =
                manager.create_position(owner, key, lower, upper, config.position_liquidity)?;
            owners.push((owner, created.key));
        }

        info!(
            positions = owners.len(),
            steps = config.steps,
            initial_tick = config.initial_tick,
            "Simulation set up"
        );
        Ok(Self {
            config,
            venue,
            manager,
            key,
            owners,
        })
    }

    pub fn manager(&self) -> &Arc<LiquidityManager<SimulatedVenue>> {
        &self.manager
    }

    pub fn venue(&self) -> &Arc<SimulatedVenue> {
        &self.venue
    }

    /// Runs the configured GBM path.
    pub fn run(&mut self) -> Result<SimulationSummary, SimulationError> {
        let mut path = self.config.price_path()?;
        self.run_path(&mut path)
    }

    /// Runs an arbitrary path; its first tick is taken as the starting point.
    pub fn run_path<P: PricePathGenerator>(
        &mut self,
        path: &mut P,
    ) -> Result<SimulationSummary, SimulationError> {
        let ticks = path.generate(self.config.steps)?;
        let trader = Address::from_low_u64(TRADER);
        let mut fees_charged = AmountPair::ZERO;
        let mut trades = 0;
        let mut rejected_pokes = 0;

        for (step, target) in ticks.iter().skip(1).copied().enumerate() {
            self.venue.advance_time(self.config.step_secs)?;
            let current = self.venue.slot0(&self.key)?.tick;
            // Flat steps alternate sides so both assets earn fees.
            let zero_for_one = target < current || (target == current && step % 2 == 0);
            let params = SwapParams {
                zero_for_one,
                amount_in: self.config.trade_size,
            };
            let delta = self.venue.swap(trader, &self.key, params, target)?;
            let fees = trade_fees(&params, delta, self.config.fee_pips)?;
            fees_charged = fees_charged
                .checked_add(&fees)
                .ok_or(MathError::Overflow("fees charged"))?;
            trades += 1;

            for (owner, key) in &self.owners {
                let Some(position) = self.manager.position(key)? else {
                    continue;
                };
                let poke = LiquidityChange::poke(position.range_lower, position.range_upper);
                match self.venue.modify_liquidity(*owner, &self.key, &[poke]) {
                    Ok(_) => {}
                    Err(VenueError::HookRejected(err)) => {
                        debug!(step, position = %key, error = %err, "Poke rejected");
                        rejected_pokes += 1;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }

        let summary = self.summarize(trades, fees_charged, rejected_pokes)?;
        info!(
            trades = summary.trades,
            compounds = summary.compounds,
            rebalances = summary.rebalances,
            rejected_pokes = summary.rejected_pokes,
            final_tick = summary.final_tick,
            "Simulation finished"
        );
        Ok(summary)
    }

    fn summarize(
        &self,
        trades: usize,
        fees_charged: AmountPair,
        rejected_pokes: usize,
    ) -> Result<SimulationSummary, SimulationError> {
        let stats = self.manager.aggregate_stats()?;
        let totals = self
            .manager
            .venue_state(&self.key)?
            .map(|venue| venue.totals)
            .unwrap_or_default();

        let mut positions = Vec::with_capacity(self.owners.len());
        for (owner, key) in &self.owners {
            let Some(position) = self.manager.position(key)? else {
                continue;
            };
            let (compounds, rebalances) = self
                .manager
                .summary(key)?
                .map(|s| (s.compound_count, s.rebalance_count))
                .unwrap_or_default();
            positions.push(PositionReport {
                key: *key,
                owner: *owner,
                range_lower: position.range_lower,
                range_upper: position.range_upper,
                liquidity: position.liquidity,
                accrued: position.accrued_fees(),
                compounds,
                rebalances,
            });
        }

        Ok(SimulationSummary {
            steps: self.config.steps,
            trades,
            fees_charged,
            fees_pending: totals.pending_fees,
            compounds: stats.total_compounds,
            rebalances: stats.total_rebalances,
            rejected_pokes,
            final_tick: self.venue.slot0(&self.key)?.tick,
            final_time: self.venue.timestamp(),
            aggregate_liquidity: totals.aggregate_liquidity,
            positions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_path::DeterministicPricePath;

    fn small_config() -> SimulationConfig {
        SimulationConfig {
            steps: 24,
            positions: 3,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(SimulationConfig::default().validate().is_ok());
        let config = SimulationConfig {
            positions: 0,
            ..SimulationConfig::default()
        };
        assert!(SimulationRunner::new(config).is_err());
        let config = SimulationConfig {
            manager: ManagerConfig {
                distribution_batch_cap: 0,
                ..ManagerConfig::default()
            },
            ..SimulationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimulationError::Manager(ManagerError::Config(_)))
        ));
    }

    #[test]
    fn test_flat_path_compounds() {
        let config = SimulationConfig {
            steps: 12, // three hours at 15 minutes
            ..small_config()
        };
        let mut runner = SimulationRunner::new(config).unwrap();
        let mut path = DeterministicPricePath::new(vec![0]);
        let summary = runner.run_path(&mut path).unwrap();

        assert_eq!(summary.trades, 12);
        assert_eq!(summary.rebalances, 0);
        assert!(summary.compounds > 0);
        assert!(summary.fees_charged.amount0 > 0 && summary.fees_charged.amount1 > 0);
        assert!(
            summary
                .positions
                .iter()
                .all(|p| p.liquidity >= 1_000_000_000)
        );
    }

    #[test]
    fn test_trending_path_rebalances() {
        let config = SimulationConfig {
            steps: 40,
            ..small_config()
        };
        let mut runner = SimulationRunner::new(config).unwrap();
        // Walk to the upper edge of the narrowest range, then hold there.
        let mut ticks = DeterministicPricePath::linear(0, 580, 8).ticks;
        ticks.extend(std::iter::repeat_n(580, 32));
        let summary = runner
            .run_path(&mut DeterministicPricePath::new(ticks))
            .unwrap();

        assert!(summary.rebalances >= 1);
        let narrow = &summary.positions[0];
        assert!(narrow.range_lower < 580 && 580 < narrow.range_upper);
        assert_eq!(narrow.rebalances, 1);
    }

    #[test]
    fn test_seeded_runs_match() {
        let a = SimulationRunner::new(small_config()).unwrap().run().unwrap();
        let b = SimulationRunner::new(small_config()).unwrap().run().unwrap();
        assert_eq!(a.final_tick, b.final_tick);
        assert_eq!(a.positions, b.positions);
        assert!(a.fees_pending.amount0 <= a.fees_charged.amount0);
        assert!(a.fees_pending.amount1 <= a.fees_charged.amount1);
    }

    #[test]
    fn test_summary_serializes() {
        let config = SimulationConfig {
            steps: 2,
            ..small_config()
        };
        let summary = SimulationRunner::new(config).unwrap().run().unwrap();
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"trades\":2"));
    }
}
