//! Price path generators driving the simulated venue.

use crate::error::SimulationError;
use lp_autopilot_domain::math::{MAX_TICK, MIN_TICK, price_to_tick, tick_to_price};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Produces a sequence of venue ticks, starting point included.
pub trait PricePathGenerator {
    fn generate(&mut self, steps: usize) -> Result<Vec<i32>, SimulationError>;
}

/// Geometric Brownian motion over prices, mapped onto ticks.
#[derive(Debug, Clone)]
pub struct GeometricBrownianMotion {
    pub initial_price: Decimal,
    pub drift: f64,      // annualized drift (mu)
    pub volatility: f64, // annualized volatility (sigma)
    pub time_step: f64,  // time step in years (dt)
    rng: StdRng,
}

impl GeometricBrownianMotion {
    pub fn new(initial_price: Decimal, drift: f64, volatility: f64, time_step: f64) -> Self {
        Self {
            initial_price,
            drift,
            volatility,
            time_step,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Same path for the same seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Starts the path at the price of `tick`.
    pub fn from_tick(
        tick: i32,
        drift: f64,
        volatility: f64,
        time_step: f64,
    ) -> Result<Self, SimulationError> {
        Ok(Self::new(tick_to_price(tick)?, drift, volatility, time_step))
    }

    /// Raw price path, `steps + 1` points.
    pub fn prices(&mut self, steps: usize) -> Result<Vec<Decimal>, SimulationError> {
        if self.volatility.is_nan() || self.volatility < 0.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "volatility must be non-negative, got {}",
                self.volatility
            )));
        }
        if self.time_step.is_nan() || self.time_step <= 0.0 {
            return Err(SimulationError::InvalidParameter(format!(
                "time step must be positive, got {}",
                self.time_step
            )));
        }
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| SimulationError::InvalidParameter(e.to_string()))?;

        let dt = self.time_step;
        let drift_term = (self.drift - 0.5 * self.volatility.powi(2)) * dt;
        let vol_term = self.volatility * dt.sqrt();

        let mut current_price = self
            .initial_price
            .to_f64()
            .ok_or_else(|| SimulationError::InvalidParameter("initial price".to_string()))?;

        let mut prices = Vec::with_capacity(steps + 1);
        prices.push(self.initial_price);
        for _ in 0..steps {
            let z = normal.sample(&mut self.rng);
            current_price *= (drift_term + vol_term * z).exp();
            // f64 drifts from Decimal over long paths; fine at tick resolution.
            let price = Decimal::from_f64(current_price).unwrap_or(Decimal::ZERO);
            prices.push(price);
        }
        Ok(prices)
    }
}

impl PricePathGenerator for GeometricBrownianMotion {
    fn generate(&mut self, steps: usize) -> Result<Vec<i32>, SimulationError> {
        self.prices(steps)?
            .into_iter()
            .map(|price| {
                if price <= Decimal::ZERO {
                    return Ok(MIN_TICK);
                }
                match price_to_tick(price) {
                    Ok(tick) => Ok(tick),
                    Err(_) if price > Decimal::ONE => Ok(MAX_TICK),
                    Err(_) => Ok(MIN_TICK),
                }
            })
            .collect()
    }
}

/// Replays a fixed list of ticks.
#[derive(Debug, Clone, Default)]
pub struct DeterministicPricePath {
    pub ticks: Vec<i32>,
}

impl DeterministicPricePath {
    pub fn new(ticks: Vec<i32>) -> Self {
        Self { ticks }
    }

    /// Straight walk from `from` to `to` in `steps` equal moves.
    pub fn linear(from: i32, to: i32, steps: usize) -> Self {
        if steps == 0 {
            return Self::new(vec![from]);
        }
        let span = i64::from(to) - i64::from(from);
        let ticks = (0..=steps)
            .map(|i| {
                let offset = span * i as i64 / steps as i64;
                (i64::from(from) + offset).clamp(i64::from(MIN_TICK), i64::from(MAX_TICK)) as i32
            })
            .collect();
        Self::new(ticks)
    }
}

impl PricePathGenerator for DeterministicPricePath {
    /// Returns at most `steps + 1` ticks, holding the last one if the list is short.
    fn generate(&mut self, steps: usize) -> Result<Vec<i32>, SimulationError> {
        let Some(last) = self.ticks.last().copied() else {
            return Err(SimulationError::InvalidParameter(
                "empty tick path".to_string(),
            ));
        };
        Ok((0..=steps)
            .map(|i| self.ticks.get(i).copied().unwrap_or(last))
            .collect())
    }
}
