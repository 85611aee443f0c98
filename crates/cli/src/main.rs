//! Command Line Interface for LP Autopilot.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use lp_autopilot_domain::math::{
    Q96, Rounding, amounts_for_liquidity, sqrt_price_at_tick, sqrt_price_to_price, tick_to_price,
};
use lp_autopilot_execution::prelude::*;
use lp_autopilot_simulation::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lp-autopilot")]
#[command(about = "Autonomous fee compounding and range rebalancing for concentrated liquidity", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the manager along a seeded random price path
    Simulate {
        /// Random seed of the price path
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Number of 15 minute steps
        #[arg(short, long, default_value_t = 500)]
        steps: usize,

        /// Number of managed positions
        #[arg(short, long, default_value_t = 6)]
        positions: usize,

        /// Annualized volatility
        #[arg(long, default_value_t = 0.8)]
        volatility: f64,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Walk one position through a trade and a compounding
    Scenario {
        /// Trade in both directions so both assets accrue
        #[arg(long)]
        two_sided: bool,

        /// Input amount of each trade
        #[arg(long, default_value_t = 100_000)]
        trade_size: u128,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show price, sqrt price and range amounts for a tick
    Tick {
        /// Tick to inspect
        #[arg(long, allow_hyphen_values = true)]
        tick: i32,

        /// Liquidity to price, on a +/-1200 range
        #[arg(long, default_value_t = 1_000_000)]
        liquidity: u128,
    },
    /// Check whether a range would be repositioned at a reference tick
    Evaluate {
        #[arg(long, allow_hyphen_values = true)]
        lower: i32,

        #[arg(long, allow_hyphen_values = true)]
        upper: i32,

        /// Reference tick
        #[arg(long, allow_hyphen_values = true)]
        tick: i32,

        #[arg(long, default_value_t = 60)]
        spacing: i32,
    },
    /// Print the manager configuration resolved from the environment
    Config,
}

fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let manager_config = ManagerConfig::from_env().context("reading manager configuration")?;
    manager_config
        .validate()
        .context("validating manager configuration")?;

    match cli.command {
        Commands::Simulate {
            seed,
            steps,
            positions,
            volatility,
            json,
        } => {
            let config = SimulationConfig {
                seed,
                steps,
                positions,
                volatility,
                manager: manager_config,
                ..SimulationConfig::default()
            };
            info!(seed, steps, positions, "Starting simulation");
            let summary = SimulationRunner::new(config)?.run()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("\n📊 Simulation Results");
            println!("════════════════════════════════════");
            println!("Steps:            {}", summary.steps);
            println!("Trades:           {}", summary.trades);
            println!("Fees charged:     {}", summary.fees_charged);
            println!("Fees pending:     {}", summary.fees_pending);
            println!("Compounds:        {}", summary.compounds);
            println!("Rebalances:       {}", summary.rebalances);
            println!("Rejected pokes:   {}", summary.rejected_pokes);
            println!("Final tick:       {}", summary.final_tick);
            println!("Total liquidity:  {}", summary.aggregate_liquidity);
            println!("════════════════════════════════════");
            println!(
                "{:<12} | {:>8} | {:>8} | {:>16} | {:>4} | {:>4}",
                "Position", "Lower", "Upper", "Liquidity", "Cmp", "Reb"
            );
            println!("{}", "-".repeat(68));
            for p in &summary.positions {
                println!(
                    "{:<12} | {:>8} | {:>8} | {:>16} | {:>4} | {:>4}",
                    p.key.short(),
                    p.range_lower,
                    p.range_upper,
                    p.liquidity,
                    p.compounds,
                    p.rebalances
                );
            }
        }
        Commands::Scenario {
            two_sided,
            trade_size,
            json,
        } => {
            let report = run_scenario(&ScenarioConfig {
                two_sided,
                trade_size,
                ..ScenarioConfig::default()
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            println!("\n🧪 Scenario");
            println!("════════════════════════════════════");
            println!("Deposited:          {}", report.deposited);
            println!("Accrued after trade:{}", report.accrued_after_trades);
            println!(
                "Liquidity:          {} -> {}",
                report.liquidity_before, report.liquidity_after
            );
            println!("Accrued afterwards: {}", report.accrued_after_compound);
            println!("Last compound time: {}", report.last_compound_time);
            println!("Events recorded:    {}", report.events.len());
            println!("════════════════════════════════════");
        }
        Commands::Tick { tick, liquidity } => {
            let sqrt_price = sqrt_price_at_tick(tick)?;
            let amounts = amounts_for_liquidity(
                sqrt_price,
                sqrt_price_at_tick(-1_200)?,
                sqrt_price_at_tick(1_200)?,
                liquidity,
                Rounding::Up,
            )?;
            println!("Tick:          {}", tick);
            println!("Price:         {:.8}", tick_to_price(tick)?);
            println!("Sqrt price Q96:{}", sqrt_price);
            println!("Price (Q96):   {:.8}", sqrt_price_to_price(sqrt_price)?);
            println!("Q96:           {}", Q96);
            println!("Amounts for L={} on [-1200, 1200]: {}", liquidity, amounts);
        }
        Commands::Evaluate {
            lower,
            upper,
            tick,
            spacing,
        } => {
            let rebalancer = Rebalancer::new(RebalanceConfig::from(&manager_config));
            match rebalancer.evaluate(lower, upper, tick, spacing)? {
                RebalanceDecision::Hold => println!("✅ Hold [{}, {}] at tick {}", lower, upper, tick),
                RebalanceDecision::Reposition {
                    reason,
                    new_lower,
                    new_upper,
                } => println!(
                    "🔁 Reposition [{}, {}] -> [{}, {}] ({:?})",
                    lower, upper, new_lower, new_upper, reason
                ),
            }
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&manager_config)?);
        }
    }

    Ok(())
}
