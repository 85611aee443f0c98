use lp_autopilot_domain::error::MathError;
use lp_autopilot_execution::ManagerError;
use lp_autopilot_protocols::VenueError;
use thiserror::Error;

/// Errors raised while setting up or driving a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid simulation parameter: {0}")]
    InvalidParameter(String),

    #[error("manager error: {0}")]
    Manager(#[from] ManagerError),

    #[error("venue error: {0}")]
    Venue(#[from] VenueError),

    #[error("math error: {0}")]
    Math(#[from] MathError),
}
