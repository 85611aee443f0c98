//! Position lifecycle tracking.
//!
//! Append-only audit trail of what the manager did to each position:
//! - Position creation
//! - Fee compounding
//! - Range repositioning

mod events;
mod tracker;

pub use events::*;
pub use tracker::*;
