pub mod position;
pub mod venue;

// Re-export for easier access
pub use position::{Position, PositionKey};
pub use venue::{FEE_PIPS_DENOMINATOR, VenueId, VenueKey, VenueState, VenueTotals};
