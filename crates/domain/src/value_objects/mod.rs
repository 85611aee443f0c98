pub mod address;
pub mod amount;
pub mod percentage;

pub use address::Address;
pub use amount::AmountPair;
pub use percentage::BasisPoints;
