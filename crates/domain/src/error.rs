//! Errors raised by the numeric layer and domain validation.

use thiserror::Error;

/// Failures of the fixed-point conversions.
///
/// Every variant aborts the enclosing call; none of them is recoverable
/// by retrying with the same inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    /// An intermediate or final value does not fit its target width.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
    /// A division whose denominator evaluated to zero.
    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),
    /// Tick outside `[MIN_TICK, MAX_TICK]`.
    #[error("tick {0} is outside the supported range")]
    TickOutOfBounds(i32),
    /// Square-root price outside `[MIN_SQRT_PRICE, MAX_SQRT_PRICE)` or zero.
    #[error("sqrt price {0} is outside the supported range")]
    SqrtPriceOutOfBounds(String),
    /// Tick spacing must be strictly positive.
    #[error("tick spacing must be positive, got {0}")]
    InvalidTickSpacing(i32),
    /// Decimal price not representable as a tick.
    #[error("invalid price: {0}")]
    InvalidPrice(&'static str),
}
