//! Reentrancy guard for the manager's entry points.

use crate::error::ManagerError;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-flight flag shared by every entry point of one manager.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

/// Proof that the guard is held. Releases it when dropped.
#[derive(Debug)]
#[must_use = "the guard is released as soon as the token is dropped"]
pub struct GuardToken<'a> {
    entered: &'a AtomicBool,
}

impl ReentrancyGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a call as in flight, or fails if one already is.
    pub fn enter(&self) -> Result<GuardToken<'_>, ManagerError> {
        self.entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ManagerError::Reentrancy)?;
        Ok(GuardToken {
            entered: &self.entered,
        })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.entered.store(false, Ordering::Release);
    }
}
