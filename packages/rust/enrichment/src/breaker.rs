//! Consecutive-failure circuit breaker for the live enrichment path.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Opens after `threshold` consecutive failures and stays open.
///
/// There is no half-open state: a breaker lives for one report run, so once
/// the backend has failed repeatedly the rest of the run goes to the fallback.
#[derive(Debug)]
pub struct CircuitBreaker {
    threshold: u32,
    consecutive_failures: AtomicU32,
    open: AtomicBool,
}

impl CircuitBreaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            consecutive_failures: AtomicU32::new(0),
            open: AtomicBool::new(false),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Reset the failure streak. Returns the streak length it ended.
    pub fn record_success(&self) -> u32 {
        self.consecutive_failures.swap(0, Ordering::AcqRel)
    }

    /// Count a failure. Returns `true` if this call tripped the breaker.
    pub fn record_failure(&self) -> bool {
        let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
        if failures >= self.threshold {
            return !self.open.swap(true, Ordering::AcqRel);
        }
        false
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Acquire)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
