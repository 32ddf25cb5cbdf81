//! Process-wide atomic counters for engine activity.
//!
//! Counters are bumped silently by the session driver. Call
//! [`Metrics::flush`] at the end of a test run to log them once.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    sessions_started: AtomicU64,
    runs_executed: AtomicU64,
    runs_failed: AtomicU64,
    verdicts_failed: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            sessions_started: AtomicU64::new(0),
            runs_executed: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
            verdicts_failed: AtomicU64::new(0),
        }
    }

    pub fn inc_sessions(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one executed run, and one failed run when `passed` is false.
    pub fn record_run(&self, passed: bool) {
        self.runs_executed.fetch_add(1, Ordering::Relaxed);
        if !passed {
            self.runs_failed.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(metric = "runs_executed", "counter incremented");
    }

    pub fn inc_verdicts_failed(&self) {
        self.verdicts_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            sessions_started = self.sessions_started(),
            runs_executed = self.runs_executed(),
            runs_failed = self.runs_failed(),
            verdicts_failed = self.verdicts_failed(),
        );
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started.load(Ordering::Relaxed)
    }

    pub fn runs_executed(&self) -> u64 {
        self.runs_executed.load(Ordering::Relaxed)
    }

    pub fn runs_failed(&self) -> u64 {
        self.runs_failed.load(Ordering::Relaxed)
    }

    pub fn verdicts_failed(&self) -> u64 {
        self.verdicts_failed.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.sessions_started.store(0, Ordering::Relaxed);
        self.runs_executed.store(0, Ordering::Relaxed);
        self.runs_failed.store(0, Ordering::Relaxed);
        self.verdicts_failed.store(0, Ordering::Relaxed);
    }
}
