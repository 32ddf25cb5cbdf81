//! Accumulation of per-run outcomes into an empirical success rate.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::executor::{ErrorDetail, RunOutcome};

/// Counts and empirical rate derived from a session's outcomes.
///
/// # Invariants
///
/// `total_count == passed_count + failed_count`, and `empirical_rate` is
/// `passed_count / total_count` (0.0 when nothing ran).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AggregateResult {
    pub passed_count: u32,
    pub failed_count: u32,
    pub total_count: u32,
    pub empirical_rate: f64,
}

impl AggregateResult {
    pub fn from_counts(passed_count: u32, failed_count: u32) -> Self {
        let total_count = passed_count + failed_count;
        let empirical_rate = if total_count == 0 {
            0.0
        } else {
            passed_count as f64 / total_count as f64
        };
        Self {
            passed_count,
            failed_count,
            total_count,
            empirical_rate,
        }
    }
}

/// Accumulates outcomes for a single session.
///
/// Counting is commutative; only the retained failure details depend on
/// recording order.
#[derive(Debug, Default)]
pub struct Aggregator {
    passed: u32,
    failed: u32,
    last_failure: Option<ErrorDetail>,
    retained: VecDeque<ErrorDetail>,
    retain_limit: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator that also keeps the `limit` most recent failure details.
    pub fn with_retention(limit: usize) -> Self {
        Self {
            retain_limit: limit,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: RunOutcome) {
        if outcome.passed {
            self.passed += 1;
            return;
        }
        self.failed += 1;
        if let Some(detail) = outcome.error {
            if self.retain_limit > 0 {
                if self.retained.len() == self.retain_limit {
                    self.retained.pop_front();
                }
                self.retained.push_back(detail.clone());
            }
            self.last_failure = Some(detail);
        }
    }

    /// Snapshot of the counts so far. Does not consume or reset anything.
    pub fn summarize(&self) -> AggregateResult {
        AggregateResult::from_counts(self.passed, self.failed)
    }

    pub fn last_failure(&self) -> Option<&ErrorDetail> {
        self.last_failure.as_ref()
    }

    /// Retained failure details, oldest first.
    pub fn failures(&self) -> Vec<ErrorDetail> {
        self.retained.iter().cloned().collect()
    }
}
