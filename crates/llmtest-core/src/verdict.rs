//! Verdict synthesis: compare the empirical rate to the required rate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateResult;

/// Final outcome of a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerdictOutcome {
    Passed,
    Failed,
}

impl fmt::Display for VerdictOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictOutcome::Passed => f.write_str("passed"),
            VerdictOutcome::Failed => f.write_str("failed"),
        }
    }
}

/// The single pass/fail decision for one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub outcome: VerdictOutcome,
    pub summary: AggregateResult,
    pub required_rate: f64,
    /// Explanation; present only when the verdict failed.
    pub message: Option<String>,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.outcome == VerdictOutcome::Passed
    }
}

pub struct VerdictSynthesizer;

impl VerdictSynthesizer {
    /// Passed iff `empirical_rate >= required_rate`.
    ///
    /// A required rate of 0.0 therefore always passes, and 1.0 tolerates no
    /// failed run.
    pub fn synthesize(summary: AggregateResult, required_rate: f64) -> Verdict {
        if summary.empirical_rate >= required_rate {
            return Verdict {
                outcome: VerdictOutcome::Passed,
                summary,
                required_rate,
                message: None,
            };
        }

        let message = format!(
            "LLM test failed: {}/{} passed ({:.1}%), required {:.1}%",
            summary.passed_count,
            summary.total_count,
            summary.empirical_rate * 100.0,
            required_rate * 100.0,
        );
        Verdict {
            outcome: VerdictOutcome::Failed,
            summary,
            required_rate,
            message: Some(message),
        }
    }
}
