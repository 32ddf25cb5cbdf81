//! Run-count heuristic.
//!
//! `runs = max(min_runs, ceil(base_runs / max(1 - required_rate, margin_floor)))`
//!
//! Stricter thresholds get proportionally more runs. The margin floor caps
//! the run count (100 with the defaults) as `required_rate` approaches 1.0.

use crate::config::EngineConfig;

/// Floor on runs for any threshold.
pub const DEFAULT_MIN_RUNS: u32 = 10;

/// Numerator of the run-count heuristic.
pub const DEFAULT_BASE_RUNS: f64 = 10.0;

/// Lower bound on the tolerance margin.
pub const DEFAULT_MARGIN_FLOOR: f64 = 0.1;

/// Absorbs binary representation error in `1 - rate` before rounding up,
/// so that e.g. a 0.8 threshold plans 50 runs rather than 51.
const PLAN_EPSILON: f64 = 1e-9;

/// Computes how many independent executions a session needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunPlanner {
    min_runs: u32,
    base_runs: f64,
    margin_floor: f64,
}

impl Default for RunPlanner {
    fn default() -> Self {
        Self {
            min_runs: DEFAULT_MIN_RUNS,
            base_runs: DEFAULT_BASE_RUNS,
            margin_floor: DEFAULT_MARGIN_FLOOR,
        }
    }
}

impl RunPlanner {
    /// Planner using the tunables from a validated [`EngineConfig`].
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            min_runs: config.min_runs,
            base_runs: config.base_runs,
            margin_floor: config.margin_floor,
        }
    }

    /// Number of runs for `required_rate` (expected in `[0, 1]`).
    pub fn plan(&self, required_rate: f64) -> u32 {
        let margin = (1.0 - required_rate).max(self.margin_floor);
        let scaled = (self.base_runs / margin - PLAN_EPSILON).ceil();
        (scaled as u32).max(self.min_runs)
    }

    pub fn min_runs(&self) -> u32 {
        self.min_runs
    }

    /// Upper bound on [`RunPlanner::plan`] for any rate in `[0, 1]`.
    pub fn max_runs(&self) -> u32 {
        self.plan(1.0)
    }
}
