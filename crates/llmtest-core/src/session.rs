//! Session driver: plan, execute N times, aggregate, synthesize.
//!
//! Runs execute strictly one after another. A session either completes all
//! planned runs or fails with an execution fault; partial samples are never
//! turned into a verdict.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateResult, Aggregator};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::executor::{ErrorDetail, IsolatedExecutor, RunOutcome, TestBody};
use crate::metrics::METRICS;
use crate::obs;
use crate::planner::RunPlanner;
use crate::report::{Location, Phase, TestReport};
use crate::threshold::ThresholdSpec;
use crate::verdict::{Verdict, VerdictOutcome, VerdictSynthesizer};

/// Diagnostic record kept by the host after a session finishes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub node_id: String,
    pub context: String,
    pub threshold_digest: String,
    pub planned_runs: u32,
    pub required_rate: f64,
    pub outcome: VerdictOutcome,
    pub summary: AggregateResult,
    pub message: Option<String>,
    pub last_failure: Option<ErrorDetail>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ErrorDetail>,
    /// Per-run call reports, only when `retain_run_reports` is enabled.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_reports: Vec<TestReport>,
    pub duration_ms: u64,
}

/// Verdict plus the summary derived from the same sample.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub verdict: Verdict,
    pub summary: SessionSummary,
}

/// One test case's full set of repeated executions.
pub struct Session<'a> {
    node_id: &'a str,
    location: Option<&'a Location>,
    threshold: &'a ThresholdSpec,
    planned_runs: u32,
    config: &'a EngineConfig,
}

impl<'a> Session<'a> {
    pub fn new(
        node_id: &'a str,
        location: Option<&'a Location>,
        threshold: &'a ThresholdSpec,
        planner: &RunPlanner,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            node_id,
            location,
            threshold,
            planned_runs: planner.plan(threshold.required_rate()),
            config,
        }
    }

    pub fn planned_runs(&self) -> u32 {
        self.planned_runs
    }

    /// Execute every planned run and synthesize the verdict.
    pub fn run(self, body: &mut dyn TestBody) -> Result<SessionRecord> {
        let _span = obs::SessionSpan::enter(self.node_id);
        let start = Instant::now();
        let required_rate = self.threshold.required_rate();

        obs::emit_session_started(self.node_id, self.planned_runs, required_rate);
        METRICS.inc_sessions();

        let mut executor = IsolatedExecutor::new(self.node_id);
        let mut aggregator = Aggregator::with_retention(self.config.max_retained_failures);
        let mut run_reports = Vec::new();

        for run in 0..self.planned_runs {
            let run_start = Instant::now();
            let outcome = match executor.execute(body) {
                Ok(outcome) => outcome,
                Err(e) => {
                    obs::emit_session_fault(self.node_id, &e);
                    return Err(e);
                }
            };

            METRICS.record_run(outcome.passed);
            obs::emit_run_recorded(self.node_id, run, outcome.passed);
            if self.config.retain_run_reports {
                run_reports.push(
                    self.run_report(&outcome)
                        .with_duration_ms(run_start.elapsed().as_millis() as u64),
                );
            }
            aggregator.record(outcome);
        }

        let summary = aggregator.summarize();
        obs::emit_session_finished(
            self.node_id,
            summary.passed_count,
            summary.total_count,
            summary.empirical_rate,
        );

        let verdict = VerdictSynthesizer::synthesize(summary, required_rate);
        obs::emit_verdict_synthesized(self.node_id, verdict.outcome, required_rate);
        if !verdict.passed() {
            METRICS.inc_verdicts_failed();
        }

        let summary = SessionSummary {
            node_id: self.node_id.to_string(),
            context: self.threshold.context().to_string(),
            threshold_digest: self.threshold.digest(),
            planned_runs: self.planned_runs,
            required_rate,
            outcome: verdict.outcome,
            summary,
            message: verdict.message.clone(),
            last_failure: aggregator.last_failure().cloned(),
            failures: aggregator.failures(),
            run_reports,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        Ok(SessionRecord { verdict, summary })
    }

    fn run_report(&self, outcome: &RunOutcome) -> TestReport {
        match &outcome.error {
            Some(detail) if !outcome.passed => {
                TestReport::failed(self.node_id, self.location, Phase::Call, detail.message.clone())
            }
            _ => TestReport::passed(self.node_id, self.location, Phase::Call),
        }
    }
}
