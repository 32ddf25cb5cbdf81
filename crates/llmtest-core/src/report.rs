//! Three-phase report events for the host framework.
//!
//! Each handled session produces exactly one setup, one call and one
//! teardown report. Setup and teardown always pass; the call report carries
//! the verdict. Individual runs are never reported to the sink.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::verdict::{Verdict, VerdictOutcome};

/// Execution phase a report describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Call,
    Teardown,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Setup, Phase::Call, Phase::Teardown];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Call => "call",
            Phase::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome carried by a single report.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportOutcome {
    Passed,
    Failed,
}

impl From<VerdictOutcome> for ReportOutcome {
    fn from(outcome: VerdictOutcome) -> Self {
        match outcome {
            VerdictOutcome::Passed => ReportOutcome::Passed,
            VerdictOutcome::Failed => ReportOutcome::Failed,
        }
    }
}

/// Source location of a test case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub name: String,
}

/// One report event in the host's setup/call/teardown protocol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestReport {
    pub node_id: String,
    pub location: Option<Location>,
    pub when: Phase,
    pub outcome: ReportOutcome,
    /// Long failure representation, absent for passing reports.
    pub longrepr: Option<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl TestReport {
    pub fn passed(node_id: &str, location: Option<&Location>, when: Phase) -> Self {
        Self {
            node_id: node_id.to_string(),
            location: location.cloned(),
            when,
            outcome: ReportOutcome::Passed,
            longrepr: None,
            duration_ms: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(
        node_id: &str,
        location: Option<&Location>,
        when: Phase,
        longrepr: impl Into<String>,
    ) -> Self {
        Self {
            outcome: ReportOutcome::Failed,
            longrepr: Some(longrepr.into()),
            ..Self::passed(node_id, location, when)
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn is_passed(&self) -> bool {
        self.outcome == ReportOutcome::Passed
    }
}

/// Receiver for report events (the host's log-report hook).
pub trait ReportSink {
    fn log_report(&mut self, report: TestReport);
}

impl ReportSink for Vec<TestReport> {
    fn log_report(&mut self, report: TestReport) {
        self.push(report);
    }
}

/// Identity of the session being reported.
#[derive(Debug, Clone, Copy)]
pub struct SessionContext<'a> {
    pub node_id: &'a str,
    pub location: Option<&'a Location>,
    pub duration_ms: u64,
}

pub struct ReportEmitter;

impl ReportEmitter {
    /// Emit setup, call and teardown reports for a synthesized verdict.
    pub fn emit(verdict: &Verdict, ctx: SessionContext<'_>, sink: &mut dyn ReportSink) {
        for when in Phase::ALL {
            let report = match when {
                Phase::Call => Self::call_report(verdict, &ctx),
                Phase::Setup | Phase::Teardown => {
                    TestReport::passed(ctx.node_id, ctx.location, when)
                }
            };
            sink.log_report(report);
        }
    }

    fn call_report(verdict: &Verdict, ctx: &SessionContext<'_>) -> TestReport {
        let report = match (&verdict.message, verdict.outcome) {
            (Some(message), VerdictOutcome::Failed) => {
                TestReport::failed(ctx.node_id, ctx.location, Phase::Call, message.clone())
            }
            (_, outcome) => TestReport {
                outcome: outcome.into(),
                ..TestReport::passed(ctx.node_id, ctx.location, Phase::Call)
            },
        };
        report.with_duration_ms(ctx.duration_ms)
    }
}
