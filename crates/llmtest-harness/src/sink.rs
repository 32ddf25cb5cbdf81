//! Report sinks: where the host's setup/call/teardown events go.

use std::io::Write;

use llmtest_core::{Phase, ReportOutcome, ReportSink, TestReport};
use tracing::warn;

/// Keeps every report in memory, in arrival order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Vec<TestReport>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[TestReport] {
        &self.reports
    }

    /// Reports for one node id.
    pub fn for_node<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a TestReport> + 'a {
        self.reports.iter().filter(move |r| r.node_id == node_id)
    }

    pub fn into_reports(self) -> Vec<TestReport> {
        self.reports
    }
}

impl ReportSink for CollectingSink {
    fn log_report(&mut self, report: TestReport) {
        self.reports.push(report);
    }
}

/// Writes pytest-style result lines.
///
/// Passing setup and teardown reports are silent. A failed call is `FAILED`;
/// a failed setup or teardown is `ERROR`.
#[derive(Debug)]
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn label(report: &TestReport) -> Option<&'static str> {
        match (report.when, report.outcome) {
            (Phase::Call, ReportOutcome::Passed) => Some("PASSED"),
            (Phase::Call, ReportOutcome::Failed) => Some("FAILED"),
            (_, ReportOutcome::Failed) => Some("ERROR"),
            (_, ReportOutcome::Passed) => None,
        }
    }
}

impl ConsoleSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ReportSink for ConsoleSink<W> {
    fn log_report(&mut self, report: TestReport) {
        let Some(label) = Self::label(&report) else {
            return;
        };
        let mut line = format!("{} {}", report.node_id, label);
        if let Some(longrepr) = &report.longrepr {
            line.push_str(&format!("\n    {}", longrepr.replace('\n', "\n    ")));
        }
        if let Err(e) = writeln!(self.out, "{line}") {
            warn!(node_id = %report.node_id, error = %e, "failed to write report line");
        }
    }
}

/// Forwards every report to each inner sink.
#[derive(Default)]
pub struct FanoutSink<'a> {
    sinks: Vec<&'a mut dyn ReportSink>,
}

impl<'a> FanoutSink<'a> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with(mut self, sink: &'a mut dyn ReportSink) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl ReportSink for FanoutSink<'_> {
    fn log_report(&mut self, report: TestReport) {
        for sink in &mut self.sinks {
            sink.log_report(report.clone());
        }
    }
}
