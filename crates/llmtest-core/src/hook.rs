//! Host-facing execution hook.
//!
//! The host offers every test item to its hooks before running its default
//! single-shot protocol. A hook either takes the item over completely
//! (`Handled`, reports already emitted) or declines (`Unhandled`).

use crate::config::EngineConfig;
use crate::error::Result;
use crate::executor::TestBody;
use crate::planner::RunPlanner;
use crate::report::{Location, ReportEmitter, ReportSink, SessionContext};
use crate::session::{Session, SessionSummary};
use crate::threshold::ThresholdSpec;
use crate::verdict::Verdict;

/// A collected test case as the host sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct TestItem {
    pub node_id: String,
    pub location: Option<Location>,
    /// Present only for items carrying a threshold annotation.
    pub threshold: Option<ThresholdSpec>,
}

impl TestItem {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            location: None,
            threshold: None,
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_threshold(mut self, threshold: ThresholdSpec) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// Result of offering an item to a hook.
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// The hook ran the item and emitted its reports.
    Handled(Verdict),
    /// The host must run its default protocol.
    Unhandled,
}

impl HookOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, HookOutcome::Handled(_))
    }
}

/// Interception point for the host's per-item execution protocol.
pub trait ExecutionHook {
    /// `next` is the item scheduled after this one, if any. It never changes
    /// how many runs the current item gets.
    fn run_protocol(
        &mut self,
        item: &TestItem,
        body: &mut dyn TestBody,
        next: Option<&TestItem>,
        sink: &mut dyn ReportSink,
    ) -> Result<HookOutcome>;
}

/// Hook that replaces single-shot execution with a sampled session for
/// every item carrying a [`ThresholdSpec`].
#[derive(Debug, Default)]
pub struct SamplingHook {
    planner: RunPlanner,
    config: EngineConfig,
    summaries: Vec<SessionSummary>,
}

impl SamplingHook {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            planner: RunPlanner::from_config(&config),
            config,
            summaries: Vec::new(),
        }
    }

    pub fn planner(&self) -> &RunPlanner {
        &self.planner
    }

    /// Summaries of every completed session, in execution order.
    pub fn summaries(&self) -> &[SessionSummary] {
        &self.summaries
    }

    pub fn take_summaries(&mut self) -> Vec<SessionSummary> {
        std::mem::take(&mut self.summaries)
    }
}

impl ExecutionHook for SamplingHook {
    fn run_protocol(
        &mut self,
        item: &TestItem,
        body: &mut dyn TestBody,
        next: Option<&TestItem>,
        sink: &mut dyn ReportSink,
    ) -> Result<HookOutcome> {
        let Some(threshold) = item.threshold.as_ref() else {
            return Ok(HookOutcome::Unhandled);
        };

        tracing::debug!(
            node_id = %item.node_id,
            next = next.map(|n| n.node_id.as_str()).unwrap_or("<none>"),
            "intercepting item"
        );

        let session = Session::new(
            &item.node_id,
            item.location.as_ref(),
            threshold,
            &self.planner,
            &self.config,
        );
        let record = session.run(body)?;

        ReportEmitter::emit(
            &record.verdict,
            SessionContext {
                node_id: &item.node_id,
                location: item.location.as_ref(),
                duration_ms: record.summary.duration_ms,
            },
            sink,
        );
        self.summaries.push(record.summary);

        Ok(HookOutcome::Handled(record.verdict))
    }
}
