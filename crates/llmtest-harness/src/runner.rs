//! The host loop: collect, offer each item to the sampling hook, fall back
//! to single-shot execution, and tally results.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use llmtest_core::{
    BodyError, BodyResult, EngineConfig, ExecutionHook, HookOutcome, IsolatedExecutor, Phase,
    ReportSink, SamplingHook, TestBody, TestItem, TestReport, METRICS,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::case::TestCase;
use crate::collect::{collect, Collected, CollectedItem};
use crate::fixtures::Fixtures;
use crate::marker::MarkerRegistry;
use crate::model::{echo_factory, ModelFactory};
use crate::summary::{ItemResult, ItemStatus, RunReport};

/// In-process test host with the sampling hook installed.
pub struct Harness {
    registry: MarkerRegistry,
    hook: SamplingHook,
    default_model: Arc<dyn ModelFactory>,
    max_failures: usize,
}

impl Harness {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: MarkerRegistry::with_builtin(),
            hook: SamplingHook::new(config),
            default_model: echo_factory(),
            max_failures: 0,
        }
    }

    /// Model factory for cases without their own override.
    pub fn with_default_model(mut self, factory: Arc<dyn ModelFactory>) -> Self {
        self.default_model = factory;
        self
    }

    /// Stop after this many failed or errored items; 0 means no limit.
    pub fn with_max_failures(mut self, max_failures: usize) -> Self {
        self.max_failures = max_failures;
        self
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MarkerRegistry {
        &mut self.registry
    }

    pub fn hook(&self) -> &SamplingHook {
        &self.hook
    }

    /// Collect and run `cases` in order, sending reports to `sink`.
    pub fn run(&mut self, cases: Vec<TestCase>, sink: &mut dyn ReportSink) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();

        let collected = collect(&self.registry, cases);
        info!(run_id = %run_id, items = collected.len(), "starting test run");

        let mut items = Vec::with_capacity(collected.len());
        let mut not_run = Vec::new();
        let mut failures = 0usize;

        for (index, entry) in collected.iter().enumerate() {
            if self.max_failures > 0 && failures >= self.max_failures {
                not_run.push(entry.node_id().to_string());
                continue;
            }

            let next = collected[index + 1..].iter().find_map(Collected::item);
            let result = match entry {
                Collected::Ready(ready) => self.run_item(ready, next, sink),
                Collected::Rejected { case, error } => {
                    sink.log_report(TestReport::failed(
                        case.node_id(),
                        case.location(),
                        Phase::Setup,
                        error.to_string(),
                    ));
                    ItemResult::new(case.node_id(), ItemStatus::Error, false)
                        .with_message(error.to_string())
                }
            };
            if result.status != ItemStatus::Passed {
                failures += 1;
            }
            items.push(result);
        }

        if !not_run.is_empty() {
            warn!(
                limit = self.max_failures,
                skipped = not_run.len(),
                "stopping after reaching the failure limit"
            );
        }
        METRICS.flush();

        let report = RunReport {
            run_id,
            started_at,
            items,
            not_run,
            sessions: self.hook.take_summaries(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(run_id = %run_id, summary = %report.summary_line(), "test run finished");
        report
    }

    fn run_item(
        &mut self,
        ready: &CollectedItem,
        next: Option<&TestItem>,
        sink: &mut dyn ReportSink,
    ) -> ItemResult {
        let CollectedItem { item, case } = ready;
        let factory = case
            .model_factory()
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default_model));
        let prompt = item.threshold.as_ref().map(|t| t.context().to_string());
        let mut body = || -> BodyResult { invoke(case, factory.as_ref(), prompt.as_deref()) };

        let sampled = item.threshold.is_some();
        match self.hook.run_protocol(item, &mut body, next, sink) {
            Ok(HookOutcome::Handled(verdict)) => {
                let status = if verdict.passed() {
                    ItemStatus::Passed
                } else {
                    ItemStatus::Failed
                };
                let result = ItemResult::new(&item.node_id, status, sampled);
                match verdict.message {
                    Some(message) => result.with_message(message),
                    None => result,
                }
            }
            Ok(HookOutcome::Unhandled) => single_shot(item, &mut body, sink),
            Err(e) => {
                sink.log_report(TestReport::failed(
                    &item.node_id,
                    item.location.as_ref(),
                    Phase::Setup,
                    e.to_string(),
                ));
                ItemResult::new(&item.node_id, ItemStatus::Error, sampled).with_message(e.to_string())
            }
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// One run of a case body with freshly built fixtures.
fn invoke(case: &TestCase, factory: &dyn ModelFactory, prompt: Option<&str>) -> BodyResult {
    let model = factory
        .create()
        .map_err(|e| BodyError::Fault(format!("fixture 'llm' failed: {e:#}")))?;
    let fixtures = Fixtures::new(prompt.map(str::to_string), model);
    (case.body())(&fixtures).map_err(|e| BodyError::Check(format!("{e:#}")))
}

/// The host's own protocol for items the hook declined.
fn single_shot(
    item: &TestItem,
    body: &mut dyn TestBody,
    sink: &mut dyn ReportSink,
) -> ItemResult {
    let location = item.location.as_ref();
    let start = Instant::now();
    let mut executor = IsolatedExecutor::new(&item.node_id);

    let outcome = match executor.execute(body) {
        Ok(outcome) => outcome,
        Err(e) => {
            sink.log_report(TestReport::failed(
                &item.node_id,
                location,
                Phase::Setup,
                e.to_string(),
            ));
            return ItemResult::new(&item.node_id, ItemStatus::Error, false)
                .with_message(e.to_string());
        }
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    sink.log_report(TestReport::passed(&item.node_id, location, Phase::Setup));
    let result = match outcome.error {
        Some(detail) if !outcome.passed => {
            sink.log_report(
                TestReport::failed(&item.node_id, location, Phase::Call, detail.message.clone())
                    .with_duration_ms(duration_ms),
            );
            ItemResult::new(&item.node_id, ItemStatus::Failed, false).with_message(detail.message)
        }
        _ => {
            sink.log_report(
                TestReport::passed(&item.node_id, location, Phase::Call)
                    .with_duration_ms(duration_ms),
            );
            ItemResult::new(&item.node_id, ItemStatus::Passed, false)
        }
    };
    sink.log_report(TestReport::passed(&item.node_id, location, Phase::Teardown));
    result
}
