use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::ensure;
use llmtest_core::{EngineConfig, Phase, ReportOutcome};
use llmtest_harness::{
    read_results_json, write_results_json, CollectingSink, Harness, ItemStatus, Marker, Model,
    ModelFactory, ResultsArtifact, TestCase,
};

fn counter() -> Arc<AtomicU32> {
    Arc::new(AtomicU32::new(0))
}

fn counting_case(node_id: &str, calls: &Arc<AtomicU32>) -> TestCase {
    let calls = Arc::clone(calls);
    TestCase::new(node_id, move |_| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

/// Factory that fails on the `fail_on`-th model it is asked for (1-based).
fn flaky_factory(fail_on: u32) -> Arc<dyn ModelFactory> {
    let created = counter();
    Arc::new(move || -> anyhow::Result<Box<dyn Model>> {
        let n = created.fetch_add(1, Ordering::SeqCst) + 1;
        anyhow::ensure!(n != fail_on, "model backend unavailable");
        Ok(Box::new(llmtest_harness::EchoModel))
    })
}

#[test]
fn test_marked_case_reports_once_per_phase() {
    let calls = counter();
    let case = counting_case("tests/jokes.rs::test_joke", &calls)
        .at("tests/jokes.rs", 10)
        .mark(Marker::llm("Tell me a joke.", 0.9));

    let mut sink = CollectingSink::new();
    let report = Harness::default().run(vec![case], &mut sink);

    assert_eq!(calls.load(Ordering::SeqCst), 100);
    let phases: Vec<Phase> = sink.reports().iter().map(|r| r.when).collect();
    assert_eq!(phases, Phase::ALL.to_vec());
    assert!(sink.reports().iter().all(|r| r.is_passed()));
    assert_eq!(
        sink.reports()[1].location.as_ref().map(|l| l.name.as_str()),
        Some("test_joke")
    );

    assert!(report.success());
    assert_eq!(report.sessions.len(), 1);
    assert_eq!(report.sessions[0].planned_runs, 100);
    assert_eq!(report.sessions[0].context, "Tell me a joke.");
}

#[test]
fn test_unmarked_case_runs_once() {
    let calls = counter();
    let mut sink = CollectingSink::new();
    let report = Harness::default().run(vec![counting_case("t::regular", &calls)], &mut sink);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(sink.reports().len(), 3);
    let item = report.item("t::regular").expect("item");
    assert_eq!(item.status, ItemStatus::Passed);
    assert!(!item.sampled);
    assert!(report.sessions.is_empty());
}

#[test]
fn test_fixtures_inject_prompt_and_model() {
    let case = TestCase::new("t::upper", |fx| {
        let answer = fx.complete()?;
        ensure!(answer == "HOW MANY R'S?", "unexpected answer: {answer}");
        Ok(())
    })
    .mark(Marker::llm("How many R's?", 1.0))
    .with_model(Arc::new(|| -> anyhow::Result<Box<dyn Model>> {
        Ok(Box::new(|prompt: &str| -> anyhow::Result<String> {
            Ok(prompt.to_uppercase())
        }))
    }));

    let mut sink = CollectingSink::new();
    let report = Harness::default().run(vec![case], &mut sink);
    assert!(report.success(), "{:?}", report.items);
}

#[test]
fn test_failing_threshold_message_on_call_report() {
    let calls = counter();
    let seen = Arc::clone(&calls);
    let case = TestCase::new("t::alternating", move |_| {
        let n = seen.fetch_add(1, Ordering::SeqCst);
        ensure!(n % 2 == 0, "run {n} produced a bad answer");
        Ok(())
    })
    .mark(Marker::llm("prompt", 0.6));

    let mut sink = CollectingSink::new();
    let report = Harness::default().run(vec![case], &mut sink);

    assert_eq!(calls.load(Ordering::SeqCst), 25);
    let call = &sink.reports()[1];
    assert_eq!(call.outcome, ReportOutcome::Failed);
    assert_eq!(
        call.longrepr.as_deref(),
        Some("LLM test failed: 13/25 passed (52.0%), required 60.0%")
    );
    assert_eq!(report.failed_count(), 1);
    let session = &report.sessions[0];
    assert_eq!(session.last_failure.as_ref().map(|d| d.run), Some(23));
    assert!(session.last_failure.as_ref().expect("detail").message.contains("run 23"));
}

#[test]
fn test_panicking_body_counts_as_failed_run() {
    let case = TestCase::new("t::panics", |fx| {
        let answer = fx.complete()?;
        assert_eq!(answer, "never", "model said {answer}");
        Ok(())
    })
    .mark(Marker::llm("prompt", 0.0));

    let mut sink = CollectingSink::new();
    let report = Harness::default().run(vec![case], &mut sink);

    assert!(report.success());
    assert_eq!(report.sessions[0].summary.failed_count, 10);
}

#[test]
fn test_asserting_body_keeps_panic_detail_quietly() {
    let case = TestCase::new("t::asserts", |fx| {
        let answer = fx.complete()?;
        assert!(answer.is_empty(), "model answered {answer:?}");
        Ok(())
    })
    .mark(Marker::llm("prompt", 1.0));

    let mut sink = CollectingSink::new();
    let report = Harness::default().run(vec![case], &mut sink);

    assert_eq!(sink.reports().len(), 3);
    assert_eq!(report.failed_count(), 1);
    let detail = report.sessions[0].last_failure.as_ref().expect("last failure");
    assert_eq!(detail.run, 99);
    assert_eq!(detail.message, "model answered \"prompt\"");
    assert!(detail
        .location
        .as_deref()
        .is_some_and(|l| l.contains("harness_integration.rs")));
}

#[test]
fn test_model_factory_fault_is_one_error_report() {
    let after = counter();
    let faulty = counting_case("t::faulty", &counter())
        .mark(Marker::llm("prompt", 0.5))
        .with_model(flaky_factory(3));
    let cases = vec![faulty, counting_case("t::after", &after)];

    let mut sink = CollectingSink::new();
    let report = Harness::default().run(cases, &mut sink);

    let faulty_reports: Vec<_> = sink.for_node("t::faulty").collect();
    assert_eq!(faulty_reports.len(), 1);
    assert_eq!(faulty_reports[0].when, Phase::Setup);
    assert!(faulty_reports[0]
        .longrepr
        .as_deref()
        .unwrap_or_default()
        .contains("model backend unavailable"));

    assert_eq!(report.item("t::faulty").map(|i| i.status), Some(ItemStatus::Error));
    assert!(report.sessions.is_empty());
    assert_eq!(after.load(Ordering::SeqCst), 1);
    assert_eq!(report.item("t::after").map(|i| i.status), Some(ItemStatus::Passed));
}

#[test]
fn test_configuration_errors_never_execute() {
    let calls = counter();
    let cases = vec![
        counting_case("t::too_strict", &calls).mark(Marker::llm("prompt", 1.5)),
        counting_case("t::unknown", &calls).mark(Marker::new("slow", vec![])),
    ];

    let mut sink = CollectingSink::new();
    let report = Harness::default().run(cases, &mut sink);

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(report.error_count(), 2);
    assert_eq!(sink.reports().len(), 2);
    assert!(sink.reports().iter().all(|r| r.when == Phase::Setup && !r.is_passed()));
    assert!(report
        .item("t::unknown")
        .and_then(|i| i.message.as_deref())
        .unwrap_or_default()
        .contains("'slow' not found in `markers`"));
}

#[test]
fn test_prompt_only_marker_requires_every_run() {
    let calls = counter();
    let case = counting_case("t::strict", &calls).mark(Marker::llm_prompt("prompt"));

    let mut sink = CollectingSink::new();
    let report = Harness::default().run(vec![case], &mut sink);

    assert_eq!(calls.load(Ordering::SeqCst), 100);
    assert_eq!(report.sessions[0].required_rate, 1.0);
}

#[test]
fn test_custom_registered_marker_collects() {
    let calls = counter();
    let mut harness = Harness::default();
    harness.registry_mut().register("slow", "slow: takes a while");

    let mut sink = CollectingSink::new();
    let report = harness.run(
        vec![counting_case("t::slow", &calls).mark(Marker::new("slow", vec![]))],
        &mut sink,
    );
    assert!(report.success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_max_failures_stops_between_items() {
    let first = counter();
    let seen = Arc::clone(&first);
    let failing = TestCase::new("t::fails", move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("always wrong")
    })
    .mark(Marker::llm("prompt", 0.5));
    let skipped = counter();

    let mut harness = Harness::default().with_max_failures(1);
    let mut sink = CollectingSink::new();
    let report = harness.run(vec![failing, counting_case("t::skipped", &skipped)], &mut sink);

    assert_eq!(first.load(Ordering::SeqCst), 20);
    assert_eq!(skipped.load(Ordering::SeqCst), 0);
    assert_eq!(report.not_run, vec!["t::skipped".to_string()]);
    assert_eq!(report.items.len(), 1);
}

#[test]
fn test_engine_config_changes_run_count() {
    let calls = counter();
    let config = EngineConfig {
        min_runs: 3,
        margin_floor: 1.0,
        base_runs: 3.0,
        ..EngineConfig::default()
    };
    let mut sink = CollectingSink::new();
    let report = Harness::new(config).run(
        vec![counting_case("t::few", &calls).mark(Marker::llm("prompt", 0.99))],
        &mut sink,
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(report.success());
}

#[test]
fn test_results_json_written() {
    let cases = vec![
        counting_case("t::a", &counter()).mark(Marker::llm("prompt", 0.9)),
        counting_case("t::b", &counter()),
    ];
    let mut sink = CollectingSink::new();
    let report = Harness::default().run(cases, &mut sink);

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("results.json");
    write_results_json(&path, &ResultsArtifact::from_report(&report)).expect("write");

    let artifact = read_results_json(&path).expect("read");
    assert_eq!(artifact.run_id, report.run_id);
    assert_eq!(artifact.summary.passed, 2);
    assert!(artifact.summary.success);
    assert_eq!(artifact.sessions.len(), 1);
    assert_eq!(artifact.sessions[0].node_id, "t::a");
}
