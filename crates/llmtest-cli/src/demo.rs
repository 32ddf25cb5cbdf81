//! Built-in demo suite exercised by `llmtest run`.
//!
//! Uses in-process stand-in models so the suite is deterministic. The
//! alternating case is expected to fail: it passes 13 of its 25 runs against
//! a 60% requirement.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::ensure;
use llmtest_harness::{Fixtures, Marker, Model, ModelFactory, TestCase};

const DEMO_FILE: &str = "demo/test_llm_suite.rs";

/// Cycles through canned responses; the cursor is shared by every model the
/// owning factory creates, so it advances across runs of a session.
struct ScriptedModel {
    responses: Arc<Vec<&'static str>>,
    cursor: Arc<AtomicU64>,
}

impl Model for ScriptedModel {
    fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        let n = self.cursor.fetch_add(1, Ordering::SeqCst) as usize;
        Ok(self.responses[n % self.responses.len()].to_string())
    }
}

fn scripted(responses: Vec<&'static str>) -> Arc<dyn ModelFactory> {
    let responses = Arc::new(responses);
    let cursor = Arc::new(AtomicU64::new(0));
    Arc::new(move || -> anyhow::Result<Box<dyn Model>> {
        Ok(Box::new(ScriptedModel {
            responses: Arc::clone(&responses),
            cursor: Arc::clone(&cursor),
        }))
    })
}

fn case<F>(name: &str, line: u32, body: F) -> TestCase
where
    F: Fn(&Fixtures) -> anyhow::Result<()> + 'static,
{
    TestCase::new(format!("{DEMO_FILE}::{name}"), body).at(DEMO_FILE, line)
}

pub fn suite() -> Vec<TestCase> {
    vec![
        case("test_joke_quality", 12, |fx| {
            let answer = fx.model().complete(fx.prompt().unwrap_or_default())?;
            ensure!(answer.contains('?') || answer.contains('!'), "no punchline in {answer:?}");
            Ok(())
        })
        .mark(Marker::llm("Tell me a joke about programmers.", 0.9))
        .with_model(scripted(vec![
            "Why do programmers prefer dark mode? Because light attracts bugs!",
            "A SQL query walks into a bar and asks two tables: may I join you?",
            "There are 10 kinds of people: those who read binary and those who don't!",
        ])),
        case("test_math_exact", 24, |fx| {
            let answer = fx.complete()?;
            ensure!(answer.trim() == "4", "expected 4, got {answer:?}");
            Ok(())
        })
        .mark(Marker::llm("What is 2+2? Answer with just the number.", 1.0))
        .with_model(scripted(vec!["4", " 4\n"])),
        case("test_creative_haiku", 33, |fx| {
            let answer = fx.complete()?;
            ensure!(answer.lines().count() == 3, "not a haiku: {answer:?}");
            Ok(())
        })
        .mark(Marker::llm("Write a haiku about the sea.", 0.5))
        .with_model(scripted(vec![
            "waves fold into foam\nsalt wind carries gull voices\nthe tide keeps its time",
            "The sea is large and blue.",
            "grey swell at dawn\nnets heavy with silver fish\nboats return to shore",
            "deep water hums low\nmoonlight scatters on the swell\nsand forgets our steps",
        ])),
        case("test_alternating_model", 45, |fx| {
            let answer = fx.complete()?;
            ensure!(answer == "Paris", "wrong capital: {answer:?}");
            Ok(())
        })
        .mark(Marker::llm("What is the capital of France?", 0.6))
        .with_model(scripted(vec!["Paris", "Lyon"])),
        case("test_zero_threshold", 54, |fx| {
            let answer = fx.complete()?;
            ensure!(answer == "a limerick", "model never obliges: {answer:?}");
            Ok(())
        })
        .mark(Marker::llm("Reply with a sonnet.", 0.0)),
        case("test_prompt_only_counting", 62, |fx| {
            let answer = fx.complete()?;
            let count: usize = answer.trim().parse()?;
            ensure!(count == 3, "expected 3, got {count}");
            Ok(())
        })
        .mark(Marker::llm_prompt("How many R's are in 'strawberry'?"))
        .with_model(scripted(vec!["3"])),
        case("test_regular_function", 71, |fx| {
            ensure!(fx.prompt().is_none(), "unmarked tests get no prompt");
            assert_eq!("strawberry".matches('r').count(), 3);
            Ok(())
        }),
    ]
}
