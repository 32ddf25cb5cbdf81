//! llmtest harness - an in-process test host for the sampling engine
//!
//! Plays the role of the host framework around `llmtest-core`:
//! - `marker`: the `llm(prompt, success_rate)` marker and the registry
//! - `case` / `collect`: test definitions and collection-time validation
//! - `fixtures` / `model`: the prompt and model injected into each run
//! - `runner`: the per-item loop with the sampling hook installed
//! - `sink`: console and in-memory report sinks
//! - `reporting`: results.json artifact

pub mod case;
pub mod collect;
pub mod error;
pub mod fixtures;
pub mod marker;
pub mod model;
pub mod reporting;
pub mod runner;
pub mod sink;
pub mod summary;

pub use case::{TestCase, TestFn};
pub use collect::{collect, Collected, CollectedItem};
pub use error::{HarnessError, Result};
pub use fixtures::Fixtures;
pub use marker::{Marker, MarkerRegistry, LLM_MARKER, LLM_MARKER_DESCRIPTION};
pub use model::{echo_factory, EchoModel, Model, ModelFactory};
pub use reporting::{
    read_results_json, write_results_json, ResultsArtifact, ResultsSummaryArtifact,
    RESULTS_SCHEMA_VERSION,
};
pub use runner::Harness;
pub use sink::{CollectingSink, ConsoleSink, FanoutSink};
pub use summary::{ItemResult, ItemStatus, RunReport};
