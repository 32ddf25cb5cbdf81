//! llmtest core - statistical execution engine for non-deterministic tests
//!
//! Replaces single-shot pass/fail with a tolerance-based verdict:
//! - `planner`: how many runs a required success rate needs
//! - `executor`: one panic-capturing invocation of the test body
//! - `aggregate`: pass/fail counts and the empirical success rate
//! - `verdict`: threshold comparison and failure explanation
//! - `report`: setup/call/teardown report events for the host
//! - `hook`: the interception point a host framework calls per item
//!
//! Control flow per item: plan, execute N times, aggregate, synthesize,
//! emit.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod executor;
pub mod hook;
pub mod metrics;
pub mod obs;
pub mod planner;
pub mod report;
pub mod session;
pub mod telemetry;
pub mod threshold;
pub mod verdict;

pub use aggregate::{AggregateResult, Aggregator};
pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, Result};
pub use executor::{
    BodyError, BodyResult, ErrorDetail, FailureKind, IsolatedExecutor, RunOutcome, TestBody,
};
pub use hook::{ExecutionHook, HookOutcome, SamplingHook, TestItem};
pub use metrics::METRICS;
pub use obs::SessionSpan;
pub use planner::RunPlanner;
pub use report::{
    Location, Phase, ReportEmitter, ReportOutcome, ReportSink, SessionContext, TestReport,
};
pub use session::{Session, SessionRecord, SessionSummary};
pub use telemetry::init_tracing;
pub use threshold::{MarkerArg, ThresholdSpec, DEFAULT_REQUIRED_RATE};
pub use verdict::{Verdict, VerdictOutcome, VerdictSynthesizer};

/// llmtest version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
