//! Structured observability hooks for the session lifecycle.
//!
//! Events are emitted at `info!` level except per-run records (`debug!`) and
//! session faults (`warn!`). Filter with `RUST_LOG`; pass `--json` to the CLI
//! for newline-delimited JSON.

use tracing::{debug, info, warn};

use crate::verdict::VerdictOutcome;

/// RAII guard that enters a session-scoped tracing span.
///
/// ```ignore
/// let _span = SessionSpan::enter("tests/jokes.rs::test_joke");
/// // every event until the guard drops carries node_id
/// ```
pub struct SessionSpan {
    _span: tracing::span::EnteredSpan,
}

impl SessionSpan {
    pub fn enter(node_id: &str) -> Self {
        let span = tracing::info_span!("llmtest.session", node_id = %node_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_session_started(node_id: &str, planned_runs: u32, required_rate: f64) {
    info!(
        event = "session.started",
        node_id = %node_id,
        planned_runs = planned_runs,
        required_rate = required_rate,
    );
}

pub fn emit_run_recorded(node_id: &str, run: u32, passed: bool) {
    debug!(event = "session.run_recorded", node_id = %node_id, run = run, passed = passed);
}

/// Emit event: all planned runs finished and were aggregated.
pub fn emit_session_finished(node_id: &str, passed: u32, total: u32, empirical_rate: f64) {
    info!(
        event = "session.finished",
        node_id = %node_id,
        passed = passed,
        total = total,
        empirical_rate = empirical_rate,
    );
}

pub fn emit_verdict_synthesized(node_id: &str, outcome: VerdictOutcome, required_rate: f64) {
    info!(
        event = "verdict.synthesized",
        node_id = %node_id,
        outcome = %outcome,
        required_rate = required_rate,
    );
}

/// Emit event: the session was aborted by an execution fault (warning level).
pub fn emit_session_fault(node_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "session.fault", node_id = %node_id, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_span_create() {
        let _span = SessionSpan::enter("t::span");
        emit_session_started("t::span", 10, 0.5);
        emit_verdict_synthesized("t::span", VerdictOutcome::Passed, 0.5);
    }
}
