//! Single isolated execution of a test body.
//!
//! A failing check, a returned error, or a panic from the body is captured
//! as a failed [`RunOutcome`]. Only [`BodyError::Fault`] (the body could not
//! be invoked) escapes, as [`EngineError::ExecutionFault`].
//!
//! # Shared state between runs
//!
//! Runs are sequential, independent invocations of the same body. The
//! executor does not reset anything between them: state captured by the body
//! (counters, caches, a stateful model client) persists from one run to the
//! next. Tests that depend on such state should receive it as an injected
//! object scoped to the session rather than through process-wide statics.
//!
//! # Panic output
//!
//! While a body runs, panics on the executing thread are recorded instead of
//! printed: the location goes into [`ErrorDetail::location`]. Panics outside
//! an execution, or on other threads, still reach the previously installed
//! hook.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};

/// Why a single run of the body did not pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum BodyError {
    /// A check inside the body did not hold.
    Check(String),
    /// The body could not be invoked at all (e.g. fixture setup failed).
    Fault(String),
}

/// Result of invoking a test body once.
pub type BodyResult = std::result::Result<(), BodyError>;

/// A unit of work the host can invoke repeatedly.
pub trait TestBody {
    fn call(&mut self) -> BodyResult;
}

impl<F> TestBody for F
where
    F: FnMut() -> BodyResult,
{
    fn call(&mut self) -> BodyResult {
        self()
    }
}

/// How a failed run signalled its failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The body returned a failed check.
    Check,
    /// The body panicked (e.g. `assert!`).
    Panic,
}

/// Human-readable description of a failed run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetail {
    /// Zero-based index of the run within its session.
    pub run: u32,
    pub kind: FailureKind,
    pub message: String,
    /// `file:line` of the panic, for [`FailureKind::Panic`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Outcome of one execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOutcome {
    pub passed: bool,
    pub error: Option<ErrorDetail>,
}

impl RunOutcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            error: None,
        }
    }

    pub fn fail(detail: ErrorDetail) -> Self {
        Self {
            passed: false,
            error: Some(detail),
        }
    }
}

/// Invokes a test body once per call, counting runs for one session.
#[derive(Debug)]
pub struct IsolatedExecutor {
    node_id: String,
    runs: u32,
}

impl IsolatedExecutor {
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            runs: 0,
        }
    }

    /// Runs executed so far.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    /// Invoke the body exactly once.
    pub fn execute(&mut self, body: &mut dyn TestBody) -> Result<RunOutcome> {
        let run = self.runs;
        self.runs += 1;

        let result = {
            let _quiet = PanicCapture::enter();
            panic::catch_unwind(AssertUnwindSafe(|| body.call()))
        };
        match result {
            Ok(Ok(())) => Ok(RunOutcome::pass()),
            Ok(Err(BodyError::Check(message))) => {
                debug!(node_id = %self.node_id, run, %message, "run failed check");
                Ok(RunOutcome::fail(ErrorDetail {
                    run,
                    kind: FailureKind::Check,
                    message,
                    location: None,
                }))
            }
            Ok(Err(BodyError::Fault(detail))) => Err(EngineError::ExecutionFault {
                node_id: self.node_id.clone(),
                run,
                detail,
            }),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                let location = PANIC_LOCATION.with(|slot| slot.borrow_mut().take());
                debug!(node_id = %self.node_id, run, %message, ?location, "run panicked");
                Ok(RunOutcome::fail(ErrorDetail {
                    run,
                    kind: FailureKind::Panic,
                    message,
                    location,
                }))
            }
        }
    }
}

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static PANIC_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// Installs, once per process, a hook that stays silent on threads inside an
/// execution and defers to the previous hook everywhere else.
fn install_panic_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) {
                let location = info
                    .location()
                    .map(|l| format!("{}:{}", l.file(), l.line()));
                PANIC_LOCATION.with(|slot| *slot.borrow_mut() = location);
            } else {
                previous(info);
            }
        }));
    });
}

/// Marks the current thread as executing a body until dropped.
struct PanicCapture {
    was_capturing: bool,
}

impl PanicCapture {
    fn enter() -> Self {
        install_panic_hook();
        PANIC_LOCATION.with(|slot| slot.borrow_mut().take());
        Self {
            was_capturing: CAPTURING.with(|c| c.replace(true)),
        }
    }
}

impl Drop for PanicCapture {
    fn drop(&mut self) {
        CAPTURING.with(|c| c.set(self.was_capturing));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "test body panicked with a non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passing_body() {
        let mut executor = IsolatedExecutor::new("t::pass");
        let mut body = || -> BodyResult { Ok(()) };
        let outcome = executor.execute(&mut body).expect("execute");
        assert!(outcome.passed);
        assert!(outcome.error.is_none());
        assert_eq!(executor.runs(), 1);
    }

    #[test]
    fn test_check_failure_is_captured() {
        let mut executor = IsolatedExecutor::new("t::check");
        let mut body = || -> BodyResult { Err(BodyError::Check("expected a joke".to_string())) };
        let outcome = executor.execute(&mut body).expect("execute");
        assert!(!outcome.passed);
        let detail = outcome.error.expect("detail");
        assert_eq!(detail.kind, FailureKind::Check);
        assert_eq!(detail.message, "expected a joke");
        assert_eq!(detail.run, 0);
    }

    #[test]
    fn test_panic_is_captured() {
        let mut executor = IsolatedExecutor::new("t::panic");
        let mut body = || -> BodyResult {
            let answer = String::from("5");
            assert_eq!(answer, "4", "arithmetic is broken");
            Ok(())
        };
        let outcome = executor.execute(&mut body).expect("execute");
        assert!(!outcome.passed);
        let detail = outcome.error.expect("detail");
        assert_eq!(detail.kind, FailureKind::Panic);
        assert!(detail.message.contains("arithmetic is broken"));
        let location = detail.location.expect("panic location");
        assert!(location.contains("executor.rs"), "{location}");
    }

    #[test]
    fn test_panic_capture_is_scoped_to_execution() {
        let mut executor = IsolatedExecutor::new("t::scoped");
        let mut body = || -> BodyResult {
            assert!(CAPTURING.with(Cell::get));
            panic!("quiet failure");
        };
        let outcome = executor.execute(&mut body).expect("execute");
        assert!(!outcome.passed);
        assert!(!CAPTURING.with(Cell::get));
        assert!(PANIC_LOCATION.with(|slot| slot.borrow().is_none()));

        // Outside an execution the previous hook still runs and nothing is recorded.
        let result = panic::catch_unwind(|| panic!("loud failure"));
        assert!(result.is_err());
        assert!(PANIC_LOCATION.with(|slot| slot.borrow().is_none()));
    }

    #[test]
    fn test_check_failure_has_no_location() {
        let mut executor = IsolatedExecutor::new("t::check_location");
        let mut body = || -> BodyResult { Err(BodyError::Check("off".to_string())) };
        let outcome = executor.execute(&mut body).expect("execute");
        assert!(outcome.error.expect("detail").location.is_none());
    }

    #[test]
    fn test_fault_propagates() {
        let mut executor = IsolatedExecutor::new("t::fault");
        let mut ok = || -> BodyResult { Ok(()) };
        executor.execute(&mut ok).expect("first run");

        let mut body = || -> BodyResult { Err(BodyError::Fault("fixture 'llm' failed".to_string())) };
        let err = executor.execute(&mut body).unwrap_err();
        match err {
            EngineError::ExecutionFault { node_id, run, detail } => {
                assert_eq!(node_id, "t::fault");
                assert_eq!(run, 1);
                assert!(detail.contains("fixture"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_state_persists_between_runs() {
        let mut executor = IsolatedExecutor::new("t::state");
        let mut calls = 0u32;
        let mut body = || -> BodyResult {
            calls += 1;
            if calls % 2 == 0 {
                Err(BodyError::Check(format!("call {calls}")))
            } else {
                Ok(())
            }
        };
        let first = executor.execute(&mut body).expect("run 0");
        let second = executor.execute(&mut body).expect("run 1");
        assert!(first.passed);
        assert!(!second.passed);
        assert_eq!(executor.runs(), 2);
    }
}
