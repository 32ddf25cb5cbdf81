//! Threshold specification: the validated (context, required rate) pair.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{EngineError, Result};

/// Required rate used when an annotation omits the second argument.
pub const DEFAULT_REQUIRED_RATE: f64 = 1.0;

/// A single positional annotation argument, as read from the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MarkerArg {
    Text(String),
    Number(f64),
}

impl MarkerArg {
    fn type_name(&self) -> &'static str {
        match self {
            MarkerArg::Text(_) => "text",
            MarkerArg::Number(_) => "number",
        }
    }
}

impl From<&str> for MarkerArg {
    fn from(value: &str) -> Self {
        MarkerArg::Text(value.to_string())
    }
}

impl From<String> for MarkerArg {
    fn from(value: String) -> Self {
        MarkerArg::Text(value)
    }
}

impl From<f64> for MarkerArg {
    fn from(value: f64) -> Self {
        MarkerArg::Number(value)
    }
}

impl From<i64> for MarkerArg {
    fn from(value: i64) -> Self {
        MarkerArg::Number(value as f64)
    }
}

/// Validated threshold for one test case.
///
/// # Invariants
///
/// `0.0 <= required_rate <= 1.0`. Fields are private so the only way to
/// obtain a value is through [`ThresholdSpec::new`] or
/// [`ThresholdSpec::from_marker_args`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ThresholdSpec {
    context: String,
    required_rate: f64,
}

impl ThresholdSpec {
    /// Create a threshold, rejecting rates outside `[0, 1]` (and NaN).
    pub fn new(context: impl Into<String>, required_rate: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&required_rate) {
            return Err(EngineError::Configuration(format!(
                "success_rate must be between 0 and 1, got {}",
                required_rate
            )));
        }
        Ok(Self {
            context: context.into(),
            required_rate,
        })
    }

    /// Build a threshold from positional annotation arguments.
    ///
    /// Accepts `(context)` or `(context, rate)`; a missing rate defaults to
    /// [`DEFAULT_REQUIRED_RATE`].
    pub fn from_marker_args(args: &[MarkerArg]) -> Result<Self> {
        match args {
            [] => Err(EngineError::Configuration(
                "llm marker requires a prompt argument, got 0 arguments".to_string(),
            )),
            [MarkerArg::Text(context)] => Self::new(context.clone(), DEFAULT_REQUIRED_RATE),
            [MarkerArg::Text(context), MarkerArg::Number(rate)] => Self::new(context.clone(), *rate),
            [MarkerArg::Text(_), other] => Err(EngineError::Configuration(format!(
                "llm marker success_rate must be a number, got {}",
                other.type_name()
            ))),
            [first, ..] if !matches!(first, MarkerArg::Text(_)) => {
                Err(EngineError::Configuration(format!(
                    "llm marker prompt must be text, got {}",
                    first.type_name()
                )))
            }
            _ => Err(EngineError::Configuration(format!(
                "llm marker takes at most 2 arguments (prompt, success_rate), got {}",
                args.len()
            ))),
        }
    }

    /// Prompt or context string handed to the test body.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Minimum acceptable empirical success rate.
    pub fn required_rate(&self) -> f64 {
        self.required_rate
    }

    /// Stable SHA-256 digest of the threshold, used to key session records.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.context.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.required_rate.to_bits().to_be_bytes());
        hex::encode(hasher.finalize())
    }
}
