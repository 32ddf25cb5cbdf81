//! Marker declarations and the registry of known marker names.

use std::collections::BTreeMap;

use llmtest_core::MarkerArg;
use serde::{Deserialize, Serialize};

/// Name of the threshold marker.
pub const LLM_MARKER: &str = "llm";

/// Help line registered for [`LLM_MARKER`].
pub const LLM_MARKER_DESCRIPTION: &str = "llm(prompt, success_rate): mark test to run multiple times with LLM, \
     requiring only a given success rate (0.0-1.0)";

/// A named annotation with positional arguments attached to a test case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Marker {
    pub name: String,
    pub args: Vec<MarkerArg>,
}

impl Marker {
    pub fn new(name: impl Into<String>, args: Vec<MarkerArg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// `llm(prompt, success_rate)`
    pub fn llm(prompt: impl Into<String>, success_rate: f64) -> Self {
        Self::new(
            LLM_MARKER,
            vec![MarkerArg::Text(prompt.into()), MarkerArg::Number(success_rate)],
        )
    }

    /// `llm(prompt)`; the success rate takes its default.
    pub fn llm_prompt(prompt: impl Into<String>) -> Self {
        Self::new(LLM_MARKER, vec![MarkerArg::Text(prompt.into())])
    }
}

/// Known marker names and their help lines.
#[derive(Debug, Clone, Default)]
pub struct MarkerRegistry {
    markers: BTreeMap<String, String>,
}

impl MarkerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `llm` marker already declared.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(LLM_MARKER, LLM_MARKER_DESCRIPTION);
        registry
    }

    /// Declare a marker. Re-registering a name replaces its description.
    pub fn register(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.markers.insert(name.into(), description.into());
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.markers.contains_key(name)
    }

    /// Help lines in name order.
    pub fn descriptions(&self) -> impl Iterator<Item = &str> {
        self.markers.values().map(String::as_str)
    }
}
