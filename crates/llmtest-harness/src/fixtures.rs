//! Per-run values injected into a test body.

use anyhow::Context;

use crate::model::Model;

/// What a test body receives on every run: the marker's prompt and a model.
pub struct Fixtures {
    prompt: Option<String>,
    model: Box<dyn Model>,
}

impl Fixtures {
    pub fn new(prompt: Option<String>, model: Box<dyn Model>) -> Self {
        Self { prompt, model }
    }

    /// Prompt from the `llm` marker, or `None` for unmarked tests.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    pub fn model(&self) -> &dyn Model {
        self.model.as_ref()
    }

    /// Complete the marker's prompt with the injected model.
    pub fn complete(&self) -> anyhow::Result<String> {
        let prompt = self
            .prompt()
            .context("test has no llm marker, so there is no prompt to complete")?;
        self.model.complete(prompt)
    }
}
