//! Model-under-test abstraction injected into test bodies.
//!
//! Real backends live outside this crate. Hosts supply a [`ModelFactory`];
//! the harness asks it for a fresh model before every run.

use std::sync::Arc;

/// A text-completion model.
pub trait Model {
    fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Default model: returns the prompt unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoModel;

impl Model for EchoModel {
    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(prompt.to_string())
    }
}

impl<F> Model for F
where
    F: Fn(&str) -> anyhow::Result<String>,
{
    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self(prompt)
    }
}

/// Produces the model handed to one run of a test body.
pub trait ModelFactory {
    fn create(&self) -> anyhow::Result<Box<dyn Model>>;
}

impl<F> ModelFactory for F
where
    F: Fn() -> anyhow::Result<Box<dyn Model>>,
{
    fn create(&self) -> anyhow::Result<Box<dyn Model>> {
        self()
    }
}

/// Factory for [`EchoModel`].
pub fn echo_factory() -> Arc<dyn ModelFactory> {
    Arc::new(|| -> anyhow::Result<Box<dyn Model>> { Ok(Box::new(EchoModel)) })
}
