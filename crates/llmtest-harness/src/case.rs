//! Test case definitions handed to the harness.

use std::fmt;
use std::sync::Arc;

use llmtest_core::Location;

use crate::fixtures::Fixtures;
use crate::marker::Marker;
use crate::model::ModelFactory;

/// Test body signature. Returning `Err` or panicking fails the run.
pub type TestFn = dyn Fn(&Fixtures) -> anyhow::Result<()>;

/// A test function plus its markers and optional model override.
pub struct TestCase {
    node_id: String,
    location: Option<Location>,
    markers: Vec<Marker>,
    body: Box<TestFn>,
    model_factory: Option<Arc<dyn ModelFactory>>,
}

impl TestCase {
    pub fn new<F>(node_id: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Fixtures) -> anyhow::Result<()> + 'static,
    {
        Self {
            node_id: node_id.into(),
            location: None,
            markers: Vec::new(),
            body: Box::new(body),
            model_factory: None,
        }
    }

    /// Attach a source location; the test name is the last `::` segment of
    /// the node id.
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        let name = self
            .node_id
            .rsplit("::")
            .next()
            .unwrap_or(&self.node_id)
            .to_string();
        self.location = Some(Location {
            file: file.into(),
            line,
            name,
        });
        self
    }

    pub fn mark(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Override the harness's default model for this case only.
    pub fn with_model(mut self, factory: Arc<dyn ModelFactory>) -> Self {
        self.model_factory = Some(factory);
        self
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// First marker with the given name, in declaration order.
    pub fn closest_marker(&self, name: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.name == name)
    }

    pub(crate) fn body(&self) -> &TestFn {
        self.body.as_ref()
    }

    pub(crate) fn model_factory(&self) -> Option<&Arc<dyn ModelFactory>> {
        self.model_factory.as_ref()
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("node_id", &self.node_id)
            .field("location", &self.location)
            .field("markers", &self.markers)
            .field("model_override", &self.model_factory.is_some())
            .finish_non_exhaustive()
    }
}
